pub mod alerts;
pub mod configurations;
