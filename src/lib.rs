pub mod api;
pub mod engine;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod migrator;
pub mod telemetry;

pub use redis;
pub use sea_orm;
