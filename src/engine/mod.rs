//! The alert engine: typed threshold rules, pure evaluation over metric
//! windows, the alert lifecycle state machine, snapshot archiving, and the
//! scheduler loop that drives it all.

pub mod archive;
pub mod evaluator;
pub mod lifecycle;
pub mod notify;
pub mod rules;
pub mod scheduler;
pub mod source;
pub mod store;
