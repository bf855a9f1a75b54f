//! Background Tasks Module
//!
//! # Tasks
//! - Cache sweep: drops stale query cache entries at a configured interval

mod sweep;

pub use sweep::spawn_sweep_task;
