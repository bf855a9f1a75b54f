//! spend_cache - query cache for a personal finance record store
//!
//! Serves repeated reads of expenses and budgets from an in-process TTL
//! cache and drops a collection's cached reads whenever it is written.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{QueryCache, SharedCache};
pub use client::{CachedClient, Operation};
pub use config::Config;
pub use error::{ClientError, Result};
pub use filter::Filter;
pub use store::{MemoryStore, RecordStore, StoreError};
pub use tasks::spawn_sweep_task;
