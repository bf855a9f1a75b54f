//! Record Store Module
//!
//! The remote data store the cache sits in front of, expressed as a trait,
//! plus an in-memory implementation.

mod memory;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use crate::filter::Clause;
pub use memory::MemoryStore;

/// A single stored record: a JSON object with an `id` field.
pub type Record = Value;

/// Records returned by a read.
pub type Rows = Vec<Record>;

// == Store Error ==
/// Failure reported by the record store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The store could not be reached or failed internally
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the request as malformed
    #[error("Store rejected request: {0}")]
    Rejected(String),

    /// A uniqueness constraint was violated
    #[error("Conflict in '{collection}': {message}")]
    Conflict { collection: String, message: String },
}

/// Convenience Result type for store calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Write Outcome ==
/// What the store reports back for a successful write.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WriteOutcome {
    /// Number of records inserted, updated or deleted
    pub affected: usize,
    /// The records as they were written (or as they were before deletion)
    pub rows: Rows,
}

impl WriteOutcome {
    pub fn new(rows: Rows) -> Self {
        Self {
            affected: rows.len(),
            rows,
        }
    }
}

// == Record Store Trait ==
/// Read and write access to named collections of records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads the records of `collection` matching every clause.
    async fn select(&self, collection: &str, clauses: &[Clause]) -> StoreResult<Rows>;

    /// Inserts one record, or every record of an array payload.
    async fn insert(&self, collection: &str, payload: Record) -> StoreResult<WriteOutcome>;

    /// Merges `payload` into the record whose `id` equals `id`.
    async fn update(&self, collection: &str, id: &Value, payload: Record)
        -> StoreResult<WriteOutcome>;

    /// Removes the record whose `id` equals `id`.
    async fn delete(&self, collection: &str, id: &Value) -> StoreResult<WriteOutcome>;
}
