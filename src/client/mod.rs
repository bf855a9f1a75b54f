//! Cached Client Module
//!
//! The read/write facade application code uses instead of the record store.
//! Reads go through the query cache; writes invalidate the written
//! collection before they are forwarded.

mod finance;

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{self, CacheStats, Fingerprint, QueryCache, SharedCache};
use crate::error::{ClientError, Result};
use crate::filter::Filter;
use crate::store::{Record, RecordStore, Rows, WriteOutcome};

pub use finance::{month_bounds, BUDGETS, EXPENSES};

// == Operation ==
/// Kind of write forwarded by [`CachedClient::mutate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "insert" => Ok(Operation::Insert),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            other => Err(ClientError::UnsupportedOperation(other.to_string())),
        }
    }
}

// == Client Stats ==
/// Cache statistics plus store traffic issued by the client.
#[derive(Debug, Clone, Serialize)]
pub struct ClientStats {
    #[serde(flatten)]
    pub cache: CacheStats,
    /// Reads forwarded to the store
    pub store_reads: u64,
    /// Writes forwarded to the store
    pub store_writes: u64,
}

// == Cached Client ==
/// Store-backed client with a TTL query cache in front of reads.
///
/// Clones share the same cache and store.
#[derive(Clone)]
pub struct CachedClient {
    store: Arc<dyn RecordStore>,
    cache: SharedCache,
    store_reads: Arc<AtomicU64>,
    store_writes: Arc<AtomicU64>,
}

impl fmt::Debug for CachedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedClient")
            .field("store_reads", &self.store_reads)
            .field("store_writes", &self.store_writes)
            .finish_non_exhaustive()
    }
}

impl CachedClient {
    // == Constructor ==
    /// Creates a client over `store` using an existing cache handle.
    pub fn new(store: Arc<dyn RecordStore>, cache: SharedCache) -> Self {
        Self {
            store,
            cache,
            store_reads: Arc::new(AtomicU64::new(0)),
            store_writes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates a client with a fresh cache of its own.
    pub fn with_cache(store: Arc<dyn RecordStore>, cache: QueryCache) -> Self {
        Self::new(store, cache::shared(cache))
    }

    /// Handle to the underlying cache.
    pub fn cache(&self) -> SharedCache {
        self.cache.clone()
    }

    // == Query ==
    /// Reads `collection` narrowed by `filter`, serving fresh cached rows
    /// without touching the store.
    ///
    /// A store failure is returned as-is and nothing is cached.
    pub async fn query(&self, collection: &str, filter: &Filter) -> Result<Rows> {
        let fingerprint = Fingerprint::new(collection, filter);

        if let Some(rows) = self.cache.write().await.get(&fingerprint) {
            return Ok(rows);
        }

        self.store_reads.fetch_add(1, Ordering::Relaxed);
        let rows = self
            .store
            .select(collection, &filter.clauses())
            .await
            .map_err(|err| {
                warn!(collection, error = %err, "store read failed");
                ClientError::from(err)
            })?;

        self.cache.write().await.set(fingerprint, rows.clone());
        Ok(rows)
    }

    // == Mutate ==
    /// Invalidates every cached read of `collection`, then forwards the write.
    ///
    /// The invalidation happens before the store is called and is kept even
    /// if the write fails. `update` and `delete` target the record whose id is
    /// `payload.id`.
    pub async fn mutate(
        &self,
        collection: &str,
        operation: Operation,
        payload: Record,
    ) -> Result<WriteOutcome> {
        let removed = self.cache.write().await.invalidate(collection);
        if removed > 0 {
            info!(collection, removed, %operation, "invalidated cached reads");
        }

        let result = match operation {
            Operation::Insert => {
                self.store_writes.fetch_add(1, Ordering::Relaxed);
                self.store.insert(collection, payload).await
            }
            Operation::Update => {
                let id = record_id(&payload, operation)?;
                self.store_writes.fetch_add(1, Ordering::Relaxed);
                self.store.update(collection, &id, payload).await
            }
            Operation::Delete => {
                let id = record_id(&payload, operation)?;
                self.store_writes.fetch_add(1, Ordering::Relaxed);
                self.store.delete(collection, &id).await
            }
        };

        match result {
            Ok(outcome) => {
                debug!(collection, %operation, affected = outcome.affected, "write applied");
                Ok(outcome)
            }
            Err(err) => {
                warn!(collection, %operation, error = %err, "store write failed");
                Err(err.into())
            }
        }
    }

    // == Clear ==
    /// Drops every cached read. Returns how many entries were held.
    pub async fn clear_cache(&self) -> usize {
        let mut cache = self.cache.write().await;
        let removed = cache.len();
        cache.clear();
        info!(removed, "query cache cleared");
        removed
    }

    // == Stats ==
    pub async fn stats(&self) -> ClientStats {
        ClientStats {
            cache: self.cache.read().await.stats(),
            store_reads: self.store_reads.load(Ordering::Relaxed),
            store_writes: self.store_writes.load(Ordering::Relaxed),
        }
    }
}

/// Extracts `payload.id` for writes that target one record.
fn record_id(payload: &Record, operation: Operation) -> Result<Value> {
    match payload.get("id") {
        Some(id) if !id.is_null() => Ok(id.clone()),
        _ => Err(ClientError::InvalidRequest(format!(
            "{} requires an 'id' field in the payload",
            operation
        ))),
    }
}
