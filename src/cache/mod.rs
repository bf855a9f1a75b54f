//! Cache Module
//!
//! Provides the in-process query cache: fingerprinting, TTL freshness and
//! collection-level invalidation.

mod clock;
mod entry;
mod fingerprint;
mod index;
mod query_cache;
mod stats;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use fingerprint::Fingerprint;
pub use index::CollectionIndex;
pub use query_cache::QueryCache;
pub use stats::CacheStats;

// == Public Constants ==
/// Default freshness window shared by all entries
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Handle to the process-wide cache.
///
/// Build it once at startup and clone the handle into every user; two
/// independently constructed caches do not see each other's invalidations.
pub type SharedCache = Arc<RwLock<QueryCache>>;

/// Wraps a cache into a shareable handle.
pub fn shared(cache: QueryCache) -> SharedCache {
    Arc::new(RwLock::new(cache))
}
