//! Query Cache Module
//!
//! Fingerprint -> rows mapping with a shared TTL, lazy expiry and
//! collection-level invalidation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Clock, CollectionIndex, Fingerprint, SystemClock};
use crate::store::Rows;

// == Query Cache ==
/// In-process cache of store reads.
///
/// Entries expire individually once older than the TTL; there is no capacity
/// bound. Stale entries are dropped the next time they are looked up, or by
/// [`QueryCache::purge_expired`].
#[derive(Debug)]
pub struct QueryCache {
    /// Fingerprint -> entry
    entries: HashMap<Fingerprint, CacheEntry>,
    /// Collection -> fingerprints
    index: CollectionIndex,
    /// Behaviour counters
    stats: CacheStats,
    /// Freshness window in milliseconds
    ttl_ms: u64,
    /// Time source
    clock: Arc<dyn Clock>,
}

impl QueryCache {
    // == Constructor ==
    /// Creates an empty cache with the given TTL, using wall-clock time.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Creates an empty cache driven by `clock`.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            index: CollectionIndex::new(),
            stats: CacheStats::new(),
            ttl_ms: ttl.as_millis() as u64,
            clock,
        }
    }

    // == Get ==
    /// Returns the cached rows for `fingerprint` if present and fresh.
    ///
    /// A stale entry is removed and reported as absent.
    pub fn get(&mut self, fingerprint: &Fingerprint) -> Option<Rows> {
        let now = self.clock.now_ms();
        let key = fingerprint.as_str();

        let fresh = match self.entries.get(fingerprint) {
            Some(entry) => entry.is_fresh(now, self.ttl_ms),
            None => {
                self.stats.record_miss();
                debug!(key, "query cache miss");
                return None;
            }
        };

        if !fresh {
            self.remove(fingerprint);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            debug!(key, "query cache entry expired");
            return None;
        }

        self.stats.record_hit();
        debug!(key, "query cache hit");
        self.entries.get(fingerprint).map(|entry| entry.value.clone())
    }

    // == Set ==
    /// Stores `value` under `fingerprint`, replacing any existing entry and
    /// restarting its TTL.
    pub fn set(&mut self, fingerprint: Fingerprint, value: Rows) {
        let entry = CacheEntry::new(value, self.clock.now_ms());
        self.index.track(&fingerprint);
        debug!(key = fingerprint.as_str(), rows = entry.value.len(), "query cache set");
        self.entries.insert(fingerprint, entry);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Invalidate ==
    /// Removes every entry cached for `collection`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&mut self, collection: &str) -> usize {
        let count = self
            .index
            .drain(collection)
            .iter()
            .filter(|fingerprint| self.entries.remove(*fingerprint).is_some())
            .count();

        self.stats.record_invalidations(count);
        self.stats.set_total_entries(self.entries.len());
        debug!(collection, removed = count, "query cache invalidated");
        count
    }

    // == Clear ==
    /// Removes all entries unconditionally.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.stats.set_total_entries(0);
    }

    // == Purge Expired ==
    /// Removes all stale entries.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let ttl_ms = self.ttl_ms;
        let stale: Vec<Fingerprint> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_fresh(now, ttl_ms))
            .map(|(fingerprint, _)| fingerprint.clone())
            .collect();

        for fingerprint in &stale {
            self.remove(fingerprint);
        }

        self.stats.record_expirations(stale.len());
        stale.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == TTL ==
    /// The shared freshness window.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    // == Contains ==
    /// Checks for an entry without touching statistics or freshness.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    // == Length ==
    /// Returns the current number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove(&mut self, fingerprint: &Fingerprint) {
        self.entries.remove(fingerprint);
        self.index.untrack(fingerprint);
        self.stats.set_total_entries(self.entries.len());
    }
}
