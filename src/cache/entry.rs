//! Cache Entry Module
//!
//! Defines a cached query result together with the time it was stored.

use crate::store::Rows;

// == Cache Entry ==
/// Rows returned by one store read, stamped with the time they were cached.
///
/// Entries are never mutated in place; a fresh store read replaces the whole
/// entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached rows
    pub value: Rows,
    /// Storage timestamp (Unix milliseconds)
    pub stored_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stored at `now_ms`.
    pub fn new(value: Rows, now_ms: u64) -> Self {
        Self {
            value,
            stored_at: now_ms,
        }
    }

    // == Age ==
    /// Milliseconds elapsed since the entry was stored.
    ///
    /// A clock that went backwards yields an age of zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.stored_at)
    }

    // == Is Fresh ==
    /// Checks whether the entry may still be served.
    ///
    /// Boundary condition: an entry whose age equals the TTL exactly is still
    /// fresh. It turns stale only once the TTL has been exceeded.
    pub fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        self.age_ms(now_ms) <= ttl_ms
    }

    // == Time To Live ==
    /// Returns remaining freshness in milliseconds, `0` once stale.
    pub fn ttl_remaining_ms(&self, now_ms: u64, ttl_ms: u64) -> u64 {
        ttl_ms.saturating_sub(self.age_ms(now_ms))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL_MS: u64 = 300_000;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(vec![json!({"amount": 10})], 5_000);

        assert_eq!(entry.value.len(), 1);
        assert_eq!(entry.stored_at, 5_000);
        assert!(entry.is_fresh(5_000, TTL_MS));
    }

    #[test]
    fn test_entry_fresh_at_ttl_boundary() {
        let entry = CacheEntry::new(Vec::new(), 0);

        assert!(entry.is_fresh(TTL_MS, TTL_MS), "age == ttl is still fresh");
        assert!(!entry.is_fresh(TTL_MS + 1, TTL_MS));
    }

    #[test]
    fn test_entry_clock_went_backwards() {
        let entry = CacheEntry::new(Vec::new(), 10_000);

        assert_eq!(entry.age_ms(9_000), 0);
        assert!(entry.is_fresh(9_000, TTL_MS));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new(Vec::new(), 0);

        assert_eq!(entry.ttl_remaining_ms(100_000, TTL_MS), 200_000);
        assert_eq!(entry.ttl_remaining_ms(TTL_MS + 50, TTL_MS), 0);
    }
}
