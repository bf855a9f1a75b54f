//! Collection Index Module
//!
//! Secondary index from collection name to the cache keys stored under it.

use std::collections::{HashMap, HashSet};

use crate::cache::Fingerprint;

// == Collection Index ==
/// Tracks which fingerprints belong to which collection.
///
/// Invalidation drains exactly one collection's set, so a collection whose
/// name is a prefix of another (`budget` / `budgets`) never over-invalidates.
#[derive(Debug, Default)]
pub struct CollectionIndex {
    /// collection -> fingerprints currently cached for it
    keys: HashMap<String, HashSet<Fingerprint>>,
}

impl CollectionIndex {
    // == Constructor ==
    /// Creates a new empty index.
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    // == Track ==
    /// Records that `fingerprint` is cached.
    pub fn track(&mut self, fingerprint: &Fingerprint) {
        self.keys
            .entry(fingerprint.collection().to_string())
            .or_default()
            .insert(fingerprint.clone());
    }

    // == Untrack ==
    /// Forgets a single fingerprint. Empty collection sets are dropped.
    pub fn untrack(&mut self, fingerprint: &Fingerprint) {
        let collection = fingerprint.collection();
        if let Some(set) = self.keys.get_mut(collection) {
            set.remove(fingerprint);
            if set.is_empty() {
                self.keys.remove(collection);
            }
        }
    }

    // == Drain ==
    /// Removes and returns every fingerprint tracked under `collection`.
    pub fn drain(&mut self, collection: &str) -> Vec<Fingerprint> {
        self.keys
            .remove(collection)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    // == Length ==
    /// Returns the number of tracked fingerprints across all collections.
    pub fn len(&self) -> usize {
        self.keys.values().map(HashSet::len).sum()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    // == Contains ==
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.keys
            .get(fingerprint.collection())
            .is_some_and(|set| set.contains(fingerprint))
    }

    // == Collections ==
    /// Number of collections that currently have cached reads.
    pub fn collection_count(&self) -> usize {
        self.keys.len()
    }
}
