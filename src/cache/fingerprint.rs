//! Fingerprint Module
//!
//! Derives the cache key for a `(collection, filter)` pair.

use std::fmt;

use crate::filter::Filter;

// == Fingerprint ==
/// Deterministic identity of a collection read.
///
/// The key has the form `<collection>:<canonical filter>`. The collection is
/// also kept on its own so invalidation never has to parse the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    collection: String,
    key: String,
}

impl Fingerprint {
    /// Fingerprints a read of `collection` narrowed by `filter`.
    pub fn new(collection: &str, filter: &Filter) -> Self {
        Self::from_parts(collection, &filter.canonical())
    }

    /// Builds a fingerprint from an already canonical filter string.
    pub fn from_parts(collection: &str, canonical_filter: &str) -> Self {
        Self {
            collection: collection.to_string(),
            key: format!("{}:{}", collection, canonical_filter),
        }
    }

    /// The collection this read targets.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The full cache key.
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
