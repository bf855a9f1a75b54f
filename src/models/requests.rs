//! Request DTOs for the HTTP API
//!
//! Defines the structure of incoming request bodies and query strings.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Request body for `POST /mutate/:collection`
///
/// `operation` stays a string here; it is parsed into an
/// [`Operation`](crate::client::Operation) by the handler so unknown kinds are
/// reported as unsupported rather than as a JSON error.
#[derive(Debug, Clone, Deserialize)]
pub struct MutateRequest {
    /// `insert`, `update` or `delete`
    pub operation: String,
    /// Record (or array of records for insert); must carry `id` for update/delete
    #[serde(default)]
    pub payload: Value,
}

/// Query string for date-ranged expense reads
#[derive(Debug, Clone, Deserialize)]
pub struct RangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl RangeQuery {
    /// Returns an error message if the range is inverted, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.start > self.end {
            return Some(format!(
                "start ({}) must not be after end ({})",
                self.start, self.end
            ));
        }
        None
    }
}

/// Returns an error message if `collection` cannot name a collection.
pub fn validate_collection(collection: &str) -> Option<String> {
    if collection.is_empty() {
        return Some("Collection name cannot be empty".to_string());
    }
    if !collection
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Some(format!(
            "Collection name '{}' may only contain letters, digits, '_' and '-'",
            collection
        ));
    }
    None
}
