//! Response DTOs for the HTTP API
//!
//! Defines the structure of outgoing response bodies.

use serde::Serialize;

use crate::client::ClientStats;
use crate::models::CategoryTotals;
use crate::store::{Rows, WriteOutcome};

/// Response body for `POST /query/:collection`
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub collection: String,
    pub count: usize,
    pub rows: Rows,
}

impl QueryResponse {
    pub fn new(collection: impl Into<String>, rows: Rows) -> Self {
        Self {
            collection: collection.into(),
            count: rows.len(),
            rows,
        }
    }
}

/// Response body for `POST /mutate/:collection`
#[derive(Debug, Clone, Serialize)]
pub struct MutateResponse {
    pub collection: String,
    pub operation: String,
    pub affected: usize,
    pub rows: Rows,
}

impl MutateResponse {
    pub fn new(collection: impl Into<String>, operation: impl Into<String>, outcome: WriteOutcome) -> Self {
        Self {
            collection: collection.into(),
            operation: operation.into(),
            affected: outcome.affected,
            rows: outcome.rows,
        }
    }
}

/// Response body for `GET /users/:user_id/expenses/by-category`
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotalsResponse {
    pub user_id: String,
    pub total: f64,
    pub categories: CategoryTotals,
}

impl CategoryTotalsResponse {
    pub fn new(user_id: impl Into<String>, categories: CategoryTotals) -> Self {
        Self {
            user_id: user_id.into(),
            total: categories.values().sum(),
            categories,
        }
    }
}

/// Response body for `DELETE /cache`
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    /// Entries held before the clear
    pub removed: usize,
}

impl ClearResponse {
    pub fn new(removed: usize) -> Self {
        Self {
            message: format!("Cleared {} cached queries", removed),
            removed,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: ClientStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Freshness window in seconds
    pub ttl_secs: u64,
}

impl StatsResponse {
    pub fn new(stats: ClientStats, ttl_secs: u64) -> Self {
        Self {
            hit_rate: stats.cache.hit_rate(),
            stats,
            ttl_secs,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
