//! Data models
//!
//! Finance records read through the cache, and the DTOs used for
//! serializing/deserializing HTTP request and response bodies.

pub mod finance;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use finance::{totals_by_category, Budget, BudgetSummary, CategoryTotals, Expense, RecordId};
pub use requests::{MutateRequest, RangeQuery};
pub use responses::{
    CategoryTotalsResponse, ClearResponse, ErrorResponse, HealthResponse, MutateResponse,
    QueryResponse, StatsResponse,
};
