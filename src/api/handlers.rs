//! API Handlers
//!
//! HTTP request handlers exposing the cached client.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;

use crate::cache::{self, QueryCache};
use crate::client::{CachedClient, Operation, BUDGETS};
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::filter::Filter;
use crate::models::requests::validate_collection;
use crate::models::{
    Budget, BudgetSummary, CategoryTotalsResponse, ClearResponse, Expense, HealthResponse,
    MutateRequest, MutateResponse, QueryResponse, RangeQuery, StatsResponse,
};
use crate::store::{MemoryStore, RecordStore};

/// Application state shared across all handlers.
///
/// Holds the one cached client of the process; every handler goes through
/// it, so all of them see the same cache.
#[derive(Clone)]
pub struct AppState {
    pub client: CachedClient,
}

impl AppState {
    /// Creates a new AppState around an existing client.
    pub fn new(client: CachedClient) -> Self {
        Self { client }
    }

    /// Creates a new AppState from configuration over `store`.
    pub fn from_config(config: &Config, store: Arc<dyn RecordStore>) -> Self {
        let cache = cache::shared(QueryCache::new(config.cache_ttl()));
        Self::new(CachedClient::new(store, cache))
    }

    /// Creates a new AppState over an empty in-memory store with the
    /// one-budget-per-month rule in place.
    pub fn in_memory(config: &Config) -> Self {
        let store = MemoryStore::new().with_unique(BUDGETS, &["user_id", "month"]);
        Self::from_config(config, Arc::new(store))
    }
}

/// Handler for POST /query/:collection
///
/// Reads a collection through the cache. The body is the filter.
pub async fn query_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(filter): Json<Filter>,
) -> Result<Json<QueryResponse>> {
    if let Some(error_msg) = validate_collection(&collection) {
        return Err(ClientError::InvalidRequest(error_msg));
    }

    let rows = state.client.query(&collection, &filter).await?;
    Ok(Json(QueryResponse::new(collection, rows)))
}

/// Handler for POST /mutate/:collection
///
/// Forwards a write, invalidating the collection's cached reads first.
pub async fn mutate_handler(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(req): Json<MutateRequest>,
) -> Result<Json<MutateResponse>> {
    if let Some(error_msg) = validate_collection(&collection) {
        return Err(ClientError::InvalidRequest(error_msg));
    }

    let operation: Operation = req.operation.parse()?;
    let outcome = state.client.mutate(&collection, operation, req.payload).await?;

    Ok(Json(MutateResponse::new(collection, operation.as_str(), outcome)))
}

/// Handler for GET /users/:user_id/expenses?start=..&end=..
pub async fn expenses_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<Expense>>> {
    if let Some(error_msg) = range.validate() {
        return Err(ClientError::InvalidRequest(error_msg));
    }

    let expenses = state
        .client
        .get_expenses(&user_id, range.start, range.end)
        .await?;
    Ok(Json(expenses))
}

/// Handler for GET /users/:user_id/expenses/by-category?start=..&end=..
pub async fn expenses_by_category_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<CategoryTotalsResponse>> {
    if let Some(error_msg) = range.validate() {
        return Err(ClientError::InvalidRequest(error_msg));
    }

    let totals = state
        .client
        .get_expenses_by_category(&user_id, range.start, range.end)
        .await?;
    Ok(Json(CategoryTotalsResponse::new(user_id, totals)))
}

/// Handler for GET /users/:user_id/budgets
pub async fn budget_history_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Budget>>> {
    Ok(Json(state.client.get_budget_history(&user_id).await?))
}

/// Handler for GET /users/:user_id/budgets/:month
pub async fn budget_handler(
    State(state): State<AppState>,
    Path((user_id, month)): Path<(String, NaiveDate)>,
) -> Result<Json<Budget>> {
    state
        .client
        .get_budget(&user_id, month)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ClientError::NotFound(format!("no budget for user '{}' in {}", user_id, month))
        })
}

/// Handler for GET /users/:user_id/budgets/:month/summary
pub async fn budget_summary_handler(
    State(state): State<AppState>,
    Path((user_id, month)): Path<(String, NaiveDate)>,
) -> Result<Json<BudgetSummary>> {
    Ok(Json(state.client.get_budget_summary(&user_id, month).await?))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.client.clear_cache().await;
    Json(ClearResponse::new(removed))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let ttl_secs = state.client.cache().read().await.ttl().as_secs();
    let stats = state.client.stats().await;

    Json(StatsResponse::new(stats, ttl_secs))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
