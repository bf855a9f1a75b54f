//! API Routes
//!
//! Configures the Axum router with all endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    budget_handler, budget_history_handler, budget_summary_handler, clear_handler,
    expenses_by_category_handler, expenses_handler, health_handler, mutate_handler,
    query_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /query/:collection` - Cached read, body is the filter
/// - `POST /mutate/:collection` - Write, invalidates the collection first
/// - `GET /users/:user_id/expenses` - Expenses in `?start=..&end=..`
/// - `GET /users/:user_id/expenses/by-category` - Totals per category
/// - `GET /users/:user_id/budgets` - Budget history
/// - `GET /users/:user_id/budgets/:month` - Budget for a month
/// - `GET /users/:user_id/budgets/:month/summary` - Budget use for a month
/// - `DELETE /cache` - Drop every cached read
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/query/:collection", post(query_handler))
        .route("/mutate/:collection", post(mutate_handler))
        .route("/users/:user_id/expenses", get(expenses_handler))
        .route(
            "/users/:user_id/expenses/by-category",
            get(expenses_by_category_handler),
        )
        .route("/users/:user_id/budgets", get(budget_history_handler))
        .route("/users/:user_id/budgets/:month", get(budget_handler))
        .route(
            "/users/:user_id/budgets/:month/summary",
            get(budget_summary_handler),
        )
        .route("/cache", delete(clear_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
