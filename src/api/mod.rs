//! API Module
//!
//! HTTP handlers and routing exposing the cached client.
//!
//! # Endpoints
//! - `POST /query/:collection` - Cached read
//! - `POST /mutate/:collection` - Write with invalidation
//! - `GET /users/:user_id/...` - Expense and budget views
//! - `DELETE /cache` - Clear the cache
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
