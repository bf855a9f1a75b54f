//! Error types for the cached client
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::store::StoreError;

// == Client Error Enum ==
/// Unified error type for cached reads and writes.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The record store failed; passed through untouched
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Mutation kind the client does not know how to dispatch
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Stored rows did not have the expected shape
    #[error("Malformed record: {0}")]
    Decode(#[from] serde_json::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        let status = match &self {
            ClientError::Store(StoreError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            ClientError::Store(StoreError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ClientError::Store(StoreError::Conflict { .. }) => StatusCode::CONFLICT,
            ClientError::UnsupportedOperation(_) => StatusCode::BAD_REQUEST,
            ClientError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ClientError::NotFound(_) => StatusCode::NOT_FOUND,
            ClientError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cached client.
pub type Result<T> = std::result::Result<T, ClientError>;
