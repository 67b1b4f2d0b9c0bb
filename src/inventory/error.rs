use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Error types for inventory lookups
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for InventoryError {
    fn from(err: sqlx::Error) -> Self {
        InventoryError::DatabaseError(err.to_string())
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::DatabaseError(msg) => ApiError::DatabaseError(msg),
        }
    }
}

impl IntoResponse for InventoryError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
