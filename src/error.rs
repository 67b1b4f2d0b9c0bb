// Error handling module for the scheduler API
// Provides the shared error envelope and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, warn};

/// Envelope error type for the API
///
/// Module errors (`ReservationError`, `InventoryError`) convert into this
/// type so every endpoint answers with the same JSON shape.
#[derive(Debug)]
pub enum ApiError {
    /// Validation errors from request validation
    /// Maps to HTTP 400 Bad Request
    ValidationError(validator::ValidationErrors),

    /// Domain rule violated by the request
    /// Maps to HTTP 400 Bad Request
    BadRequest { code: &'static str, message: String },

    /// Resource not found by ID
    /// Maps to HTTP 404 Not Found
    NotFound { resource: String, id: String },

    /// Request conflicts with the current state of a resource
    /// Maps to HTTP 409 Conflict
    Conflict {
        code: &'static str,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Well-formed request that cannot be honoured yet
    /// Maps to HTTP 422 Unprocessable Entity
    Unprocessable {
        code: &'static str,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Persistence failures
    /// Maps to HTTP 500; details stay in the logs
    DatabaseError(String),
}

/// Consistent error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR", "NOT_FOUND")
    pub error_code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details, omitted from JSON when None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// ISO 8601 timestamp of when the error occurred
    pub timestamp: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    /// Convert ApiError to HTTP status code and ErrorResponse
    ///
    /// Client errors log at debug/warn, server errors at error. Database
    /// messages are never echoed to the client.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        let (error_code, message, details) = match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);
                (
                    "VALIDATION_ERROR".to_string(),
                    "Request validation failed".to_string(),
                    Some(serde_json::to_value(errors).unwrap_or(serde_json::json!({}))),
                )
            }
            ApiError::BadRequest { code, message } => {
                debug!("Rejected request ({}): {}", code, message);
                (code.to_string(), message.clone(), None)
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                (
                    "NOT_FOUND".to_string(),
                    format!("{} with id {} not found", resource, id),
                    None,
                )
            }
            ApiError::Conflict {
                code,
                message,
                details,
            } => {
                warn!("Conflict ({}): {}", code, message);
                (code.to_string(), message.clone(), details.clone())
            }
            ApiError::Unprocessable {
                code,
                message,
                details,
            } => {
                debug!("Unprocessable ({}): {}", code, message);
                (code.to_string(), message.clone(), details.clone())
            }
            ApiError::DatabaseError(db_error) => {
                error!("Database error: {}", db_error);
                (
                    "DATABASE_ERROR".to_string(),
                    "A database error occurred".to_string(),
                    None,
                )
            }
        };

        (
            self.status_code(),
            ErrorResponse {
                error_code,
                message,
                details,
                timestamp: Utc::now().to_rfc3339(),
            },
        )
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert validator errors to ApiError
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}
