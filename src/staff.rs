// Staff attribution extractor
// Identity is handled upstream; handlers only need a display name to stamp on records

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::debug;

use crate::error::ApiError;
use crate::validation::validate_staff_name;

/// Header carrying the acting staff member's display name
pub const STAFF_HEADER: &str = "x-staff-name";

/// Name used when no staff member is identified
pub const DEFAULT_STAFF_NAME: &str = "Staff";

/// Staff member performing the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffName(pub String);

impl StaffName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for StaffName
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(STAFF_HEADER) else {
            return Ok(StaffName(DEFAULT_STAFF_NAME.to_string()));
        };

        let name = value
            .to_str()
            .map_err(|_| ApiError::BadRequest {
                code: "INVALID_STAFF_NAME",
                message: "Staff name header must be visible ASCII".to_string(),
            })?
            .trim();

        if name.is_empty() {
            return Ok(StaffName(DEFAULT_STAFF_NAME.to_string()));
        }

        validate_staff_name(name).map_err(|e| {
            debug!("Rejected staff name: {}", e);
            ApiError::BadRequest {
                code: "INVALID_STAFF_NAME",
                message: format!("Invalid staff name: {}", e.code),
            }
        })?;

        Ok(StaffName(name.to_string()))
    }
}
