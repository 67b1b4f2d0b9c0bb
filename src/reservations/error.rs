use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::inventory::InventoryError;
use crate::reservations::{LifecycleEvent, ReservationStatus, ResourceType};

/// Error types for reservation operations
#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("Guest suite stays require at least {minimum} nights, got {nights}")]
    InvalidStayLength { nights: i64, minimum: u32 },

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Invalid time window: {0}")]
    InvalidTimeWindow(String),

    #[error("Price exceeds the {cap} safety cap")]
    PriceOverflow { cap: Decimal },

    #[error("Reservation cannot be completed before its end date {end_date} (today is {today})")]
    NotYetEligible { end_date: NaiveDate, today: NaiveDate },

    #[error("Reservation not found: {0}")]
    NotFound(Uuid),

    #[error("At least one item must be selected for {0}")]
    EmptySelection(ResourceType),

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Item is not in service: {0}")]
    ItemOutOfService(String),

    #[error("Item {item} is a {actual} item, not {expected}")]
    ItemTypeMismatch {
        item: String,
        expected: ResourceType,
        actual: ResourceType,
    },

    #[error("Cannot {event} a reservation that is {from}")]
    InvalidTransition {
        from: ReservationStatus,
        event: LifecycleEvent,
    },

    #[error("Deleting a reservation requires explicit confirmation")]
    ConfirmationRequired,

    #[error("Items already booked for an overlapping window: {}", .0.join(", "))]
    Conflict(Vec<String>),

    #[error("Reservation {0} was changed by another request")]
    StaleReservation(Uuid),

    #[error("Validation error: {0}")]
    ValidationError(validator::ValidationErrors),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl ReservationError {
    /// Machine-readable code for the error envelope
    pub fn code(&self) -> &'static str {
        match self {
            ReservationError::InvalidStayLength { .. } => "INVALID_STAY_LENGTH",
            ReservationError::InvalidDateRange(_) => "INVALID_DATE_RANGE",
            ReservationError::InvalidTimeWindow(_) => "INVALID_TIME_WINDOW",
            ReservationError::PriceOverflow { .. } => "PRICE_OVERFLOW",
            ReservationError::NotYetEligible { .. } => "NOT_YET_ELIGIBLE",
            ReservationError::NotFound(_) => "NOT_FOUND",
            ReservationError::EmptySelection(_) => "EMPTY_SELECTION",
            ReservationError::UnknownItem(_) => "UNKNOWN_ITEM",
            ReservationError::ItemOutOfService(_) => "ITEM_OUT_OF_SERVICE",
            ReservationError::ItemTypeMismatch { .. } => "ITEM_TYPE_MISMATCH",
            ReservationError::InvalidTransition { .. } => "INVALID_TRANSITION",
            ReservationError::ConfirmationRequired => "CONFIRMATION_REQUIRED",
            ReservationError::Conflict(_) => "BOOKING_CONFLICT",
            ReservationError::StaleReservation(_) => "RESERVATION_CHANGED",
            ReservationError::ValidationError(_) => "VALIDATION_ERROR",
            ReservationError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }
}

impl From<sqlx::Error> for ReservationError {
    fn from(err: sqlx::Error) -> Self {
        ReservationError::DatabaseError(err.to_string())
    }
}

impl From<InventoryError> for ReservationError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::DatabaseError(msg) => ReservationError::DatabaseError(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ReservationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ReservationError::ValidationError(errors)
    }
}

impl From<ReservationError> for ApiError {
    fn from(err: ReservationError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match err {
            ReservationError::NotFound(id) => ApiError::NotFound {
                resource: "Reservation".to_string(),
                id: id.to_string(),
            },
            ReservationError::DatabaseError(msg) => ApiError::DatabaseError(msg),
            ReservationError::ValidationError(errors) => errors.into(),
            ReservationError::Conflict(items) => ApiError::Conflict {
                code,
                message,
                details: Some(json!({ "items": items })),
            },
            ReservationError::InvalidTransition { .. }
            | ReservationError::StaleReservation(_) => ApiError::Conflict {
                code,
                message,
                details: None,
            },
            ReservationError::NotYetEligible { end_date, today } => ApiError::Unprocessable {
                code,
                message,
                details: Some(json!({ "end_date": end_date, "today": today })),
            },
            _ => ApiError::BadRequest { code, message },
        }
    }
}

impl IntoResponse for ReservationError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
