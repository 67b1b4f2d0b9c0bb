use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::reservations::{
    BookingConflict, BookingWindow, CancelDisposition, Eligibility, PriceQuote,
};
use crate::validation::validate_not_blank;

/// The three kinds of bookable amenity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    GuestSuite,
    SkyLounge,
    GearShed,
}

impl ResourceType {
    /// Convert resource type to its stored string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::GuestSuite => "GUEST_SUITE",
            ResourceType::SkyLounge => "SKY_LOUNGE",
            ResourceType::GearShed => "GEAR_SHED",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GUEST_SUITE" => Ok(ResourceType::GuestSuite),
            "SKY_LOUNGE" => Ok(ResourceType::SkyLounge),
            "GEAR_SHED" => Ok(ResourceType::GearShed),
            _ => Err(format!("Invalid resource type: {}", s)),
        }
    }
}

/// Reservation status representing the lifecycle of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text")]
pub enum ReservationStatus {
    Scheduled,
    Cancelled,
    Complete,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Scheduled => "Scheduled",
            ReservationStatus::Cancelled => "Cancelled",
            ReservationStatus::Complete => "Complete",
        }
    }

    /// Complete reservations accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::Complete)
    }
}

impl Default for ReservationStatus {
    fn default() -> Self {
        ReservationStatus::Scheduled
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reservation as stored by the persistence layer
///
/// `start_time`/`end_time` are property-local wall-clock values with no
/// timezone attached. Metadata stamps are UTC instants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: Uuid,
    pub rented_to: String,
    pub resource_type: ResourceType,
    /// Ordered, duplicate-free item names
    pub items: Vec<String>,
    #[schema(value_type = String, example = "2025-06-13T15:00:00")]
    pub start_time: NaiveDateTime,
    #[schema(value_type = String, example = "2025-06-15T11:00:00")]
    pub end_time: NaiveDateTime,
    pub rental_notes: String,
    pub return_notes: Option<String>,
    pub status: ReservationStatus,
    pub total_cost: Decimal,
    pub cancellation_fee: Option<Decimal>,
    pub override_lock: bool,
    pub scheduled_by: String,
    pub created_at: DateTime<Utc>,
    /// Bumped on every stored write; a write carrying an older value is rejected
    pub version: i32,
    pub edit_by: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub restored_at: Option<DateTime<Utc>>,
}

/// A validated reservation that has not yet been assigned an id
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub rented_to: String,
    pub resource_type: ResourceType,
    pub items: Vec<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub rental_notes: String,
    pub total_cost: Decimal,
    pub override_lock: bool,
    pub scheduled_by: String,
    pub created_at: DateTime<Utc>,
}

impl NewReservation {
    /// Materialise the stored record once the persistence layer has assigned an id
    pub fn into_reservation(self, id: Uuid) -> Reservation {
        Reservation {
            id,
            rented_to: self.rented_to,
            resource_type: self.resource_type,
            items: self.items,
            start_time: self.start_time,
            end_time: self.end_time,
            rental_notes: self.rental_notes,
            return_notes: None,
            status: ReservationStatus::Scheduled,
            total_cost: self.total_cost,
            cancellation_fee: None,
            override_lock: self.override_lock,
            scheduled_by: self.scheduled_by,
            created_at: self.created_at,
            version: 0,
            edit_by: None,
            last_update: None,
            completed_by: None,
            completed_at: None,
            cancelled_at: None,
            restored_at: None,
        }
    }
}

/// Request DTO for creating, updating, quoting or conflict-checking a reservation
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReservationRequest {
    #[validate(
        length(min = 1, max = 100, message = "Unit / tenant must be 1-100 characters"),
        custom = "validate_not_blank"
    )]
    pub rented_to: String,
    pub resource_type: ResourceType,
    /// Item ids or names; only consulted for resource types that require a selection
    #[serde(default)]
    #[validate(length(max = 50, message = "At most 50 items per reservation"))]
    pub items: Vec<String>,
    #[schema(value_type = String, example = "2025-06-13")]
    pub start_date: NaiveDate,
    /// Start time, only honoured for the sky lounge ("HH:MM")
    #[serde(default, with = "hhmm")]
    #[schema(value_type = Option<String>, example = "14:00")]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "2025-06-15")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(length(max = 2000, message = "Rental notes must be at most 2000 characters"))]
    pub rental_notes: String,
    /// Book even when the items are already reserved for an overlapping window
    #[serde(default)]
    pub override_lock: bool,
}

/// Request DTO for completing a reservation
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CompleteRequest {
    #[serde(default)]
    #[validate(length(max = 2000, message = "Return notes must be at most 2000 characters"))]
    pub return_notes: String,
}

/// Query parameters for listing reservations
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ReservationFilter {
    pub status: Option<ReservationStatus>,
    pub resource_type: Option<ResourceType>,
}

impl ReservationFilter {
    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.status.map_or(true, |s| reservation.status == s)
            && self
                .resource_type
                .map_or(true, |rt| reservation.resource_type == rt)
    }
}

/// Query parameters for deleting a cancelled reservation
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct DeleteQuery {
    /// Must be `true`; deletion cannot be undone
    #[serde(default)]
    pub confirm: bool,
}

/// Query parameters for the start-time menu
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct StartTimeQuery {
    pub resource_type: ResourceType,
}

/// Start times staff may pick for a resource type ("HH:MM")
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StartTimeOptions {
    pub resource_type: ResourceType,
    #[schema(example = "10:00")]
    pub default_start: String,
    /// False when the start time is fixed by policy
    pub selectable: bool,
    pub options: Vec<String>,
}

/// Query parameters for a conflict preview
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ConflictQuery {
    /// Reservation to ignore, when previewing an edit
    pub exclude: Option<Uuid>,
}

/// Normalized window, resolved items and price for a request, before saving
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookingQuote {
    pub window: BookingWindow,
    pub items: Vec<String>,
    pub price: PriceQuote,
    /// Scheduled bookings already holding some of the items
    pub conflicts: Vec<BookingConflict>,
}

/// Result of a cancel request
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CancelResponse {
    pub id: Uuid,
    pub fee: Decimal,
    pub disposition: CancelDisposition,
    /// The cancelled record, absent when it was deleted
    pub reservation: Option<Reservation>,
}

/// Lifecycle actions available for a reservation as of today
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EligibilityReport {
    pub reservation_id: Uuid,
    pub status: ReservationStatus,
    #[schema(value_type = String)]
    pub end_date: NaiveDate,
    #[schema(value_type = String)]
    pub today: NaiveDate,
    #[serde(flatten)]
    pub eligibility: Eligibility,
}

/// Serde adapter accepting "HH:MM" as well as "HH:MM:SS" for optional times
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_str(&t.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => NaiveTime::parse_from_str(s.trim(), "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M:%S"))
                .map(Some)
                .map_err(|e| serde::de::Error::custom(format!("invalid time '{}': {}", s, e))),
        }
    }
}
