use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::reservations::{BookingWindow, Reservation, ReservationError, ReservationStatus};

/// An existing booking that holds some of the requested items
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookingConflict {
    pub reservation_id: Uuid,
    pub rented_to: String,
    /// Requested items this booking already holds
    pub items: Vec<String>,
    #[schema(value_type = String)]
    pub start_time: NaiveDateTime,
    #[schema(value_type = String)]
    pub end_time: NaiveDateTime,
}

/// Double-booking detection over a snapshot of reservations
pub struct ConflictDetector;

impl ConflictDetector {
    /// Find scheduled reservations sharing an item with an overlapping window
    ///
    /// # Arguments
    /// * `window` - Requested window
    /// * `items` - Requested item names
    /// * `existing` - Reservations to check against
    /// * `exclude` - Reservation being edited, ignored when present
    pub fn find(
        window: &BookingWindow,
        items: &[String],
        existing: &[Reservation],
        exclude: Option<Uuid>,
    ) -> Vec<BookingConflict> {
        existing
            .iter()
            .filter(|r| r.status == ReservationStatus::Scheduled)
            .filter(|r| Some(r.id) != exclude)
            .filter(|r| window.overlaps(&BookingWindow::new(r.start_time, r.end_time)))
            .filter_map(|r| {
                let shared: Vec<String> = r
                    .items
                    .iter()
                    .filter(|held| items.iter().any(|wanted| wanted.eq_ignore_ascii_case(held)))
                    .cloned()
                    .collect();
                if shared.is_empty() {
                    None
                } else {
                    Some(BookingConflict {
                        reservation_id: r.id,
                        rented_to: r.rented_to.clone(),
                        items: shared,
                        start_time: r.start_time,
                        end_time: r.end_time,
                    })
                }
            })
            .collect()
    }

    /// Distinct contested item names in first-seen order
    pub fn contested_items(conflicts: &[BookingConflict]) -> Vec<String> {
        let mut contested: Vec<String> = Vec::new();
        for item in conflicts.iter().flat_map(|c| c.items.iter()) {
            if !contested.contains(item) {
                contested.push(item.clone());
            }
        }
        contested
    }
}

/// Double-booking rule carried into a write so the store can apply it
/// atomically with the insert or update
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityCheck {
    pub window: BookingWindow,
    pub items: Vec<String>,
    /// Reservation being written, never counted against itself
    pub exclude: Option<Uuid>,
    pub override_lock: bool,
}

impl AvailabilityCheck {
    /// Apply the rule to the scheduled reservations the store currently holds
    ///
    /// # Returns
    /// The conflicts that were overridden (empty when none), or `Conflict`
    pub fn enforce(&self, existing: &[Reservation]) -> Result<Vec<BookingConflict>, ReservationError> {
        let conflicts = ConflictDetector::find(&self.window, &self.items, existing, self.exclude);
        if conflicts.is_empty() {
            return Ok(conflicts);
        }

        let contested = ConflictDetector::contested_items(&conflicts);
        if !self.override_lock {
            return Err(ReservationError::Conflict(contested));
        }

        tracing::warn!(
            "Booking lock overridden for {} ({} conflicting reservations)",
            contested.join(", "),
            conflicts.len()
        );
        Ok(conflicts)
    }
}
