use serde::Serialize;
use utoipa::ToSchema;

use crate::reservations::{ReservationError, ReservationStatus};

/// Events that drive a reservation through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEvent {
    Create,
    Update,
    Cancel,
    Restore,
    Complete,
    Delete,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Create => "create",
            LifecycleEvent::Update => "update",
            LifecycleEvent::Cancel => "cancel",
            LifecycleEvent::Restore => "restore",
            LifecycleEvent::Complete => "complete",
            LifecycleEvent::Delete => "delete",
        }
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of applying an event to an existing reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Reservation continues to exist in the given status
    To(ReservationStatus),
    /// Reservation ceases to exist
    Remove,
}

/// Service for managing reservation status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Resolve the transition an event causes, if any
    ///
    /// # Valid Transitions
    /// - Scheduled + Update → Scheduled
    /// - Scheduled + Cancel → Cancelled
    /// - Scheduled + Complete → Complete
    /// - Cancelled + Restore → Scheduled
    /// - Cancelled + Delete → removed
    /// - Complete → (nothing, terminal)
    ///
    /// `Create` never applies to an existing reservation. A zero-fee cancel
    /// is routed to deletion by the lifecycle, not here.
    pub fn next(from: ReservationStatus, event: LifecycleEvent) -> Option<Transition> {
        if from.is_terminal() {
            return None;
        }

        match (from, event) {
            // From Scheduled
            (ReservationStatus::Scheduled, LifecycleEvent::Update) => {
                Some(Transition::To(ReservationStatus::Scheduled))
            }
            (ReservationStatus::Scheduled, LifecycleEvent::Cancel) => {
                Some(Transition::To(ReservationStatus::Cancelled))
            }
            (ReservationStatus::Scheduled, LifecycleEvent::Complete) => {
                Some(Transition::To(ReservationStatus::Complete))
            }

            // From Cancelled
            (ReservationStatus::Cancelled, LifecycleEvent::Restore) => {
                Some(Transition::To(ReservationStatus::Scheduled))
            }
            (ReservationStatus::Cancelled, LifecycleEvent::Delete) => Some(Transition::Remove),

            _ => None,
        }
    }

    /// Check if an event is allowed from a status
    pub fn is_valid_transition(from: ReservationStatus, event: LifecycleEvent) -> bool {
        Self::next(from, event).is_some()
    }

    /// Attempt to apply an event
    ///
    /// # Returns
    /// The resulting transition, or `InvalidTransition`
    pub fn transition(
        from: ReservationStatus,
        event: LifecycleEvent,
    ) -> Result<Transition, ReservationError> {
        Self::next(from, event).ok_or(ReservationError::InvalidTransition { from, event })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test valid transitions from Scheduled
    #[test]
    fn test_scheduled_update() {
        assert_eq!(
            StatusMachine::next(ReservationStatus::Scheduled, LifecycleEvent::Update),
            Some(Transition::To(ReservationStatus::Scheduled))
        );
    }

    #[test]
    fn test_scheduled_cancel() {
        assert_eq!(
            StatusMachine::next(ReservationStatus::Scheduled, LifecycleEvent::Cancel),
            Some(Transition::To(ReservationStatus::Cancelled))
        );
    }

    #[test]
    fn test_scheduled_complete() {
        assert_eq!(
            StatusMachine::next(ReservationStatus::Scheduled, LifecycleEvent::Complete),
            Some(Transition::To(ReservationStatus::Complete))
        );
    }

    // Test valid transitions from Cancelled
    #[test]
    fn test_cancelled_restore() {
        assert_eq!(
            StatusMachine::next(ReservationStatus::Cancelled, LifecycleEvent::Restore),
            Some(Transition::To(ReservationStatus::Scheduled))
        );
    }

    #[test]
    fn test_cancelled_delete() {
        assert_eq!(
            StatusMachine::next(ReservationStatus::Cancelled, LifecycleEvent::Delete),
            Some(Transition::Remove)
        );
    }

    // Test rejected transitions
    #[test]
    fn test_restore_scheduled_rejected() {
        assert!(!StatusMachine::is_valid_transition(
            ReservationStatus::Scheduled,
            LifecycleEvent::Restore
        ));
    }

    #[test]
    fn test_delete_scheduled_rejected() {
        assert!(!StatusMachine::is_valid_transition(
            ReservationStatus::Scheduled,
            LifecycleEvent::Delete
        ));
    }

    #[test]
    fn test_cancelled_cannot_be_edited_or_completed() {
        for event in [
            LifecycleEvent::Update,
            LifecycleEvent::Cancel,
            LifecycleEvent::Complete,
        ] {
            assert!(!StatusMachine::is_valid_transition(
                ReservationStatus::Cancelled,
                event
            ));
        }
    }

    #[test]
    fn test_create_never_applies_to_existing() {
        for from in [
            ReservationStatus::Scheduled,
            ReservationStatus::Cancelled,
            ReservationStatus::Complete,
        ] {
            assert!(!StatusMachine::is_valid_transition(from, LifecycleEvent::Create));
        }
    }

    // Test transition function
    #[test]
    fn test_transition_valid() {
        let result = StatusMachine::transition(ReservationStatus::Scheduled, LifecycleEvent::Cancel);
        assert_eq!(result.unwrap(), Transition::To(ReservationStatus::Cancelled));
    }

    #[test]
    fn test_complete_twice_fails() {
        let result = StatusMachine::transition(ReservationStatus::Complete, LifecycleEvent::Complete);
        assert!(matches!(
            result,
            Err(ReservationError::InvalidTransition {
                from: ReservationStatus::Complete,
                event: LifecycleEvent::Complete
            })
        ));
    }

    #[test]
    fn test_event_display() {
        assert_eq!(LifecycleEvent::Restore.to_string(), "restore");
        assert_eq!(
            serde_json::to_string(&LifecycleEvent::Complete).unwrap(),
            "\"complete\""
        );
    }
}
