use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::clock::ClockReading;
use crate::inventory::Item;
use crate::reservations::{
    BookingWindow, CancelDisposition, CancellationPolicy, LifecycleEvent, NewReservation,
    PriceCalculator, Reservation, ReservationError, ReservationRequest, ResourcePolicy,
    ResourceType, StatusMachine, Transition, WindowNormalizer,
};

/// A request resolved against policy, inventory and pricing
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedBooking {
    pub resource_type: ResourceType,
    pub window: BookingWindow,
    pub items: Vec<String>,
    pub total_cost: Decimal,
}

/// Result of cancelling a scheduled reservation
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    /// Kept with a late fee attached
    Cancelled { reservation: Reservation, fee: Decimal },
    /// No fee applied, so the record is removed
    Deleted { id: Uuid },
}

/// Which lifecycle actions are currently available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Eligibility {
    pub can_edit: bool,
    pub can_cancel: bool,
    pub can_complete: bool,
    pub can_restore: bool,
    pub can_delete: bool,
}

/// Applies lifecycle events to reservations
///
/// Every function is pure: callers pass the inventory snapshot, staff name
/// and clock reading, and persist whatever comes back.
pub struct ReservationLifecycle;

impl ReservationLifecycle {
    /// Resolve item references into an ordered, duplicate-free list of item names
    ///
    /// Resource types that do not take a selection book their single implicit
    /// item; any references supplied for them are ignored.
    pub fn resolve_items(
        resource_type: ResourceType,
        references: &[String],
        inventory: &[Item],
    ) -> Result<Vec<String>, ReservationError> {
        let policy = ResourcePolicy::for_type(resource_type);

        if !policy.requires_item_selection {
            return match inventory.iter().find(|i| i.resource_type == resource_type) {
                Some(item) if !item.is_in_service() => {
                    Err(ReservationError::ItemOutOfService(item.name.clone()))
                }
                Some(item) => Ok(vec![item.name.clone()]),
                None => Ok(policy
                    .default_item
                    .map(|name| vec![name.to_string()])
                    .unwrap_or_default()),
            };
        }

        let mut resolved: Vec<String> = Vec::new();
        for reference in references.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
            let item = inventory
                .iter()
                .find(|i| i.matches(reference))
                .ok_or_else(|| ReservationError::UnknownItem(reference.to_string()))?;

            if item.resource_type != resource_type {
                return Err(ReservationError::ItemTypeMismatch {
                    item: item.name.clone(),
                    expected: resource_type,
                    actual: item.resource_type,
                });
            }
            if !item.is_in_service() {
                return Err(ReservationError::ItemOutOfService(item.name.clone()));
            }
            if !resolved.contains(&item.name) {
                resolved.push(item.name.clone());
            }
        }

        if resolved.is_empty() {
            return Err(ReservationError::EmptySelection(resource_type));
        }
        Ok(resolved)
    }

    /// Normalize, resolve items and price a request
    pub fn prepare(
        request: &ReservationRequest,
        inventory: &[Item],
    ) -> Result<PreparedBooking, ReservationError> {
        let items = Self::resolve_items(request.resource_type, &request.items, inventory)?;
        let window = WindowNormalizer::normalize(
            request.resource_type,
            request.start_date,
            request.start_time,
            request.end_date,
        )?;
        let total_cost = PriceCalculator::price(request.resource_type, window.start, window.end)?;

        Ok(PreparedBooking {
            resource_type: request.resource_type,
            window,
            items,
            total_cost,
        })
    }

    /// Create: validate and price a new booking
    pub fn create(
        request: &ReservationRequest,
        inventory: &[Item],
        staff: &str,
        now: DateTime<Utc>,
    ) -> Result<NewReservation, ReservationError> {
        let prepared = Self::prepare(request, inventory)?;
        Ok(NewReservation {
            rented_to: request.rented_to.trim().to_string(),
            resource_type: prepared.resource_type,
            items: prepared.items,
            start_time: prepared.window.start,
            end_time: prepared.window.end,
            rental_notes: request.rental_notes.clone(),
            total_cost: prepared.total_cost,
            override_lock: request.override_lock,
            scheduled_by: staff.to_string(),
            created_at: now,
        })
    }

    /// Update: revalidate a scheduled booking, repricing only when its window or type moved
    pub fn update(
        existing: &Reservation,
        request: &ReservationRequest,
        inventory: &[Item],
        staff: &str,
        now: DateTime<Utc>,
    ) -> Result<Reservation, ReservationError> {
        StatusMachine::transition(existing.status, LifecycleEvent::Update)?;
        let prepared = Self::prepare(request, inventory)?;

        let repriced = prepared.resource_type != existing.resource_type
            || prepared.window.start != existing.start_time
            || prepared.window.end != existing.end_time;

        let mut updated = existing.clone();
        updated.rented_to = request.rented_to.trim().to_string();
        updated.resource_type = prepared.resource_type;
        updated.items = prepared.items;
        updated.start_time = prepared.window.start;
        updated.end_time = prepared.window.end;
        updated.rental_notes = request.rental_notes.clone();
        updated.override_lock = request.override_lock;
        if repriced {
            updated.total_cost = prepared.total_cost;
        }
        updated.edit_by = Some(staff.to_string());
        updated.last_update = Some(now);
        Ok(updated)
    }

    /// Cancel: soft-cancel with a late fee, or route to deletion when the fee is zero
    pub fn cancel(
        existing: &Reservation,
        now: ClockReading,
    ) -> Result<CancelOutcome, ReservationError> {
        let next = StatusMachine::transition(existing.status, LifecycleEvent::Cancel)?;
        let quote = CancellationPolicy::quote(existing.resource_type, existing.start_time, now.local);

        match (quote.disposition, next) {
            (CancelDisposition::SoftCancel, Transition::To(status)) => {
                let mut cancelled = existing.clone();
                cancelled.status = status;
                // A cancelled booking displays the fee as its cost
                cancelled.total_cost = quote.fee;
                cancelled.cancellation_fee = Some(quote.fee);
                cancelled.cancelled_at = Some(now.instant);
                Ok(CancelOutcome::Cancelled {
                    reservation: cancelled,
                    fee: quote.fee,
                })
            }
            _ => Ok(CancelOutcome::Deleted { id: existing.id }),
        }
    }

    /// Restore: bring a cancelled booking back, drop its fee and reprice it
    pub fn restore(
        existing: &Reservation,
        now: DateTime<Utc>,
    ) -> Result<Reservation, ReservationError> {
        let next = StatusMachine::transition(existing.status, LifecycleEvent::Restore)?;
        let mut restored = existing.clone();
        if let Transition::To(status) = next {
            restored.status = status;
        }
        restored.total_cost =
            PriceCalculator::price(existing.resource_type, existing.start_time, existing.end_time)?;
        restored.cancellation_fee = None;
        restored.restored_at = Some(now);
        Ok(restored)
    }

    /// Complete: close out a booking once its end date has arrived
    ///
    /// The end date is never pulled forward here; callers that want
    /// "complete today" must update the booking first.
    pub fn complete(
        existing: &Reservation,
        return_notes: &str,
        staff: &str,
        now: ClockReading,
    ) -> Result<Reservation, ReservationError> {
        let next = StatusMachine::transition(existing.status, LifecycleEvent::Complete)?;

        let today = now.today();
        let end_date = existing.end_time.date();
        if today < end_date {
            return Err(ReservationError::NotYetEligible { end_date, today });
        }

        let mut completed = existing.clone();
        if let Transition::To(status) = next {
            completed.status = status;
        }
        completed.return_notes = Some(return_notes.to_string());
        completed.completed_by = Some(staff.to_string());
        completed.completed_at = Some(now.instant);
        Ok(completed)
    }

    /// Delete: remove a cancelled booking, only with explicit confirmation
    pub fn delete(existing: &Reservation, confirmed: bool) -> Result<Uuid, ReservationError> {
        StatusMachine::transition(existing.status, LifecycleEvent::Delete)?;
        if !confirmed {
            return Err(ReservationError::ConfirmationRequired);
        }
        Ok(existing.id)
    }

    pub fn can_edit(reservation: &Reservation) -> bool {
        StatusMachine::is_valid_transition(reservation.status, LifecycleEvent::Update)
    }

    pub fn can_cancel(reservation: &Reservation) -> bool {
        StatusMachine::is_valid_transition(reservation.status, LifecycleEvent::Cancel)
    }

    /// Completion needs a scheduled booking whose end date is today or earlier
    pub fn can_complete(reservation: &Reservation, today: NaiveDate) -> bool {
        StatusMachine::is_valid_transition(reservation.status, LifecycleEvent::Complete)
            && today >= reservation.end_time.date()
    }

    pub fn can_restore(reservation: &Reservation) -> bool {
        StatusMachine::is_valid_transition(reservation.status, LifecycleEvent::Restore)
    }

    pub fn can_delete(reservation: &Reservation) -> bool {
        StatusMachine::is_valid_transition(reservation.status, LifecycleEvent::Delete)
    }

    pub fn eligibility(reservation: &Reservation, today: NaiveDate) -> Eligibility {
        Eligibility {
            can_edit: Self::can_edit(reservation),
            can_cancel: Self::can_cancel(reservation),
            can_complete: Self::can_complete(reservation, today),
            can_restore: Self::can_restore(reservation),
            can_delete: Self::can_delete(reservation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::seed::default_items;
    use crate::inventory::ServiceStatus;
    use crate::reservations::ReservationStatus;
    use chrono::{Duration, FixedOffset, NaiveDateTime, TimeZone};
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn reading(d: u32, h: u32) -> ClockReading {
        ClockReading::new(
            Utc.with_ymd_and_hms(2025, 6, d, h, 0, 0).unwrap(),
            FixedOffset::east_opt(0).unwrap(),
        )
    }

    fn request(resource_type: ResourceType, start: NaiveDate, end: Option<NaiveDate>) -> ReservationRequest {
        ReservationRequest {
            rented_to: "Unit 1204".to_string(),
            resource_type,
            items: vec![],
            start_date: start,
            start_time: None,
            end_date: end,
            rental_notes: "Late arrival".to_string(),
            override_lock: false,
        }
    }

    fn scheduled(request: &ReservationRequest) -> Reservation {
        ReservationLifecycle::create(request, &default_items(), "Front Desk", Utc::now())
            .unwrap()
            .into_reservation(Uuid::new_v4())
    }

    fn gear(start: NaiveDate, end: NaiveDate) -> ReservationRequest {
        let mut req = request(ResourceType::GearShed, start, Some(end));
        req.items = vec!["kayak-1".to_string()];
        req
    }

    fn local(d: u32, h: u32) -> NaiveDateTime {
        date(d).and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_create_guest_suite() {
        let req = request(ResourceType::GuestSuite, date(13), Some(date(15)));
        let new = ReservationLifecycle::create(&req, &default_items(), "Front Desk", Utc::now()).unwrap();

        assert_eq!(new.items, vec!["Guest Suite".to_string()]);
        assert_eq!(new.start_time, local(13, 15));
        assert_eq!(new.end_time, date(15).and_hms_opt(11, 0, 0).unwrap());
        assert_eq!(new.total_cost, dec!(350.00));
        assert_eq!(new.scheduled_by, "Front Desk");
    }

    #[test]
    fn test_gear_shed_resolves_and_dedupes() {
        let mut req = request(ResourceType::GearShed, date(13), None);
        req.items = vec![
            " kayak-1 ".to_string(),
            "KAYAK 1".to_string(),
            "Mountain Bike 2".to_string(),
        ];
        let new = ReservationLifecycle::create(&req, &default_items(), "Staff", Utc::now()).unwrap();
        assert_eq!(
            new.items,
            vec!["Kayak 1".to_string(), "Mountain Bike 2".to_string()]
        );
        assert_eq!(new.total_cost, dec!(0.00));
    }

    #[test]
    fn test_gear_shed_requires_selection() {
        let mut req = request(ResourceType::GearShed, date(13), None);
        req.items = vec!["   ".to_string()];
        let result = ReservationLifecycle::create(&req, &default_items(), "Staff", Utc::now());
        assert!(matches!(
            result,
            Err(ReservationError::EmptySelection(ResourceType::GearShed))
        ));
    }

    #[test]
    fn test_item_validation() {
        let mut inventory = default_items();
        if let Some(bike) = inventory.iter_mut().find(|i| i.item_id == "bike-1") {
            bike.service_status = ServiceStatus::NotInService;
        }

        let cases = vec![
            ("Canoe", "UNKNOWN_ITEM"),
            ("Sky Lounge", "ITEM_TYPE_MISMATCH"),
            ("bike-1", "ITEM_OUT_OF_SERVICE"),
        ];
        for (reference, code) in cases {
            let result = ReservationLifecycle::resolve_items(
                ResourceType::GearShed,
                &[reference.to_string()],
                &inventory,
            );
            assert_eq!(result.unwrap_err().code(), code, "reference {}", reference);
        }
    }

    #[test]
    fn test_implicit_item_out_of_service() {
        let mut inventory = default_items();
        if let Some(lounge) = inventory.iter_mut().find(|i| i.item_id == "sl-1") {
            lounge.service_status = ServiceStatus::NotInService;
        }
        let result = ReservationLifecycle::resolve_items(ResourceType::SkyLounge, &[], &inventory);
        assert!(matches!(result, Err(ReservationError::ItemOutOfService(_))));

        let fallback = ReservationLifecycle::resolve_items(ResourceType::SkyLounge, &[], &[]).unwrap();
        assert_eq!(fallback, vec!["Sky Lounge".to_string()]);
    }

    #[test]
    fn test_update_reprices_only_when_window_changes() {
        let req = request(ResourceType::GuestSuite, date(13), Some(date(15)));
        let mut existing = scheduled(&req);
        existing.total_cost = dec!(320.00);

        let mut same_window = req.clone();
        same_window.rental_notes = "Extra towels".to_string();
        let updated =
            ReservationLifecycle::update(&existing, &same_window, &default_items(), "Night Desk", Utc::now())
                .unwrap();
        assert_eq!(updated.total_cost, dec!(320.00));
        assert_eq!(updated.rental_notes, "Extra towels");
        assert_eq!(updated.edit_by.as_deref(), Some("Night Desk"));
        assert!(updated.last_update.is_some());

        // Mon-Wed instead of Fri-Sun
        let moved = request(ResourceType::GuestSuite, date(16), Some(date(18)));
        let updated =
            ReservationLifecycle::update(&existing, &moved, &default_items(), "Night Desk", Utc::now())
                .unwrap();
        assert_eq!(updated.total_cost, dec!(250.00));
    }

    #[test]
    fn test_update_rejected_once_cancelled() {
        let req = request(ResourceType::SkyLounge, date(20), None);
        let mut existing = scheduled(&req);
        existing.status = ReservationStatus::Cancelled;
        let result = ReservationLifecycle::update(&existing, &req, &default_items(), "Staff", Utc::now());
        assert!(matches!(result, Err(ReservationError::InvalidTransition { .. })));
    }

    #[test]
    fn test_late_sky_lounge_cancel_keeps_record() {
        // Starts 2025-06-20 10:00, cancelled 20 hours before
        let existing = scheduled(&request(ResourceType::SkyLounge, date(20), None));
        let outcome = ReservationLifecycle::cancel(&existing, reading(19, 14)).unwrap();

        match outcome {
            CancelOutcome::Cancelled { reservation, fee } => {
                assert_eq!(fee, dec!(150.00));
                assert_eq!(reservation.status, ReservationStatus::Cancelled);
                assert_eq!(reservation.cancellation_fee, Some(dec!(150.00)));
                assert_eq!(reservation.total_cost, dec!(150.00));
                assert!(reservation.cancelled_at.is_some());
            }
            other => panic!("expected soft cancel, got {:?}", other),
        }
    }

    #[test]
    fn test_early_guest_suite_cancel_deletes() {
        // Starts 2025-06-20 15:00, cancelled 100 hours before
        let existing = scheduled(&request(ResourceType::GuestSuite, date(20), None));
        let now = ClockReading::new(
            Utc.with_ymd_and_hms(2025, 6, 20, 15, 0, 0).unwrap() - Duration::hours(100),
            FixedOffset::east_opt(0).unwrap(),
        );
        let outcome = ReservationLifecycle::cancel(&existing, now).unwrap();
        assert_eq!(outcome, CancelOutcome::Deleted { id: existing.id });
    }

    #[test]
    fn test_restore_clears_fee() {
        let existing = scheduled(&request(ResourceType::SkyLounge, date(20), None));
        let CancelOutcome::Cancelled { reservation, .. } =
            ReservationLifecycle::cancel(&existing, reading(19, 14)).unwrap()
        else {
            panic!("expected soft cancel");
        };

        let restored = ReservationLifecycle::restore(&reservation, Utc::now()).unwrap();
        assert_eq!(restored.status, ReservationStatus::Scheduled);
        assert_eq!(restored.cancellation_fee, None);
        assert!(restored.restored_at.is_some());
        assert_eq!(restored.total_cost, dec!(300.00));
    }

    #[test]
    fn test_restore_scheduled_rejected() {
        let existing = scheduled(&request(ResourceType::SkyLounge, date(20), None));
        assert!(matches!(
            ReservationLifecycle::restore(&existing, Utc::now()),
            Err(ReservationError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_complete_before_end_date() {
        // Gear shed ends 2025-06-14, today is 2025-06-13
        let existing = scheduled(&gear(date(13), date(14)));
        let result = ReservationLifecycle::complete(&existing, "", "Staff", reading(13, 19));
        assert!(matches!(
            result,
            Err(ReservationError::NotYetEligible { end_date, today })
                if end_date == date(14) && today == date(13)
        ));
    }

    #[test]
    fn test_complete_on_end_date_ignores_time_of_day() {
        let existing = scheduled(&gear(date(13), date(14)));
        let completed =
            ReservationLifecycle::complete(&existing, "All returned", "Staff", reading(14, 8)).unwrap();
        assert_eq!(completed.status, ReservationStatus::Complete);
        assert_eq!(completed.return_notes.as_deref(), Some("All returned"));
        assert_eq!(completed.completed_by.as_deref(), Some("Staff"));

        let again = ReservationLifecycle::complete(&completed, "", "Staff", reading(15, 8));
        assert!(matches!(again, Err(ReservationError::InvalidTransition { .. })));
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let mut existing = scheduled(&request(ResourceType::SkyLounge, date(20), None));
        assert!(matches!(
            ReservationLifecycle::delete(&existing, true),
            Err(ReservationError::InvalidTransition { .. })
        ));

        existing.status = ReservationStatus::Cancelled;
        assert!(matches!(
            ReservationLifecycle::delete(&existing, false),
            Err(ReservationError::ConfirmationRequired)
        ));
        assert_eq!(ReservationLifecycle::delete(&existing, true).unwrap(), existing.id);
    }

    #[test]
    fn test_eligibility_predicates() {
        let mut existing = scheduled(&request(ResourceType::SkyLounge, date(20), None));
        let before = ReservationLifecycle::eligibility(&existing, date(19));
        assert!(before.can_edit && before.can_cancel);
        assert!(!before.can_complete && !before.can_restore && !before.can_delete);
        assert!(ReservationLifecycle::can_complete(&existing, date(20)));

        existing.status = ReservationStatus::Cancelled;
        let cancelled = ReservationLifecycle::eligibility(&existing, date(21));
        assert!(cancelled.can_restore && cancelled.can_delete);
        assert!(!cancelled.can_edit && !cancelled.can_complete);

        existing.status = ReservationStatus::Complete;
        let done = ReservationLifecycle::eligibility(&existing, date(21));
        assert_eq!(
            done,
            Eligibility {
                can_edit: false,
                can_cancel: false,
                can_complete: false,
                can_restore: false,
                can_delete: false,
            }
        );
    }
}
