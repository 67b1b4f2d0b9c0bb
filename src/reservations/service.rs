use chrono::FixedOffset;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::clock::{Clock, ClockReading};
use crate::inventory::{Item, ItemRepository};
use crate::reservations::{
    AvailabilityCheck, BookingConflict, BookingQuote, BookingWindow, CancelDisposition,
    CancelOutcome, CancelResponse, CancellationPolicy, CancellationQuote, CompleteRequest,
    ConflictDetector, EligibilityReport, LifecycleEvent, PriceCalculator, Reservation,
    ReservationError, ReservationFilter, ReservationLifecycle, ReservationRepository,
    ReservationRequest, StatusMachine, WriteGuard,
};

/// Service for reservation business logic
///
/// Loads what the lifecycle rules need (inventory snapshot, existing
/// bookings, the current time), applies them, and persists the result.
/// Availability and the loaded status are rechecked by the repository
/// inside the write.
#[derive(Clone)]
pub struct ReservationService {
    reservations: Arc<dyn ReservationRepository>,
    items: Arc<dyn ItemRepository>,
    clock: Arc<dyn Clock>,
    utc_offset: FixedOffset,
}

impl ReservationService {
    /// Create a new ReservationService
    pub fn new(
        reservations: Arc<dyn ReservationRepository>,
        items: Arc<dyn ItemRepository>,
        clock: Arc<dyn Clock>,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            reservations,
            items,
            clock,
            utc_offset,
        }
    }

    fn now(&self) -> ClockReading {
        ClockReading::read(self.clock.as_ref(), self.utc_offset)
    }

    async fn inventory(&self) -> Result<Vec<Item>, ReservationError> {
        Ok(self.items.list(None).await?)
    }

    async fn load(&self, id: Uuid) -> Result<Reservation, ReservationError> {
        self.reservations
            .find_by_id(id)
            .await?
            .ok_or(ReservationError::NotFound(id))
    }

    async fn find_conflicts(
        &self,
        window: &BookingWindow,
        items: &[String],
        exclude: Option<Uuid>,
    ) -> Result<Vec<BookingConflict>, ReservationError> {
        let overlapping = self
            .reservations
            .find_scheduled_overlapping(window.start, window.end)
            .await?;
        Ok(ConflictDetector::find(window, items, &overlapping, exclude))
    }

    /// Preview the window, items, price and conflicts for a request
    ///
    /// `exclude` names the reservation being edited, if any.
    pub async fn quote(
        &self,
        request: &ReservationRequest,
        exclude: Option<Uuid>,
    ) -> Result<BookingQuote, ReservationError> {
        request.validate()?;
        let inventory = self.inventory().await?;
        let prepared = ReservationLifecycle::prepare(request, &inventory)?;
        let price = PriceCalculator::quote(
            prepared.resource_type,
            prepared.window.start,
            prepared.window.end,
        )?;
        let conflicts = self
            .find_conflicts(&prepared.window, &prepared.items, exclude)
            .await?;

        Ok(BookingQuote {
            window: prepared.window,
            items: prepared.items,
            price,
            conflicts,
        })
    }

    /// List reservations, ordered by start time
    pub async fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, ReservationError> {
        self.reservations.list(filter).await
    }

    /// Get a reservation by ID
    pub async fn get(&self, id: Uuid) -> Result<Reservation, ReservationError> {
        self.load(id).await
    }

    /// Create a new reservation
    ///
    /// # Validation
    /// - Request fields pass DTO validation
    /// - Items exist, match the resource type and are in service
    /// - The normalized window satisfies the resource policy
    /// - No scheduled booking holds the items for an overlapping window,
    ///   unless `override_lock` is set
    pub async fn create(
        &self,
        request: ReservationRequest,
        staff: &str,
    ) -> Result<Reservation, ReservationError> {
        request.validate()?;
        let inventory = self.inventory().await?;
        let now = self.now();

        let new = ReservationLifecycle::create(&request, &inventory, staff, now.instant)?;
        let availability = AvailabilityCheck {
            window: BookingWindow::new(new.start_time, new.end_time),
            items: new.items.clone(),
            exclude: None,
            override_lock: new.override_lock,
        };

        let created = self.reservations.create(new, &availability).await?;
        tracing::info!(
            "Reservation {} created for {} ({}, {} -> {}, {})",
            created.id,
            created.rented_to,
            created.resource_type,
            created.start_time,
            created.end_time,
            created.total_cost
        );
        Ok(created)
    }

    /// Update a scheduled reservation
    pub async fn update(
        &self,
        id: Uuid,
        request: ReservationRequest,
        staff: &str,
    ) -> Result<Reservation, ReservationError> {
        request.validate()?;
        let existing = self.load(id).await?;
        let inventory = self.inventory().await?;
        let now = self.now();

        let updated = ReservationLifecycle::update(&existing, &request, &inventory, staff, now.instant)?;
        let availability = AvailabilityCheck {
            window: BookingWindow::new(updated.start_time, updated.end_time),
            items: updated.items.clone(),
            exclude: Some(id),
            override_lock: updated.override_lock,
        };

        let saved = self
            .reservations
            .save(
                &updated,
                WriteGuard::for_event(&existing, LifecycleEvent::Update),
                Some(&availability),
            )
            .await?;
        tracing::info!("Reservation {} updated by {}", saved.id, staff);
        Ok(saved)
    }

    /// Fee preview for cancelling a reservation now
    pub async fn cancellation_quote(&self, id: Uuid) -> Result<CancellationQuote, ReservationError> {
        let existing = self.load(id).await?;
        StatusMachine::transition(existing.status, LifecycleEvent::Cancel)?;
        Ok(CancellationPolicy::quote(
            existing.resource_type,
            existing.start_time,
            self.now().local,
        ))
    }

    /// Cancel a reservation
    ///
    /// A late cancellation keeps the record with its fee; a free one deletes it.
    pub async fn cancel(&self, id: Uuid) -> Result<CancelResponse, ReservationError> {
        let existing = self.load(id).await?;
        let guard = WriteGuard::for_event(&existing, LifecycleEvent::Cancel);

        match ReservationLifecycle::cancel(&existing, self.now())? {
            CancelOutcome::Cancelled { reservation, fee } => {
                let saved = self.reservations.save(&reservation, guard, None).await?;
                tracing::info!("Reservation {} cancelled with fee {}", id, fee);
                Ok(CancelResponse {
                    id,
                    fee,
                    disposition: CancelDisposition::SoftCancel,
                    reservation: Some(saved),
                })
            }
            CancelOutcome::Deleted { id } => {
                self.reservations.delete(id, guard).await?;
                tracing::info!("Reservation {} cancelled without fee and deleted", id);
                Ok(CancelResponse {
                    id,
                    fee: Decimal::ZERO,
                    disposition: CancelDisposition::HardDelete,
                    reservation: None,
                })
            }
        }
    }

    /// Restore a cancelled reservation
    ///
    /// The booking re-enters the schedule and is checked for conflicts like a
    /// new one. A lock override stored on the cancelled record does not carry
    /// over; the window must be free now.
    pub async fn restore(&self, id: Uuid) -> Result<Reservation, ReservationError> {
        let existing = self.load(id).await?;
        let restored = ReservationLifecycle::restore(&existing, self.now().instant)?;
        let availability = AvailabilityCheck {
            window: BookingWindow::new(restored.start_time, restored.end_time),
            items: restored.items.clone(),
            exclude: Some(id),
            override_lock: false,
        };

        let saved = self
            .reservations
            .save(
                &restored,
                WriteGuard::for_event(&existing, LifecycleEvent::Restore),
                Some(&availability),
            )
            .await?;
        tracing::info!("Reservation {} restored", id);
        Ok(saved)
    }

    /// Complete a reservation on or after its end date
    pub async fn complete(
        &self,
        id: Uuid,
        request: CompleteRequest,
        staff: &str,
    ) -> Result<Reservation, ReservationError> {
        request.validate()?;
        let existing = self.load(id).await?;
        let completed =
            ReservationLifecycle::complete(&existing, &request.return_notes, staff, self.now())?;

        let saved = self
            .reservations
            .save(
                &completed,
                WriteGuard::for_event(&existing, LifecycleEvent::Complete),
                None,
            )
            .await?;
        tracing::info!("Reservation {} completed by {}", id, staff);
        Ok(saved)
    }

    /// Permanently delete a cancelled reservation
    pub async fn delete(&self, id: Uuid, confirmed: bool) -> Result<(), ReservationError> {
        let existing = self.load(id).await?;
        ReservationLifecycle::delete(&existing, confirmed)?;

        self.reservations
            .delete(id, WriteGuard::for_event(&existing, LifecycleEvent::Delete))
            .await?;
        tracing::info!("Reservation {} deleted", id);
        Ok(())
    }

    /// Which lifecycle actions are available today
    pub async fn eligibility(&self, id: Uuid) -> Result<EligibilityReport, ReservationError> {
        let existing = self.load(id).await?;
        let today = self.now().today();

        Ok(EligibilityReport {
            reservation_id: existing.id,
            status: existing.status,
            end_date: existing.end_time.date(),
            today,
            eligibility: ReservationLifecycle::eligibility(&existing, today),
        })
    }

    /// Scheduled bookings that would clash with a request
    pub async fn conflicts(
        &self,
        request: &ReservationRequest,
        exclude: Option<Uuid>,
    ) -> Result<Vec<BookingConflict>, ReservationError> {
        request.validate()?;
        let inventory = self.inventory().await?;
        let prepared = ReservationLifecycle::prepare(request, &inventory)?;
        self.find_conflicts(&prepared.window, &prepared.items, exclude)
            .await
    }
}
