use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::reservations::{
    AvailabilityCheck, LifecycleEvent, NewReservation, Reservation, ReservationError,
    ReservationFilter, ReservationStatus,
};

const RESERVATION_COLUMNS: &str = r#"
    id, rented_to, resource_type, items, start_time, end_time, rental_notes,
    return_notes, status, total_cost, cancellation_fee, override_lock,
    scheduled_by, created_at, version, edit_by, last_update, completed_by,
    completed_at, cancelled_at, restored_at
"#;

/// First key of the advisory locks taken per booked item name
const ITEM_LOCK_NAMESPACE: i32 = 0x414d_4e54;

/// State a write was computed from; the store rejects the write if the
/// record has moved on since it was loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteGuard {
    pub event: LifecycleEvent,
    pub expected_status: ReservationStatus,
    pub expected_version: i32,
}

impl WriteGuard {
    /// Guard for applying `event` to a reservation as it was loaded
    pub fn for_event(loaded: &Reservation, event: LifecycleEvent) -> Self {
        Self {
            event,
            expected_status: loaded.status,
            expected_version: loaded.version,
        }
    }

    /// Whether the stored record still matches what the write was computed from
    pub fn matches(&self, stored: &Reservation) -> bool {
        stored.status == self.expected_status && stored.version == self.expected_version
    }

    /// Error for a guarded write that found no matching record
    ///
    /// # Arguments
    /// * `id` - Reservation written
    /// * `current` - Status now stored, `None` when the record is gone
    pub fn rejection(&self, id: Uuid, current: Option<ReservationStatus>) -> ReservationError {
        match current {
            None => ReservationError::NotFound(id),
            Some(from) if from != self.expected_status => ReservationError::InvalidTransition {
                from,
                event: self.event,
            },
            Some(_) => ReservationError::StaleReservation(id),
        }
    }
}

/// Persistence collaborator for reservations
///
/// Writes that change the schedule take an `AvailabilityCheck` and apply it
/// in the same transaction as the write. Writes to existing records take a
/// `WriteGuard`.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Store a new reservation and return it with its assigned id
    async fn create(
        &self,
        reservation: NewReservation,
        availability: &AvailabilityCheck,
    ) -> Result<Reservation, ReservationError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, ReservationError>;

    /// List reservations matching the filter, ordered by start time
    async fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, ReservationError>;

    /// Scheduled reservations whose window overlaps `[start, end)`
    async fn find_scheduled_overlapping(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Reservation>, ReservationError>;

    /// Overwrite an existing reservation, bumping its version
    async fn save(
        &self,
        reservation: &Reservation,
        guard: WriteGuard,
        availability: Option<&AvailabilityCheck>,
    ) -> Result<Reservation, ReservationError>;

    /// Remove a reservation
    async fn delete(&self, id: Uuid, guard: WriteGuard) -> Result<(), ReservationError>;
}

/// Postgres-backed reservation store
#[derive(Clone)]
pub struct PgReservationRepository {
    pool: PgPool,
}

impl PgReservationRepository {
    /// Create a new PgReservationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Serialize writers booking the same items until the transaction ends
///
/// Keys are taken in sorted order so concurrent writers cannot deadlock.
async fn lock_items(conn: &mut PgConnection, items: &[String]) -> Result<(), sqlx::Error> {
    let mut keys: Vec<String> = items.iter().map(|item| item.to_lowercase()).collect();
    keys.sort();
    keys.dedup();

    for key in &keys {
        sqlx::query("SELECT pg_advisory_xact_lock($1, hashtext($2))")
            .bind(ITEM_LOCK_NAMESPACE)
            .bind(key)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn scheduled_overlapping(
    conn: &mut PgConnection,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<Reservation>, sqlx::Error> {
    let query = format!(
        r#"
        SELECT {}
        FROM reservations
        WHERE status = $1 AND start_time < $3 AND end_time > $2
        ORDER BY start_time
        "#,
        RESERVATION_COLUMNS
    );

    sqlx::query_as::<_, Reservation>(&query)
        .bind(ReservationStatus::Scheduled)
        .bind(start)
        .bind(end)
        .fetch_all(&mut *conn)
        .await
}

/// Lock the requested items, then apply the double-booking rule
async fn enforce_availability(
    conn: &mut PgConnection,
    availability: &AvailabilityCheck,
) -> Result<(), ReservationError> {
    lock_items(conn, &availability.items).await?;
    let overlapping =
        scheduled_overlapping(conn, availability.window.start, availability.window.end).await?;
    availability.enforce(&overlapping)?;
    Ok(())
}

async fn current_status(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<ReservationStatus>, sqlx::Error> {
    sqlx::query_scalar("SELECT status FROM reservations WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn create(
        &self,
        reservation: NewReservation,
        availability: &AvailabilityCheck,
    ) -> Result<Reservation, ReservationError> {
        let mut tx = self.pool.begin().await?;
        enforce_availability(&mut tx, availability).await?;

        let query = format!(
            r#"
            INSERT INTO reservations (
                id, rented_to, resource_type, items, start_time, end_time, rental_notes,
                status, total_cost, override_lock, scheduled_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            RESERVATION_COLUMNS
        );

        let created = sqlx::query_as::<_, Reservation>(&query)
            .bind(Uuid::new_v4())
            .bind(&reservation.rented_to)
            .bind(reservation.resource_type)
            .bind(&reservation.items)
            .bind(reservation.start_time)
            .bind(reservation.end_time)
            .bind(&reservation.rental_notes)
            .bind(ReservationStatus::Scheduled)
            .bind(reservation.total_cost)
            .bind(reservation.override_lock)
            .bind(&reservation.scheduled_by)
            .bind(reservation.created_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, ReservationError> {
        let query = format!("SELECT {} FROM reservations WHERE id = $1", RESERVATION_COLUMNS);
        let reservation = sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(reservation)
    }

    async fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, ReservationError> {
        let query = format!(
            r#"
            SELECT {}
            FROM reservations
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR resource_type = $2)
            ORDER BY start_time, created_at
            "#,
            RESERVATION_COLUMNS
        );

        let reservations = sqlx::query_as::<_, Reservation>(&query)
            .bind(filter.status)
            .bind(filter.resource_type)
            .fetch_all(&self.pool)
            .await?;

        Ok(reservations)
    }

    async fn find_scheduled_overlapping(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Reservation>, ReservationError> {
        let mut conn = self.pool.acquire().await?;
        Ok(scheduled_overlapping(&mut conn, start, end).await?)
    }

    async fn save(
        &self,
        reservation: &Reservation,
        guard: WriteGuard,
        availability: Option<&AvailabilityCheck>,
    ) -> Result<Reservation, ReservationError> {
        let mut tx = self.pool.begin().await?;
        if let Some(availability) = availability {
            enforce_availability(&mut tx, availability).await?;
        }

        let query = format!(
            r#"
            UPDATE reservations
            SET rented_to = $2, resource_type = $3, items = $4, start_time = $5,
                end_time = $6, rental_notes = $7, return_notes = $8, status = $9,
                total_cost = $10, cancellation_fee = $11, override_lock = $12,
                edit_by = $13, last_update = $14, completed_by = $15,
                completed_at = $16, cancelled_at = $17, restored_at = $18,
                version = version + 1
            WHERE id = $1 AND status = $19 AND version = $20
            RETURNING {}
            "#,
            RESERVATION_COLUMNS
        );

        let saved = sqlx::query_as::<_, Reservation>(&query)
            .bind(reservation.id)
            .bind(&reservation.rented_to)
            .bind(reservation.resource_type)
            .bind(&reservation.items)
            .bind(reservation.start_time)
            .bind(reservation.end_time)
            .bind(&reservation.rental_notes)
            .bind(&reservation.return_notes)
            .bind(reservation.status)
            .bind(reservation.total_cost)
            .bind(reservation.cancellation_fee)
            .bind(reservation.override_lock)
            .bind(&reservation.edit_by)
            .bind(reservation.last_update)
            .bind(&reservation.completed_by)
            .bind(reservation.completed_at)
            .bind(reservation.cancelled_at)
            .bind(reservation.restored_at)
            .bind(guard.expected_status)
            .bind(guard.expected_version)
            .fetch_optional(&mut *tx)
            .await?;

        match saved {
            Some(saved) => {
                tx.commit().await?;
                Ok(saved)
            }
            None => {
                let current = current_status(&mut tx, reservation.id).await?;
                tracing::debug!(
                    "Rejected write to reservation {} (expected {} v{}, found {:?})",
                    reservation.id,
                    guard.expected_status,
                    guard.expected_version,
                    current
                );
                Err(guard.rejection(reservation.id, current))
            }
        }
    }

    async fn delete(&self, id: Uuid, guard: WriteGuard) -> Result<(), ReservationError> {
        let mut tx = self.pool.begin().await?;
        let result =
            sqlx::query("DELETE FROM reservations WHERE id = $1 AND status = $2 AND version = $3")
                .bind(id)
                .bind(guard.expected_status)
                .bind(guard.expected_version)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            let current = current_status(&mut tx, id).await?;
            return Err(guard.rejection(id, current));
        }

        tx.commit().await?;
        Ok(())
    }
}

/// In-process reservation store used when no database is configured, and by tests
///
/// Every write holds the map's write lock across its checks, which gives the
/// same atomicity as the Postgres transaction.
#[derive(Clone, Default)]
pub struct InMemoryReservationRepository {
    reservations: Arc<RwLock<HashMap<Uuid, Reservation>>>,
}

impl InMemoryReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sort_by_start(reservations: &mut [Reservation]) {
    reservations.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then(a.created_at.cmp(&b.created_at))
    });
}

fn scheduled_in<'a>(
    reservations: impl Iterator<Item = &'a Reservation>,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<Reservation> {
    let mut matching: Vec<Reservation> = reservations
        .filter(|r| r.status == ReservationStatus::Scheduled)
        .filter(|r| r.start_time < end && start < r.end_time)
        .cloned()
        .collect();
    sort_by_start(&mut matching);
    matching
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn create(
        &self,
        reservation: NewReservation,
        availability: &AvailabilityCheck,
    ) -> Result<Reservation, ReservationError> {
        let mut reservations = self.reservations.write().await;
        let overlapping = scheduled_in(
            reservations.values(),
            availability.window.start,
            availability.window.end,
        );
        availability.enforce(&overlapping)?;

        let created = reservation.into_reservation(Uuid::new_v4());
        reservations.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, ReservationError> {
        Ok(self.reservations.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>, ReservationError> {
        let mut matching: Vec<Reservation> = self
            .reservations
            .read()
            .await
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        sort_by_start(&mut matching);
        Ok(matching)
    }

    async fn find_scheduled_overlapping(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Reservation>, ReservationError> {
        Ok(scheduled_in(self.reservations.read().await.values(), start, end))
    }

    async fn save(
        &self,
        reservation: &Reservation,
        guard: WriteGuard,
        availability: Option<&AvailabilityCheck>,
    ) -> Result<Reservation, ReservationError> {
        let mut reservations = self.reservations.write().await;
        match reservations.get(&reservation.id) {
            Some(stored) if guard.matches(stored) => {}
            stored => return Err(guard.rejection(reservation.id, stored.map(|r| r.status))),
        }

        if let Some(availability) = availability {
            let overlapping = scheduled_in(
                reservations.values(),
                availability.window.start,
                availability.window.end,
            );
            availability.enforce(&overlapping)?;
        }

        let mut saved = reservation.clone();
        saved.version = guard.expected_version + 1;
        reservations.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn delete(&self, id: Uuid, guard: WriteGuard) -> Result<(), ReservationError> {
        let mut reservations = self.reservations.write().await;
        match reservations.get(&id) {
            Some(stored) if guard.matches(stored) => {}
            stored => return Err(guard.rejection(id, stored.map(|r| r.status))),
        }
        reservations.remove(&id);
        Ok(())
    }
}
