// HTTP handlers for reservation endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::reservations::{
    BookingConflict, BookingQuote, CancelResponse, CancellationQuote, CompleteRequest,
    ConflictQuery, DeleteQuery, EligibilityReport, Reservation, ReservationError,
    ReservationFilter, ReservationRequest, ResourcePolicy, StartTimeOptions, StartTimeQuery,
};
use crate::staff::StaffName;

/// Handler for POST /api/reservations/quote
/// Previews the normalized window, price and conflicts without saving
#[utoipa::path(
    post,
    path = "/api/reservations/quote",
    params(ConflictQuery),
    request_body = ReservationRequest,
    responses(
        (status = 200, description = "Booking preview", body = BookingQuote),
        (status = 400, description = "Invalid request")
    ),
    tag = "reservations"
)]
pub async fn quote_reservation_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<ConflictQuery>,
    Json(request): Json<ReservationRequest>,
) -> Result<Json<BookingQuote>, ReservationError> {
    let quote = state
        .reservation_service
        .quote(&request, query.exclude)
        .await?;

    Ok(Json(quote))
}

/// Handler for POST /api/reservations/conflicts
/// Lists scheduled bookings that would clash with a request
#[utoipa::path(
    post,
    path = "/api/reservations/conflicts",
    params(ConflictQuery),
    request_body = ReservationRequest,
    responses(
        (status = 200, description = "Conflicting bookings", body = Vec<BookingConflict>),
        (status = 400, description = "Invalid request")
    ),
    tag = "reservations"
)]
pub async fn list_conflicts_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<ConflictQuery>,
    Json(request): Json<ReservationRequest>,
) -> Result<Json<Vec<BookingConflict>>, ReservationError> {
    let conflicts = state
        .reservation_service
        .conflicts(&request, query.exclude)
        .await?;

    Ok(Json(conflicts))
}

/// Handler for GET /api/reservations/start-times
/// Start times offered for a resource type, formatted HH:MM
#[utoipa::path(
    get,
    path = "/api/reservations/start-times",
    params(StartTimeQuery),
    responses(
        (status = 200, description = "Start time menu", body = StartTimeOptions),
        (status = 400, description = "Unknown resource type")
    ),
    tag = "reservations"
)]
pub async fn start_time_options_handler(
    Query(query): Query<StartTimeQuery>,
) -> Json<StartTimeOptions> {
    Json(ResourcePolicy::for_type(query.resource_type).start_time_menu())
}

/// Handler for GET /api/reservations
/// Lists reservations ordered by start time
#[utoipa::path(
    get,
    path = "/api/reservations",
    params(ReservationFilter),
    responses(
        (status = 200, description = "Reservations", body = Vec<Reservation>),
        (status = 500, description = "Internal server error")
    ),
    tag = "reservations"
)]
pub async fn list_reservations_handler(
    State(state): State<crate::AppState>,
    Query(filter): Query<ReservationFilter>,
) -> Result<Json<Vec<Reservation>>, ReservationError> {
    tracing::debug!("Listing reservations with filter: {:?}", filter);
    let reservations = state.reservation_service.list(&filter).await?;
    Ok(Json(reservations))
}

/// Handler for POST /api/reservations
/// Creates a new reservation
#[utoipa::path(
    post,
    path = "/api/reservations",
    request_body = ReservationRequest,
    params(("x-staff-name" = Option<String>, Header, description = "Acting staff member")),
    responses(
        (status = 201, description = "Reservation created", body = Reservation),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Items already booked")
    ),
    tag = "reservations"
)]
pub async fn create_reservation_handler(
    State(state): State<crate::AppState>,
    staff: StaffName,
    Json(request): Json<ReservationRequest>,
) -> Result<(StatusCode, Json<Reservation>), ReservationError> {
    let reservation = state
        .reservation_service
        .create(request, staff.as_str())
        .await?;

    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Handler for GET /api/reservations/{id}
#[utoipa::path(
    get,
    path = "/api/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation found", body = Reservation),
        (status = 404, description = "Reservation not found")
    ),
    tag = "reservations"
)]
pub async fn get_reservation_handler(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, ReservationError> {
    let reservation = state.reservation_service.get(id).await?;
    Ok(Json(reservation))
}

/// Handler for PUT /api/reservations/{id}
/// Edits a scheduled reservation
#[utoipa::path(
    put,
    path = "/api/reservations/{id}",
    request_body = ReservationRequest,
    params(
        ("id" = Uuid, Path, description = "Reservation ID"),
        ("x-staff-name" = Option<String>, Header, description = "Acting staff member")
    ),
    responses(
        (status = 200, description = "Reservation updated", body = Reservation),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Not editable, or items already booked")
    ),
    tag = "reservations"
)]
pub async fn update_reservation_handler(
    State(state): State<crate::AppState>,
    staff: StaffName,
    Path(id): Path<Uuid>,
    Json(request): Json<ReservationRequest>,
) -> Result<Json<Reservation>, ReservationError> {
    let reservation = state
        .reservation_service
        .update(id, request, staff.as_str())
        .await?;

    Ok(Json(reservation))
}

/// Handler for GET /api/reservations/{id}/cancellation
/// Shows the fee a cancellation would incur right now
#[utoipa::path(
    get,
    path = "/api/reservations/{id}/cancellation",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Cancellation fee preview", body = CancellationQuote),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation cannot be cancelled")
    ),
    tag = "reservations"
)]
pub async fn cancellation_quote_handler(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancellationQuote>, ReservationError> {
    let quote = state.reservation_service.cancellation_quote(id).await?;
    Ok(Json(quote))
}

/// Handler for POST /api/reservations/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/reservations/{id}/cancel",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation cancelled or deleted", body = CancelResponse),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation cannot be cancelled")
    ),
    tag = "reservations"
)]
pub async fn cancel_reservation_handler(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancelResponse>, ReservationError> {
    let response = state.reservation_service.cancel(id).await?;
    Ok(Json(response))
}

/// Handler for POST /api/reservations/{id}/restore
#[utoipa::path(
    post,
    path = "/api/reservations/{id}/restore",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation restored", body = Reservation),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Not cancelled, or items already booked")
    ),
    tag = "reservations"
)]
pub async fn restore_reservation_handler(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, ReservationError> {
    let reservation = state.reservation_service.restore(id).await?;
    Ok(Json(reservation))
}

/// Handler for POST /api/reservations/{id}/complete
#[utoipa::path(
    post,
    path = "/api/reservations/{id}/complete",
    request_body = CompleteRequest,
    params(
        ("id" = Uuid, Path, description = "Reservation ID"),
        ("x-staff-name" = Option<String>, Header, description = "Acting staff member")
    ),
    responses(
        (status = 200, description = "Reservation completed", body = Reservation),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation is not scheduled"),
        (status = 422, description = "End date has not arrived yet")
    ),
    tag = "reservations"
)]
pub async fn complete_reservation_handler(
    State(state): State<crate::AppState>,
    staff: StaffName,
    Path(id): Path<Uuid>,
    Json(request): Json<CompleteRequest>,
) -> Result<Json<Reservation>, ReservationError> {
    let reservation = state
        .reservation_service
        .complete(id, request, staff.as_str())
        .await?;

    Ok(Json(reservation))
}

/// Handler for GET /api/reservations/{id}/eligibility
#[utoipa::path(
    get,
    path = "/api/reservations/{id}/eligibility",
    params(("id" = Uuid, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Available lifecycle actions", body = EligibilityReport),
        (status = 404, description = "Reservation not found")
    ),
    tag = "reservations"
)]
pub async fn eligibility_handler(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EligibilityReport>, ReservationError> {
    let report = state.reservation_service.eligibility(id).await?;
    Ok(Json(report))
}

/// Handler for DELETE /api/reservations/{id}?confirm=true
/// Permanently removes a cancelled reservation
#[utoipa::path(
    delete,
    path = "/api/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation ID"), DeleteQuery),
    responses(
        (status = 204, description = "Reservation deleted"),
        (status = 400, description = "Confirmation missing"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation is not cancelled")
    ),
    tag = "reservations"
)]
pub async fn delete_reservation_handler(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode, ReservationError> {
    state.reservation_service.delete(id, query.confirm).await?;
    Ok(StatusCode::NO_CONTENT)
}
