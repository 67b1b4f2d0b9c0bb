pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod inventory;
pub mod reservations;
pub mod staff;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::FixedOffset;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use clock::Clock;
use inventory::{InMemoryItemRepository, Item, ItemRepository, PgItemRepository, ServiceStatus};
use reservations::{
    BookingConflict, BookingQuote, BookingWindow, CancelDisposition, CancelResponse,
    CancellationQuote, CompleteRequest, Eligibility, EligibilityReport,
    InMemoryReservationRepository, LifecycleEvent, NightlyCharge, PgReservationRepository,
    PriceQuote, Reservation, ReservationRepository, ReservationRequest, ReservationService,
    ReservationStatus, ResourceType, StartTimeOptions,
};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        inventory::handlers::list_items_handler,
        reservations::handlers::quote_reservation_handler,
        reservations::handlers::list_conflicts_handler,
        reservations::handlers::start_time_options_handler,
        reservations::handlers::list_reservations_handler,
        reservations::handlers::create_reservation_handler,
        reservations::handlers::get_reservation_handler,
        reservations::handlers::update_reservation_handler,
        reservations::handlers::cancellation_quote_handler,
        reservations::handlers::cancel_reservation_handler,
        reservations::handlers::restore_reservation_handler,
        reservations::handlers::complete_reservation_handler,
        reservations::handlers::eligibility_handler,
        reservations::handlers::delete_reservation_handler,
    ),
    components(
        schemas(
            Item, ServiceStatus, ResourceType, ReservationStatus, Reservation,
            ReservationRequest, CompleteRequest, BookingWindow, BookingQuote,
            BookingConflict, PriceQuote, NightlyCharge, CancellationQuote,
            CancelDisposition, CancelResponse, Eligibility, EligibilityReport,
            LifecycleEvent, StartTimeOptions
        )
    ),
    tags(
        (name = "items", description = "Bookable inventory"),
        (name = "reservations", description = "Amenity reservation lifecycle")
    ),
    info(
        title = "Amenity Scheduler API",
        version = "0.1.0",
        description = "Staff-facing scheduling for the guest suite, sky lounge and gear shed"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub reservation_service: ReservationService,
    pub item_repo: Arc<dyn ItemRepository>,
}

impl AppState {
    /// Wire the service over the given stores
    pub fn new(
        reservations: Arc<dyn ReservationRepository>,
        items: Arc<dyn ItemRepository>,
        clock: Arc<dyn Clock>,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            reservation_service: ReservationService::new(
                reservations,
                items.clone(),
                clock,
                utc_offset,
            ),
            item_repo: items,
        }
    }

    /// State backed by Postgres
    pub fn postgres(pool: db::DbPool, clock: Arc<dyn Clock>, utc_offset: FixedOffset) -> Self {
        Self::new(
            Arc::new(PgReservationRepository::new(pool.clone())),
            Arc::new(PgItemRepository::new(pool)),
            clock,
            utc_offset,
        )
    }

    /// State backed by process memory; contents are lost on restart
    pub fn in_memory(clock: Arc<dyn Clock>, utc_offset: FixedOffset) -> Self {
        Self::new(
            Arc::new(InMemoryReservationRepository::new()),
            Arc::new(InMemoryItemRepository::new()),
            clock,
            utc_offset,
        )
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Inventory
        .route("/api/items", get(inventory::list_items_handler))
        // Reservations
        .route(
            "/api/reservations",
            get(reservations::list_reservations_handler)
                .post(reservations::create_reservation_handler),
        )
        .route("/api/reservations/quote", post(reservations::quote_reservation_handler))
        .route("/api/reservations/conflicts", post(reservations::list_conflicts_handler))
        .route(
            "/api/reservations/start-times",
            get(reservations::start_time_options_handler),
        )
        .route(
            "/api/reservations/:id",
            get(reservations::get_reservation_handler)
                .put(reservations::update_reservation_handler)
                .delete(reservations::delete_reservation_handler),
        )
        .route(
            "/api/reservations/:id/cancellation",
            get(reservations::cancellation_quote_handler),
        )
        .route("/api/reservations/:id/cancel", post(reservations::cancel_reservation_handler))
        .route("/api/reservations/:id/restore", post(reservations::restore_reservation_handler))
        .route("/api/reservations/:id/complete", post(reservations::complete_reservation_handler))
        .route("/api/reservations/:id/eligibility", get(reservations::eligibility_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
