use std::sync::Arc;

use amenity_scheduler::{
    clock::SystemClock, config::Config, create_router, db, AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Amenity Scheduler - Starting...");

    let config = Config::from_env().expect("Invalid configuration");
    let clock = Arc::new(SystemClock);

    let state = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(database_url)
                .await
                .expect("Failed to create database pool");
            db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            AppState::postgres(pool, clock, config.utc_offset)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory stores; data is lost on restart");
            AppState::in_memory(clock, config.utc_offset)
        }
    };

    if config.seed_inventory {
        let seeded = state
            .item_repo
            .seed_defaults_if_empty()
            .await
            .expect("Failed to seed inventory");
        if seeded > 0 {
            tracing::info!("Seeded {} default inventory items", seeded);
        }
    }

    // Create the application router
    let app = create_router(state);

    // Start the Axum server
    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Amenity Scheduler is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}
