use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_users::events::{
    EventPublisher, PendingEventStore, PgPendingEventStore, RecoveryScheduler, RecoverySweeper, StreamEventPublisher,
    UserEventDispatcher, UserEventStream,
};
use event_stream::{CircuitGuard, StreamDef, StreamProducer};
use migration::Migrator;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    info!(name = %config.app.name, version = %config.app.version, "Starting users API");

    // Initialize database connections concurrently
    let postgres_future = async {
        database::postgres::connect_from_config_with_retry(config.database.clone(), None)
            .await
            .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))
    };

    let redis_future = async {
        database::redis::connect_from_config_with_retry(config.redis.clone(), None)
            .await
            .map_err(|e| eyre::eyre!("Redis connection failed: {}", e))
    };

    let (db, redis) = tokio::try_join!(postgres_future, redis_future)?;

    database::postgres::run_migrations::<Migrator>(&db, config.app.name)
        .await
        .map_err(|e| eyre::eyre!("Migrations failed: {}", e))?;

    // Event publication: live path behind the circuit guard, parked events in Postgres
    let producer = StreamProducer::from_stream_def::<UserEventStream>(redis.clone());
    let publisher: Arc<dyn EventPublisher> = Arc::new(StreamEventPublisher::new(producer));
    let pending: Arc<dyn PendingEventStore> = Arc::new(PgPendingEventStore::new(db.clone()));
    let guard = Arc::new(CircuitGuard::new(
        UserEventStream::STREAM_NAME,
        config.circuit_breaker.clone(),
    ));
    let events = Arc::new(UserEventDispatcher::new(publisher.clone(), pending.clone(), guard));

    let sweeper = Arc::new(RecoverySweeper::new(publisher, pending, config.recovery.clone()));
    let scheduler = RecoveryScheduler::start(sweeper).await?;

    let state = AppState {
        config,
        db,
        redis,
        events,
    };

    // Build router with API routes (pass reference, not ownership!)
    let api_routes = api::routes(&state);

    // create_router adds docs/middleware to our composed routes
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes).await?;

    // - /health: liveness check with app name/version
    // - /ready: database/redis checks plus the publisher's circuit state
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    info!("Starting users API with production-ready shutdown (30s timeout)");

    let server_config = state.config.server.clone();
    let AppState { db, redis, .. } = state;

    create_production_app(
        app,
        &server_config,
        Duration::from_secs(30),
        async move {
            info!("Shutting down: stopping recovery jobs and closing connections");

            if let Err(e) = scheduler.shutdown().await {
                tracing::error!("Error stopping recovery scheduler: {}", e);
            }

            tokio::join!(
                async move {
                    match db.close().await {
                        Ok(_) => info!("PostgreSQL connection closed successfully"),
                        Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
                    }
                },
                async move {
                    // Redis ConnectionManager closes automatically on drop
                    drop(redis);
                    info!("Redis connection closed successfully");
                }
            );
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Users API shutdown complete");
    Ok(())
}
