//! roundtable server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints and the
//! periodic tick driver.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use roundtable::app_state::AppState;
use roundtable::build_app;
use roundtable::config::{LogFormat, SchedulerConfig};
use roundtable::domain::NotificationBus;
use roundtable::persistence::{InMemoryStore, PostgresStore, SchedulerStore};
use roundtable::service::SchedulerService;
use roundtable::service::demo::seed_demo;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = SchedulerConfig::from_env()?;

    // Initialize tracing
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting roundtable");

    // Build persistence layer
    let store: Arc<dyn SchedulerStore> = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        let store = PostgresStore::new(pool);
        store.migrate().await?;
        tracing::info!("using PostgreSQL store");
        Arc::new(store)
    } else {
        tracing::info!("using in-memory store");
        Arc::new(InMemoryStore::new())
    };

    // Build service layer
    let notification_bus = NotificationBus::new(config.notification_bus_capacity);
    let scheduler = Arc::new(SchedulerService::new(
        store,
        notification_bus,
        config.seating_seed,
    ));
    if config.demo_seed {
        seed_demo(&scheduler).await?;
    }

    // Build application state and start ticking
    let app_state = AppState::new(scheduler, config.tick_interval());
    let driver = Arc::clone(&app_state.driver);
    driver.start().await;

    let app = build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;

    driver.stop().await;
    Ok(())
}
