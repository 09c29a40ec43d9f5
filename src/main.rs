//! Bibliotheca Server - Library Management System
//!
//! A Rust REST API server for library lending.

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bibliotheca::{
    api,
    config::{AppConfig, LoggingConfig},
    jobs::OverdueSweep,
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Held until exit so buffered file logs get flushed
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting Bibliotheca Server v{}", env!("CARGO_PKG_VERSION"));

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let repository = Repository::new(pool);
    let services = Services::new(repository.clone(), &config);

    if let Some(admin) = services
        .users
        .ensure_admin(config.auth.bootstrap_admin.as_ref())
        .await
        .context("Failed to create bootstrap administrator")?
    {
        tracing::warn!(username = %admin.username, "Created bootstrap administrator, change its password");
    }

    let (stop_sweep, sweep_shutdown) = oneshot::channel();
    let sweep = if config.jobs.overdue_sweep_enabled {
        let period = Duration::from_secs(config.jobs.overdue_interval_hours.max(1) * 3600);
        let handle = OverdueSweep::new(
            repository,
            services.transactions.clone(),
            services.notifications.clone(),
        )
        .spawn(period, sweep_shutdown);
        tracing::info!(interval_hours = config.jobs.overdue_interval_hours, "Overdue sweep scheduled");
        Some(handle)
    } else {
        None
    };

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };
    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweep {
        let _ = stop_sweep.send(());
        if let Err(e) = handle.await {
            tracing::error!("Overdue sweep task panicked: {}", e);
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

/// Stdout logging (pretty or JSON) plus an optional daily rolling file
fn init_tracing(logging: &LoggingConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bibliotheca={},tower_http=debug", logging.level).into());

    let (file_writer, guard) = match logging.directory {
        Some(ref directory) => {
            let appender = tracing_appender::rolling::daily(directory, "bibliotheca.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let json = logging.format.eq_ignore_ascii_case("json");

    tracing_subscriber::registry()
        .with(filter)
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
        }))
        .init();

    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
