//! Booktoshare Server
//!
//! Personal library and book sharing web service.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use booktoshare_server::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::{catalog::GoogleBooksClient, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let _log_guard = init_logging(&config.logging);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Booktoshare startup");

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

    let catalog = GoogleBooksClient::new(&config.catalog).context("Failed to create catalog client")?;
    let services = Services::new(Repository::new(pool), &config, Arc::new(catalog));

    services
        .auth
        .purge_expired_sessions()
        .await
        .context("Failed to purge expired sessions")?;

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };
    let app = api::router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Console output (pretty or JSON) plus an optional daily rolling file.
/// The returned guard flushes the file writer when dropped.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("booktoshare_server={},tower_http=debug", logging.level).into()
    });

    let json = logging.format.eq_ignore_ascii_case("json");
    let pretty_layer = (!json).then(|| fmt::layer());
    let json_layer = json.then(|| fmt::layer().json());

    let (file_layer, guard) = match &logging.directory {
        Some(dir) => {
            if let Err(e) = std::fs::create_dir_all(dir) {
                eprintln!("Warning: Failed to create log directory {:?}: {}", dir, e);
            }
            let appender = tracing_appender::rolling::daily(dir, "booktoshare.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty_layer)
        .with(json_layer)
        .with(file_layer)
        .init();

    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
