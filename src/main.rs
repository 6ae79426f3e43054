mod api;
mod config;
mod error;
mod lifecycle;
mod matching;
mod models;
mod notify;
mod observability;
mod oracle;
mod pricing;
mod state;
mod store;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::notify::{DispatchNotifier, LogNotifier, WebhookNotifier};
use crate::oracle::{DistanceOracle, HaversineOracle, OsrmOracle};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let locations = config.load_locations()?;
    tracing::info!(
        villages = locations.village_count(),
        file = %config.locations_file,
        "location graph loaded"
    );

    let oracle: Arc<dyn DistanceOracle> = match &config.oracle_url {
        Some(url) => Arc::new(
            OsrmOracle::new(url.clone(), config.oracle_timeout())
                .map_err(|err| error::AppError::Internal(format!("oracle client: {err}")))?,
        ),
        None => {
            tracing::warn!("ORACLE_URL not set; using straight-line distance estimates");
            Arc::new(HaversineOracle)
        }
    };

    let notifier: Arc<dyn DispatchNotifier> = match &config.notify_webhook_url {
        Some(url) => Arc::new(
            WebhookNotifier::new(url.clone(), config.oracle_timeout())
                .map_err(|err| error::AppError::Internal(format!("notify client: {err}")))?,
        ),
        None => Arc::new(LogNotifier),
    };

    let app_state = state::AppState::new(
        config.event_buffer_size,
        locations,
        config.pricing.clone(),
        config.pharmacy_base,
        oracle,
        notifier,
    );
    let shared_state = Arc::new(app_state);

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| error::AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| error::AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
