//! Jokes API
//!
//! Serves the joke list on `/api/jokes` behind Auth0 bearer authentication.

use joke_service::config::Config;
use joke_service::observability::metrics::init_metrics_recorder;
use joke_service::routes::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "joke_service=info,jokes=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Jokes API");

    let config = Config::from_env().map_err(|e| {
        error!(error = %e, "Configuration rejected");
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        issuer = %config.issuer,
        jwks_cache_ttl_seconds = config.jwks_cache_ttl.as_secs(),
        jwt_clock_skew_seconds = config.jwt_clock_skew_seconds,
        "Configuration loaded"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Metrics recorder unavailable");
        e
    })?;

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!(error = %e, "BIND_ADDRESS is not a socket address");
        e
    })?;
    let drain = Duration::from_secs(config.drain_seconds);

    let state = Arc::new(AppState::new(config));
    let app = routes::build_routes(state, metrics_handle);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!(%addr, error = %e, "Cannot bind listener");
        e
    })?;

    info!(%addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(drain))
    .await?;

    info!("Stopped");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM, after the configured drain delay.
async fn shutdown_signal(drain: Duration) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("SIGINT received"),
            Err(e) => error!(error = %e, "Cannot watch SIGINT"),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("SIGTERM received");
            }
            Err(e) => {
                error!(error = %e, "Cannot watch SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    if !drain.is_zero() {
        warn!(drain_seconds = drain.as_secs(), "Delaying shutdown");
        tokio::time::sleep(drain).await;
    }
    info!("Shutting down");
}
