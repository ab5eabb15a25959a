//! EventDesk HTTP server.
//!
//! ```bash
//! cp .env.example .env   # DATABASE_URL, SMTP_*, ORGANIZER_TOKENS, ...
//! cargo run --bin eventdesk
//! ```

use anyhow::Context;
use axum::{routing::get, Router};
use eventdesk_runtime::metrics::MetricsServer;
use eventdesk_server::{build_state, Config};
use eventdesk_web::{cors_layer, router};
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,eventdesk=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    tracing::info!(
        event = %config.mail.event_name,
        assets_dir = %config.assets_dir.display(),
        "Configuration loaded"
    );

    let mut metrics = MetricsServer::new(config.server.metrics_addr()?);
    metrics.start()?;
    spawn_metrics_endpoint(metrics).await?;

    let state = build_state(&config).await?;
    let app = router(state.clone()).layer(cors_layer(&config.server.cors_origins));

    let addr = config.server.addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "EventDesk listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Draining stores");
    let timeout = config.server.shutdown_timeout;
    if let Err(error) = state.selection.shutdown(timeout).await {
        tracing::warn!(error = %error, "Selection store did not drain");
    }
    if let Err(error) = state.attendance.shutdown(timeout).await {
        tracing::warn!(error = %error, "Attendance store did not drain");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Serve `GET /metrics` on the metrics address.
async fn spawn_metrics_endpoint(metrics: MetricsServer) -> anyhow::Result<()> {
    let addr = metrics.addr();
    let metrics = Arc::new(metrics);

    let app = Router::new().route(
        "/metrics",
        get(move || {
            let metrics = Arc::clone(&metrics);
            async move { metrics.render().unwrap_or_default() }
        }),
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind metrics endpoint {addr}"))?;
    tracing::info!(%addr, "Metrics endpoint listening");

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, app).await {
            tracing::error!(error = %error, "Metrics endpoint stopped");
        }
    });

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(error = %error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(error) => {
                tracing::error!(error = %error, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
