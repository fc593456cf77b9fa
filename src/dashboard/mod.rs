pub mod handlers;
pub mod page;

use std::sync::Arc;

use axum::{routing::get, Router};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::{ReportConfig, StorageConfig};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub storage: StorageConfig,
    pub report: ReportConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/charts/correlation.png", get(handlers::correlation_chart))
        .route(
            "/charts/price_distribution.png",
            get(handlers::distribution_chart),
        )
        .route("/report.pdf", get(handlers::report_pdf))
        .route("/health", get(handlers::health))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

/// Serve the dashboard until `shutdown` is cancelled.
pub async fn serve(
    state: AppState,
    host: &str,
    port: u16,
    shutdown: CancellationToken,
) -> eyre::Result<()> {
    let app = router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre::eyre!("Failed to bind dashboard on {}: {}", addr, e))?;
    tracing::info!(%addr, "Dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Dashboard stopped");
    Ok(())
}
