use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::page;
use super::AppState;
use crate::report::types::LoadFilter;
use crate::report::{self, charts, stats, ReportData};

const PDF_FILENAME: &str = "Uniswap_Report.pdf";

type HandlerError = (StatusCode, String);

fn internal_error(e: impl std::fmt::Display) -> HandlerError {
    tracing::error!(error = %e, "Dashboard request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn no_data() -> HandlerError {
    (StatusCode::NOT_FOUND, "No swap data available".to_string())
}

async fn load_complete(state: &AppState) -> Result<ReportData, HandlerError> {
    ReportData::load(&state.pool, &state.storage.table, LoadFilter::Complete)
        .await
        .map_err(internal_error)
}

/// Run a rendering job on the blocking pool; charts and PDFs are CPU-bound.
async fn render_blocking<T, F>(job: F) -> Result<T, HandlerError>
where
    F: FnOnce() -> eyre::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(internal_error)?
        .map_err(internal_error)
}

fn png(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
}

// ============================================================
// Page
// ============================================================

pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, HandlerError> {
    let data = load_complete(&state).await?;
    if data.is_empty() {
        tracing::warn!(table = %state.storage.table, "Dashboard has no swap data to show");
    }
    Ok(Html(page::render_dashboard(&data, state.report.preview_rows)))
}

// ============================================================
// Charts
// ============================================================

pub async fn correlation_chart(State(state): State<Arc<AppState>>) -> Result<Response, HandlerError> {
    let data = load_complete(&state).await?;
    if data.is_empty() {
        return Err(no_data());
    }

    let bytes = render_blocking(move || {
        charts::render_correlation_heatmap(&data.correlation())?.to_png()
    })
    .await?;
    Ok(png(bytes))
}

pub async fn distribution_chart(
    State(state): State<Arc<AppState>>,
) -> Result<Response, HandlerError> {
    let data = load_complete(&state).await?;
    let prices = data.prices();
    let Some(hist) = stats::histogram(&prices, state.report.histogram_bins) else {
        return Err(no_data());
    };

    let bytes = render_blocking(move || {
        let kde = stats::kde_curve(&prices, &hist, report::KDE_POINTS);
        charts::render_price_distribution(&hist, kde.as_deref())?.to_png()
    })
    .await?;
    Ok(png(bytes))
}

// ============================================================
// PDF download
// ============================================================

pub async fn report_pdf(State(state): State<Arc<AppState>>) -> Result<Response, HandlerError> {
    let data = load_complete(&state).await?;
    if data.is_empty() {
        return Err(no_data());
    }

    let config = state.report.clone();
    let bytes = render_blocking(move || {
        let charts = report::render_charts(&data, &config)?;
        report::render_pdf(&data, Some(&charts), &config)
    })
    .await?;

    tracing::info!(bytes = bytes.len(), "Dashboard PDF generated");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", PDF_FILENAME),
            ),
        ],
        bytes,
    )
        .into_response())
}

// ============================================================
// Health
// ============================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub table: String,
    pub generation: Option<i64>,
    pub record_count: i64,
    pub fetched_at: Option<String>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, HandlerError> {
    let snapshot = crate::db::repository::latest_snapshot(&state.pool, &state.storage.table)
        .await
        .map_err(internal_error)?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        table: state.storage.table.clone(),
        generation: snapshot.as_ref().map(|s| s.generation),
        record_count: snapshot.as_ref().map(|s| s.record_count).unwrap_or(0),
        fetched_at: snapshot.map(|s| s.fetched_at.to_rfc3339()),
    }))
}
