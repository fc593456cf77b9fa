pub mod charts;
pub mod pdf;
pub mod stats;
pub mod table;
pub mod types;

use std::path::PathBuf;

use sqlx::SqlitePool;

use crate::config::{ReportConfig, StorageConfig};
use crate::db::repository;
use charts::RenderedChart;
use stats::{CorrelationMatrix, DescribeTable, Histogram};
use table::PreviewRow;
use types::{LoadFilter, SnapshotInfo, StoredSwap};

/// Number of points sampled along the density curve.
pub const KDE_POINTS: usize = 200;

/// Persisted swaps plus the snapshot they came from; the input of every report.
#[derive(Debug, Clone)]
pub struct ReportData {
    pub swaps: Vec<StoredSwap>,
    pub snapshot: Option<SnapshotInfo>,
}

impl ReportData {
    pub async fn load(pool: &SqlitePool, table: &str, filter: LoadFilter) -> eyre::Result<Self> {
        let swaps = repository::load_swaps(pool, table, filter).await?;
        let snapshot = repository::latest_snapshot(pool, table).await?;
        tracing::debug!(table, rows = swaps.len(), ?filter, "Report data loaded");
        Ok(Self { swaps, snapshot })
    }

    pub fn is_empty(&self) -> bool {
        self.swaps.is_empty()
    }

    pub fn preview(&self, limit: usize) -> Vec<PreviewRow> {
        table::preview_rows(&self.swaps, limit)
    }

    pub fn correlation(&self) -> CorrelationMatrix {
        stats::correlation_matrix(&[
            ("amount0", self.swaps.iter().map(|s| s.amount0).collect()),
            ("amount1", self.swaps.iter().map(|s| s.amount1).collect()),
            ("price", self.swaps.iter().map(|s| s.price).collect()),
        ])
    }

    pub fn prices(&self) -> Vec<f64> {
        self.swaps.iter().filter_map(|s| s.price).collect()
    }

    pub fn price_histogram(&self, bins: usize) -> Option<Histogram> {
        stats::histogram(&self.prices(), bins)
    }

    pub fn describe(&self) -> DescribeTable {
        DescribeTable {
            numeric: vec![
                (
                    "timestamp".to_string(),
                    stats::describe_numeric(self.swaps.iter().map(|s| s.timestamp.map(|t| t as f64))),
                ),
                (
                    "amount0".to_string(),
                    stats::describe_numeric(self.swaps.iter().map(|s| s.amount0)),
                ),
                (
                    "amount1".to_string(),
                    stats::describe_numeric(self.swaps.iter().map(|s| s.amount1)),
                ),
                (
                    "price".to_string(),
                    stats::describe_numeric(self.swaps.iter().map(|s| s.price)),
                ),
            ],
            text: vec![
                (
                    "sender".to_string(),
                    stats::describe_text(self.swaps.iter().map(|s| s.sender.as_str())),
                ),
                (
                    "token0_symbol".to_string(),
                    stats::describe_text(self.swaps.iter().map(|s| s.token0_symbol.as_str())),
                ),
                (
                    "token1_symbol".to_string(),
                    stats::describe_text(self.swaps.iter().map(|s| s.token1_symbol.as_str())),
                ),
            ],
        }
    }
}

/// The two report charts. The distribution chart is absent when no row has a price.
pub struct ReportCharts {
    pub correlation: RenderedChart,
    pub distribution: Option<RenderedChart>,
}

pub fn render_charts(data: &ReportData, config: &ReportConfig) -> eyre::Result<ReportCharts> {
    let correlation = charts::render_correlation_heatmap(&data.correlation())?;

    let prices = data.prices();
    let distribution = match stats::histogram(&prices, config.histogram_bins) {
        Some(hist) => {
            let kde = stats::kde_curve(&prices, &hist, KDE_POINTS);
            Some(charts::render_price_distribution(&hist, kde.as_deref())?)
        }
        None => {
            tracing::warn!("No prices available, skipping price distribution chart");
            None
        }
    };

    Ok(ReportCharts {
        correlation,
        distribution,
    })
}

/// Render the full PDF for `data`, charts included when given.
pub fn render_pdf(
    data: &ReportData,
    charts: Option<&ReportCharts>,
    config: &ReportConfig,
) -> eyre::Result<Vec<u8>> {
    let rows = data.preview(config.preview_rows);
    pdf::build_report_pdf(&pdf::PdfReport {
        total_swaps: data.swaps.len(),
        rows: &rows,
        correlation: charts.map(|c| &c.correlation),
        distribution: charts.and_then(|c| c.distribution.as_ref()),
    })
}

/// What a static report run produced.
#[derive(Debug)]
pub enum ReportOutcome {
    /// Nothing persisted yet; no files were written.
    Empty,
    Written {
        swaps: usize,
        pdf_path: PathBuf,
        chart_paths: Vec<PathBuf>,
    },
}

/// Offline report over every persisted row: statistics on stdout, chart PNGs,
/// and the landscape PDF.
pub async fn run_static_report(
    pool: &SqlitePool,
    storage: &StorageConfig,
    config: &ReportConfig,
) -> eyre::Result<ReportOutcome> {
    let data = ReportData::load(pool, &storage.table, LoadFilter::All).await?;

    if data.is_empty() {
        tracing::warn!(
            table = %storage.table,
            "No swap data found; run the fetch command first"
        );
        return Ok(ReportOutcome::Empty);
    }

    if let Some(snapshot) = &data.snapshot {
        tracing::info!(
            generation = snapshot.generation,
            fetched_at = %snapshot.fetched_at,
            "Reporting on swap snapshot"
        );
    }

    println!("Swap statistics ({} rows):", data.swaps.len());
    println!("{}", data.describe());

    let charts = render_charts(&data, config)?;

    let mut chart_paths = Vec::new();
    charts.correlation.save_png(&config.correlation_chart_path)?;
    chart_paths.push(PathBuf::from(&config.correlation_chart_path));
    if let Some(distribution) = &charts.distribution {
        distribution.save_png(&config.distribution_chart_path)?;
        chart_paths.push(PathBuf::from(&config.distribution_chart_path));
    }

    let bytes = render_pdf(&data, Some(&charts), config)?;
    std::fs::write(&config.pdf_path, bytes)
        .map_err(|e| eyre::eyre!("Failed to write PDF '{}': {}", config.pdf_path, e))?;
    tracing::info!(path = %config.pdf_path, swaps = data.swaps.len(), "PDF report written");

    Ok(ReportOutcome::Written {
        swaps: data.swaps.len(),
        pdf_path: PathBuf::from(&config.pdf_path),
        chart_paths,
    })
}
