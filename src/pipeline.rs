use sqlx::SqlitePool;

use crate::config::StorageConfig;
use crate::db::repository;
use crate::export;
use crate::indexer::client::SwapSource;
use crate::indexer::fetcher::{self, FetchOptions};
use crate::indexer::normalize;
use crate::indexer::types::SwapRecord;

/// Result of one fetch → normalize → persist run.
#[derive(Debug, Default)]
pub struct PipelineResult {
    pub fetched: usize,
    pub csv_rows: usize,
    pub generation: i64,
}

/// Orchestrates a full snapshot run:
/// 1. Paginated fetch from the subgraph
/// 2. Normalization into flat records
/// 3. CSV sink
/// 4. SQLite sink (table replace + snapshot generation)
pub struct FetchPipeline {
    pub options: FetchOptions,
    pub storage: StorageConfig,
}

impl FetchPipeline {
    pub fn new(options: FetchOptions, storage: StorageConfig) -> Self {
        Self { options, storage }
    }

    pub async fn run<S: SwapSource>(
        &self,
        source: &S,
        pool: &SqlitePool,
    ) -> eyre::Result<PipelineResult> {
        let raw = fetcher::fetch_swaps(source, &self.options).await?;
        let records = normalize::normalize_swaps(raw);

        if records.is_empty() {
            tracing::warn!("Subgraph returned no swaps; persisting an empty snapshot");
        } else {
            tracing::info!(count = records.len(), "Swaps fetched and normalized");
        }

        self.persist(pool, &records).await
    }

    /// Write `records` to both sinks. The sinks are independent: both are
    /// attempted, and the run fails afterwards if either one did.
    pub async fn persist(
        &self,
        pool: &SqlitePool,
        records: &[SwapRecord],
    ) -> eyre::Result<PipelineResult> {
        let csv_result = export::csv::write_swaps_csv(&self.storage.csv_path, records);
        if let Err(e) = &csv_result {
            tracing::error!(path = %self.storage.csv_path, error = %e, "CSV sink failed");
        }

        let db_result = repository::replace_swaps(pool, &self.storage.table, records).await;
        if let Err(e) = &db_result {
            tracing::error!(table = %self.storage.table, error = %e, "Database sink failed");
        }

        let csv_rows = csv_result?;
        let generation = db_result?;

        Ok(PipelineResult {
            fetched: records.len(),
            csv_rows,
            generation,
        })
    }
}
