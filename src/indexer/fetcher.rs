use std::time::Duration;

use crate::config::SubgraphConfig;
use crate::indexer::client::SwapSource;
use crate::indexer::query::CURSOR_SENTINEL;
use crate::indexer::types::RawSwap;

/// Pagination settings for one fetch run.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub batch_size: u32,
    pub max_records: usize,
    pub request_delay: Duration,
}

impl From<&SubgraphConfig> for FetchOptions {
    fn from(config: &SubgraphConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            max_records: config.max_records,
            request_delay: Duration::from_millis(config.request_delay_ms),
        }
    }
}

/// Walk the subgraph backwards in time until `max_records` swaps are collected
/// or upstream runs dry.
///
/// Each page asks for swaps strictly older than the oldest swap of the
/// previous page, so pages never overlap. Any upstream failure aborts the whole
/// run; there is no retry and no checkpoint.
pub async fn fetch_swaps<S: SwapSource>(
    source: &S,
    options: &FetchOptions,
) -> eyre::Result<Vec<RawSwap>> {
    let mut all_swaps: Vec<RawSwap> = Vec::new();
    let mut cursor = CURSOR_SENTINEL;
    let mut batch: u32 = 0;

    while all_swaps.len() < options.max_records {
        if batch > 0 && !options.request_delay.is_zero() {
            tokio::time::sleep(options.request_delay).await;
        }

        let remaining = options.max_records - all_swaps.len();
        let first = remaining.min(options.batch_size as usize) as u32;
        batch += 1;

        tracing::debug!(batch, first, cursor, "Requesting swap page");

        let mut swaps = match source.fetch_page(first, cursor).await {
            Ok(swaps) => swaps,
            Err(e) => {
                tracing::error!(
                    batch,
                    fetched = all_swaps.len(),
                    cursor,
                    error = %e,
                    "Subgraph request failed, aborting fetch run"
                );
                return Err(e);
            }
        };

        if swaps.is_empty() {
            tracing::info!(batch, fetched = all_swaps.len(), "No more swaps upstream");
            break;
        }

        let received = swaps.len();
        swaps.retain(|s| s.timestamp < cursor);
        if swaps.len() < received {
            tracing::warn!(
                batch,
                cursor,
                dropped = received - swaps.len(),
                "Upstream returned swaps at or above the cursor, dropping them"
            );
        }

        let Some(next_cursor) = swaps.iter().map(|s| s.timestamp).min() else {
            tracing::warn!(batch, cursor, "Cursor did not advance, stopping fetch run");
            break;
        };

        let at_boundary = swaps.iter().filter(|s| s.timestamp == next_cursor).count();
        if received >= first as usize && at_boundary > 1 {
            tracing::warn!(
                batch,
                boundary_timestamp = next_cursor,
                swaps_at_boundary = at_boundary,
                "Full page ends on a shared timestamp; later swaps at this timestamp will be skipped"
            );
        }

        let take = swaps.len().min(options.max_records - all_swaps.len());
        all_swaps.extend(swaps.into_iter().take(take));
        cursor = next_cursor;

        tracing::info!(
            batch,
            fetched = all_swaps.len(),
            max_records = options.max_records,
            cursor,
            "Fetched swap batch"
        );
    }

    Ok(all_swaps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::types::TokenRef;
    use std::sync::Mutex;

    /// Serves swaps from an in-memory, newest-first list and records every request.
    struct ScriptedSource {
        timestamps: Vec<i64>,
        requests: Mutex<Vec<(u32, i64)>>,
        fail_on_request: Option<usize>,
    }

    impl ScriptedSource {
        fn new(mut timestamps: Vec<i64>) -> Self {
            timestamps.sort_unstable_by(|a, b| b.cmp(a));
            Self {
                timestamps,
                requests: Mutex::new(Vec::new()),
                fail_on_request: None,
            }
        }

        fn requests(&self) -> Vec<(u32, i64)> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl SwapSource for ScriptedSource {
        async fn fetch_page(&self, first: u32, timestamp_lt: i64) -> eyre::Result<Vec<RawSwap>> {
            let request_no = {
                let mut requests = self.requests.lock().unwrap();
                requests.push((first, timestamp_lt));
                requests.len()
            };
            if self.fail_on_request == Some(request_no) {
                return Err(eyre::eyre!("Subgraph returned HTTP 502 Bad Gateway"));
            }
            Ok(self
                .timestamps
                .iter()
                .filter(|ts| **ts < timestamp_lt)
                .take(first as usize)
                .map(|ts| swap_at(*ts))
                .collect())
        }
    }

    fn swap_at(timestamp: i64) -> RawSwap {
        RawSwap {
            amount0: Some(serde_json::json!("1.0")),
            amount1: Some(serde_json::json!("-1.0")),
            sender: format!("0x{:040x}", timestamp),
            timestamp,
            token0: TokenRef {
                symbol: "WETH".to_string(),
                name: "Wrapped Ether".to_string(),
            },
            token1: TokenRef {
                symbol: "USDC".to_string(),
                name: "USD Coin".to_string(),
            },
            amount_usd: Some(serde_json::json!("10.0")),
        }
    }

    fn options(batch_size: u32, max_records: usize) -> FetchOptions {
        FetchOptions {
            batch_size,
            max_records,
            request_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_never_exceeds_cap() {
        let source = ScriptedSource::new((1..=1000).collect());
        let swaps = fetch_swaps(&source, &options(100, 250)).await.unwrap();
        assert_eq!(swaps.len(), 250);

        // Last page is shrunk to the remaining budget.
        let requests = source.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].0, 50);
    }

    #[tokio::test]
    async fn test_cursor_is_min_timestamp_of_previous_batch() {
        let source = ScriptedSource::new((1..=25).map(|i| i * 10).collect());
        let swaps = fetch_swaps(&source, &options(10, 1000)).await.unwrap();
        assert_eq!(swaps.len(), 25);

        let requests = source.requests();
        assert_eq!(requests[0].1, CURSOR_SENTINEL);
        // Page 1 is 250..=160, page 2 is 150..=60, page 3 is 50..=10.
        assert_eq!(requests[1].1, 160);
        assert_eq!(requests[2].1, 60);
        assert_eq!(requests[3].1, 10);
        assert_eq!(requests.len(), 4);
    }

    #[tokio::test]
    async fn test_full_batch_does_not_refetch_boundary() {
        let source = ScriptedSource::new((1..=20).collect());
        let swaps = fetch_swaps(&source, &options(10, 1000)).await.unwrap();

        let requests = source.requests();
        assert_eq!(requests[1], (10, 11));
        assert!(swaps[10..].iter().all(|s| s.timestamp < 11));

        // Descending and non-overlapping.
        assert!(swaps.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
    }

    #[tokio::test]
    async fn test_empty_first_page_is_normal_completion() {
        let source = ScriptedSource::new(vec![]);
        let swaps = fetch_swaps(&source, &options(100, 1000)).await.unwrap();
        assert!(swaps.is_empty());
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_upstream_error_aborts_run() {
        let mut source = ScriptedSource::new((1..=1000).collect());
        source.fail_on_request = Some(2);
        let result = fetch_swaps(&source, &options(100, 1000)).await;
        assert!(result.is_err());
        assert_eq!(source.requests().len(), 2);
    }

    /// Ignores the cursor and always returns the same page.
    struct StuckSource;

    impl SwapSource for StuckSource {
        async fn fetch_page(&self, _first: u32, _timestamp_lt: i64) -> eyre::Result<Vec<RawSwap>> {
            Ok(vec![swap_at(50), swap_at(40)])
        }
    }

    #[tokio::test]
    async fn test_stuck_upstream_does_not_loop_or_duplicate() {
        let swaps = fetch_swaps(&StuckSource, &options(2, 1000)).await.unwrap();
        let timestamps: Vec<i64> = swaps.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![50, 40]);
    }
}
