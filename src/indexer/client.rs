use std::future::Future;
use std::time::Duration;

use crate::config::SubgraphConfig;
use crate::indexer::query;
use crate::indexer::types::RawSwap;

/// One page of swaps, newest first, strictly older than `timestamp_lt`.
pub trait SwapSource {
    fn fetch_page(
        &self,
        first: u32,
        timestamp_lt: i64,
    ) -> impl Future<Output = eyre::Result<Vec<RawSwap>>> + Send;
}

/// GraphQL-over-HTTP transport for a swaps subgraph.
pub struct SubgraphClient {
    http: reqwest::Client,
    endpoint: String,
}

impl SubgraphClient {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> eyre::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| eyre::eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &SubgraphConfig) -> eyre::Result<Self> {
        let endpoint = config.resolve_endpoint()?;
        Self::new(endpoint, config.request_timeout_secs.map(Duration::from_secs))
    }
}

impl SwapSource for SubgraphClient {
    async fn fetch_page(&self, first: u32, timestamp_lt: i64) -> eyre::Result<Vec<RawSwap>> {
        let body = serde_json::json!({ "query": query::swaps_query(first, timestamp_lt) });

        // The endpoint URL carries the API key, so it is stripped from transport errors.
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| eyre::eyre!("Subgraph request failed: {}", e.without_url()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| eyre::eyre!("Failed to read subgraph response: {}", e.without_url()))?;

        if !status.is_success() {
            return Err(eyre::eyre!(
                "Subgraph returned HTTP {}: {}",
                status,
                truncate(&text, 500)
            ));
        }

        query::parse_swaps_response(&text)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head)
}
