use serde::Deserialize;

use crate::indexer::types::RawSwap;

/// Upper bound used for the first page, before any swap has been seen.
pub const CURSOR_SENTINEL: i64 = 9_999_999_999;

/// Build the swaps query for one page: newest first, strictly older than `timestamp_lt`.
pub fn swaps_query(first: u32, timestamp_lt: i64) -> String {
    format!(
        r#"{{
  swaps(first: {first}, orderBy: timestamp, orderDirection: desc, where: {{ timestamp_lt: {timestamp_lt} }}) {{
    amount0
    amount1
    sender
    timestamp
    token0 {{
      symbol
      name
    }}
    token1 {{
      symbol
      name
    }}
    amountUSD
  }}
}}"#
    )
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<SwapsData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct SwapsData {
    swaps: Vec<RawSwap>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Decode a GraphQL response body into the `data.swaps` array.
pub fn parse_swaps_response(body: &str) -> eyre::Result<Vec<RawSwap>> {
    let response: GraphQlResponse = serde_json::from_str(body)
        .map_err(|e| eyre::eyre!("Malformed subgraph response: {}", e))?;

    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(eyre::eyre!("Subgraph returned errors: {}", messages.join("; ")));
    }

    response
        .data
        .map(|d| d.swaps)
        .ok_or_else(|| eyre::eyre!("Subgraph response has no data.swaps field"))
}
