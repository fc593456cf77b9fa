use serde_json::Value as JsonValue;

use crate::indexer::types::{RawSwap, SwapRecord};

/// Flatten a raw swap: token objects become four scalar columns and the USD
/// notional is mirrored into `price`.
pub fn normalize_swap(raw: RawSwap) -> SwapRecord {
    let amount_usd = decimal_text(raw.amount_usd.as_ref());

    SwapRecord {
        amount0: decimal_text(raw.amount0.as_ref()),
        amount1: decimal_text(raw.amount1.as_ref()),
        sender: raw.sender,
        timestamp: raw.timestamp,
        price: amount_usd.clone(),
        amount_usd,
        token0_name: raw.token0.name,
        token0_symbol: raw.token0.symbol,
        token1_name: raw.token1.name,
        token1_symbol: raw.token1.symbol,
    }
}

pub fn normalize_swaps(raw: Vec<RawSwap>) -> Vec<SwapRecord> {
    raw.into_iter().map(normalize_swap).collect()
}

/// Keep a subgraph numeric field as its decimal text. Absent, null,
/// non-numeric and non-finite values all become `None`; anything else is
/// passed through digit for digit.
pub fn decimal_text(value: Option<&JsonValue>) -> Option<String> {
    let text = match value? {
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.trim().to_string(),
        _ => return None,
    };
    text.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(text)
}
