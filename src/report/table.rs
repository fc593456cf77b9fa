use chrono::DateTime;

use crate::report::types::StoredSwap;

/// Marker shown in place of a missing value.
pub const NOT_AVAILABLE: &str = "N/A";

pub const TABLE_HEADERS: [&str; 7] = [
    "Timestamp", "Sender", "Token0", "Token1", "Amount0", "Amount1", "Price",
];

/// One display row of the top-N table, every cell already formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRow {
    pub timestamp: String,
    pub sender: String,
    pub token0: String,
    pub token1: String,
    pub amount0: String,
    pub amount1: String,
    pub price: String,
}

impl PreviewRow {
    pub fn cells(&self) -> [&str; 7] {
        [
            &self.timestamp,
            &self.sender,
            &self.token0,
            &self.token1,
            &self.amount0,
            &self.amount1,
            &self.price,
        ]
    }
}

impl From<&StoredSwap> for PreviewRow {
    fn from(swap: &StoredSwap) -> Self {
        Self {
            timestamp: format_timestamp(swap.timestamp),
            sender: swap.sender.clone(),
            token0: swap.token0_symbol.clone(),
            token1: swap.token1_symbol.clone(),
            amount0: format_amount(swap.amount0),
            amount1: format_amount(swap.amount1),
            price: format_price(swap.price),
        }
    }
}

/// The first `limit` swaps, formatted for display.
pub fn preview_rows(swaps: &[StoredSwap], limit: usize) -> Vec<PreviewRow> {
    swaps.iter().take(limit).map(PreviewRow::from).collect()
}

pub fn format_timestamp(timestamp: Option<i64>) -> String {
    timestamp
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn format_amount(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn format_price(value: Option<f64>) -> String {
    value
        .map(|v| format!("${:.2}", v))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Shorten an address to `0x1234...abcd` when it exceeds `max_chars`.
pub fn abbreviate(text: &str, max_chars: usize) -> String {
    let len = text.chars().count();
    if len <= max_chars || max_chars < 8 {
        return text.to_string();
    }
    let keep = (max_chars - 3) / 2;
    let head: String = text.chars().take(keep).collect();
    let tail: String = text.chars().skip(len - keep).collect();
    format!("{}...{}", head, tail)
}
