use chrono::{DateTime, Utc};

/// A swap row as read back for reporting. Numeric columns are coerced on load,
/// so anything unparseable is already `None` here.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSwap {
    pub timestamp: Option<i64>,
    pub sender: String,
    pub token0_symbol: String,
    pub token1_symbol: String,
    pub amount0: Option<f64>,
    pub amount1: Option<f64>,
    pub price: Option<f64>,
}

/// Which persisted rows a report reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFilter {
    /// Every row.
    All,
    /// Only rows where `price`, `amount0` and `amount1` are all present.
    Complete,
}

/// One generation of the replace-on-write swap table.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotInfo {
    pub generation: i64,
    pub fetched_at: DateTime<Utc>,
    pub record_count: i64,
}
