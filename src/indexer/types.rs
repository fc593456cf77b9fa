use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Token metadata nested inside a subgraph swap entity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenRef {
    pub symbol: String,
    pub name: String,
}

/// A swap exactly as the subgraph returns it.
///
/// Numeric fields are kept as raw JSON values: the subgraph serializes
/// `BigDecimal` as strings, but nulls and odd values must survive decoding so
/// the normalizer can treat them as missing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSwap {
    #[serde(default)]
    pub amount0: Option<JsonValue>,
    #[serde(default)]
    pub amount1: Option<JsonValue>,
    pub sender: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: i64,
    pub token0: TokenRef,
    pub token1: TokenRef,
    #[serde(rename = "amountUSD", default)]
    pub amount_usd: Option<JsonValue>,
}

/// A flattened swap, ready for the CSV file and the SQLite table.
///
/// Field order is the column order of both outputs. Amounts keep the
/// subgraph's decimal text so both sinks store every digit; reports parse
/// them on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRecord {
    pub amount0: Option<String>,
    pub amount1: Option<String>,
    pub sender: String,
    pub timestamp: i64,
    #[serde(rename = "amountUSD")]
    pub amount_usd: Option<String>,
    pub token0_name: String,
    pub token0_symbol: String,
    pub token1_name: String,
    pub token1_symbol: String,
    pub price: Option<String>,
}

impl SwapRecord {
    pub const COLUMNS: [&'static str; 10] = [
        "amount0",
        "amount1",
        "sender",
        "timestamp",
        "amountUSD",
        "token0_name",
        "token0_symbol",
        "token1_name",
        "token1_symbol",
        "price",
    ];
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrInt {
    Int(i64),
    Str(String),
}

/// Subgraph `BigInt` timestamps arrive as strings; plain integers are accepted too.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::Int(v) => Ok(v),
        StringOrInt::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{}': {}", s, e))),
    }
}
