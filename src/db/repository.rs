use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};

use crate::indexer::types::SwapRecord;
use crate::report::types::{LoadFilter, SnapshotInfo, StoredSwap};

/// 10 bound columns per row keeps each INSERT well under SQLite's parameter limit.
const INSERT_CHUNK_ROWS: usize = 90;

fn snapshots_table(table: &str) -> String {
    format!("{}_snapshots", table)
}

/// Replace the swap table with `records` and log a new snapshot generation.
///
/// The drop, create, inserts and snapshot row share one transaction: readers
/// see either the previous table or the new one, never a partial mix. Callers
/// must pass a validated identifier as `table`.
pub async fn replace_swaps(
    pool: &SqlitePool,
    table: &str,
    records: &[SwapRecord],
) -> eyre::Result<i64> {
    let mut tx = pool.begin().await?;

    let drop_sql = format!("DROP TABLE IF EXISTS {}", table);
    sqlx::query(&drop_sql).execute(&mut *tx).await?;

    let create_sql = format!(
        "CREATE TABLE {} (
            amount0 TEXT,
            amount1 TEXT,
            sender TEXT,
            timestamp INTEGER,
            amountUSD TEXT,
            token0_name TEXT,
            token0_symbol TEXT,
            token1_name TEXT,
            token1_symbol TEXT,
            price TEXT
        )",
        table
    );
    sqlx::query(&create_sql).execute(&mut *tx).await?;

    for chunk in records.chunks(INSERT_CHUNK_ROWS) {
        let mut query_builder: sqlx::QueryBuilder<Sqlite> = sqlx::QueryBuilder::new(format!(
            "INSERT INTO {} (amount0, amount1, sender, timestamp, amountUSD, \
             token0_name, token0_symbol, token1_name, token1_symbol, price) ",
            table
        ));

        query_builder.push_values(chunk, |mut b, r| {
            b.push_bind(r.amount0.clone())
                .push_bind(r.amount1.clone())
                .push_bind(r.sender.clone())
                .push_bind(r.timestamp)
                .push_bind(r.amount_usd.clone())
                .push_bind(r.token0_name.clone())
                .push_bind(r.token0_symbol.clone())
                .push_bind(r.token1_name.clone())
                .push_bind(r.token1_symbol.clone())
                .push_bind(r.price.clone());
        });

        query_builder.build().execute(&mut *tx).await?;
    }

    let snapshots = snapshots_table(table);
    let create_snapshots_sql = format!(
        "CREATE TABLE IF NOT EXISTS {} (
            generation INTEGER PRIMARY KEY AUTOINCREMENT,
            fetched_at TEXT NOT NULL,
            record_count INTEGER NOT NULL
        )",
        snapshots
    );
    sqlx::query(&create_snapshots_sql).execute(&mut *tx).await?;

    let insert_snapshot_sql = format!(
        "INSERT INTO {} (fetched_at, record_count) VALUES (?, ?)",
        snapshots
    );
    let result = sqlx::query(&insert_snapshot_sql)
        .bind(Utc::now())
        .bind(records.len() as i64)
        .execute(&mut *tx)
        .await?;
    let generation = result.last_insert_rowid();

    tx.commit().await?;

    tracing::info!(table, rows = records.len(), generation, "Swap table replaced");
    Ok(generation)
}

pub async fn table_exists(pool: &SqlitePool, table: &str) -> eyre::Result<bool> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_optional(pool)
            .await?;

    Ok(row.is_some())
}

/// Load swaps in insertion order (newest first, as fetched).
///
/// A missing table reads as an empty dataset. Numeric columns are coerced
/// through text so values written by other tools degrade to `None` instead of
/// failing the load.
pub async fn load_swaps(
    pool: &SqlitePool,
    table: &str,
    filter: LoadFilter,
) -> eyre::Result<Vec<StoredSwap>> {
    if !table_exists(pool, table).await? {
        tracing::debug!(table, "Swap table does not exist yet");
        return Ok(Vec::new());
    }

    let where_clause = match filter {
        LoadFilter::All => "",
        LoadFilter::Complete => {
            " WHERE price IS NOT NULL AND amount0 IS NOT NULL AND amount1 IS NOT NULL"
        }
    };

    let sql = format!(
        "SELECT CAST(timestamp AS INTEGER), COALESCE(sender, ''), \
         COALESCE(token0_symbol, ''), COALESCE(token1_symbol, ''), \
         CAST(amount0 AS TEXT), CAST(amount1 AS TEXT), CAST(price AS TEXT) \
         FROM {}{} ORDER BY rowid",
        table, where_clause
    );

    #[allow(clippy::type_complexity)]
    let rows: Vec<(
        Option<i64>,
        String,
        String,
        String,
        Option<String>,
        Option<String>,
        Option<String>,
    )> = sqlx::query_as(&sql).fetch_all(pool).await?;

    Ok(rows
        .into_iter()
        .map(
            |(timestamp, sender, token0_symbol, token1_symbol, amount0, amount1, price)| {
                StoredSwap {
                    timestamp,
                    sender,
                    token0_symbol,
                    token1_symbol,
                    amount0: coerce_numeric(amount0.as_deref()),
                    amount1: coerce_numeric(amount1.as_deref()),
                    price: coerce_numeric(price.as_deref()),
                }
            },
        )
        .collect())
}

/// The most recent snapshot generation, if the table was ever written by this tool.
pub async fn latest_snapshot(
    pool: &SqlitePool,
    table: &str,
) -> eyre::Result<Option<SnapshotInfo>> {
    let snapshots = snapshots_table(table);
    if !table_exists(pool, &snapshots).await? {
        return Ok(None);
    }

    let sql = format!(
        "SELECT generation, fetched_at, record_count FROM {} ORDER BY generation DESC LIMIT 1",
        snapshots
    );
    let row: Option<(i64, DateTime<Utc>, i64)> =
        sqlx::query_as(&sql).fetch_optional(pool).await?;

    Ok(row.map(|(generation, fetched_at, record_count)| SnapshotInfo {
        generation,
        fetched_at,
        record_count,
    }))
}

fn coerce_numeric(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
