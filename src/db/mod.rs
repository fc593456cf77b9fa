pub mod repository;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Open (creating if needed) the SQLite database at `database_url`.
///
/// The tool never issues concurrent statements, so one connection is enough.
pub async fn connect(database_url: &str) -> eyre::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| eyre::eyre!("Invalid database URL '{}': {}", database_url, e))?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| eyre::eyre!("Failed to open database '{}': {}", database_url, e))
}
