//! # SQLite Database methods
//!
//! Low-level SQLite interactions, written as plain functions that accept a `&mut SqliteConnection`. Callers pass a
//! pooled connection, or `&mut *tx` when several calls must share one transaction.
use std::{env, str::FromStr, time::Duration};

use log::*;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

use crate::sqlite::SqliteDatabaseError;

pub mod orders;

pub const SQLITE_DB_URL: &str = "sqlite://data/pix_orders.db";

pub fn db_url() -> String {
    let result = env::var("PGW_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ PGW_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool, creating the database file (and its directory) if it does not exist yet.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    if let Some(parent) = options.clone().get_filename().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("🗃️ Creating database directory {}", parent.display());
            std::fs::create_dir_all(parent)?;
        }
    }
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
