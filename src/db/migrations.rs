//! Ledger database bootstrap: connection options and schema.

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Bumped whenever `schema.sql` changes shape.
pub const SCHEMA_VERSION: i64 = 1;

/// Open (creating if needed) the ledger database and bring the schema up to date.
///
/// # Errors
/// Returns an error if the database cannot be opened or the schema fails.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).ok();
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    let version = apply_schema(&pool).await?;
    info!(db_path, schema_version = version, "ledger database ready");
    Ok(pool)
}

/// Run every statement of `schema.sql` inside one transaction and stamp
/// `user_version`. Statements are `IF NOT EXISTS`, so reruns change nothing.
async fn apply_schema(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let current: (i64,) = sqlx::query_as("PRAGMA user_version").fetch_one(pool).await?;
    debug!(from = current.0, to = SCHEMA_VERSION, "applying ledger schema");

    let mut tx = pool.begin().await?;
    for statement in include_str!("schema.sql")
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    // PRAGMA does not accept bind parameters.
    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn temp_db() -> (SqlitePool, String, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("nested")
            .join("ledger.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (pool, db_path, temp_dir)
    }

    #[tokio::test]
    async fn test_init_db_creates_file_and_parent_dir() {
        let (pool, db_path, _temp) = temp_db().await;
        assert!(Path::new(&db_path).exists());

        let one: (i64,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(one.0, 1);
    }

    #[tokio::test]
    async fn test_schema_tables_and_version() {
        let (pool, _path, _temp) = temp_db().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(names, vec!["entities", "processed_events"]);

        let version: (i64,) = sqlx::query_as("PRAGMA user_version").fetch_one(&pool).await.unwrap();
        assert_eq!(version.0, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let (pool, db_path, _temp) = temp_db().await;
        sqlx::query("INSERT INTO entities (kind, id, body, updated_at) VALUES ('k', 'a', '{}', 0)")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let reopened = init_db(&db_path).await.unwrap();
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM entities")
            .fetch_one(&reopened)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_connection_pragmas() {
        let (pool, _path, _temp) = temp_db().await;

        let fk: (i64,) = sqlx::query_as("PRAGMA foreign_keys").fetch_one(&pool).await.unwrap();
        assert_eq!(fk.0, 1);

        // WAL can fall back on some filesystems.
        let mode: (String,) = sqlx::query_as("PRAGMA journal_mode").fetch_one(&pool).await.unwrap();
        assert!(matches!(mode.0.as_str(), "wal" | "delete"), "journal_mode {}", mode.0);
    }
}
