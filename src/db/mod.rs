pub mod repository;

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::config::DatabaseConfig;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    task TEXT    NOT NULL CHECK (length(trim(task)) > 0),
    done BOOLEAN NOT NULL DEFAULT 0
)
"#;

pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(options)
        .await
}

/// Creates the `todos` table if it is missing.
pub async fn ensure_schema(db: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(SCHEMA).execute(db).await?;
    info!("todos table ready");
    Ok(())
}

/// Round-trips `SELECT 1` on a pooled connection.
pub async fn ping(db: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut conn = db.acquire().await?;
    sqlx::query("SELECT 1").fetch_one(&mut *conn).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test db");

    ensure_schema(&pool).await.expect("Failed to create schema");

    pool
}
