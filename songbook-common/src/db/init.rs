//! Database initialization
//!
//! Opens the SQLite pool and creates the `songs` table if it is missing.
//! There is no migration engine: the schema is created once with
//! `CREATE TABLE IF NOT EXISTS` and never altered at runtime.

use crate::config::DatabaseConfig;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::info;

/// SQLite busy timeout applied to every pooled connection
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize database connection pool and create tables if needed
pub async fn init_database(config: &DatabaseConfig) -> Result<SqlitePool> {
    let newly_created = !config.path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = connect_options(
        SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal),
    );

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", config.path.display());
    } else {
        info!("Opened existing database: {}", config.path.display());
    }

    create_songs_table(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory pool with the songs table created.
///
/// Each SQLite in-memory connection is its own database, so the pool is
/// pinned to one connection that is never recycled.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let options = connect_options("sqlite::memory:".parse::<SqliteConnectOptions>()?);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_songs_table(&pool).await?;

    Ok(pool)
}

/// Per-connection settings shared by file and in-memory pools
fn connect_options(options: SqliteConnectOptions) -> SqliteConnectOptions {
    options
        .busy_timeout(BUSY_TIMEOUT)
        // LIKE is case-insensitive by default; `ilike` filters lower-case
        // both operands explicitly instead.
        .pragma("case_sensitive_like", "ON")
}

/// Create the songs table
///
/// Name and artist must contain something other than whitespace.
/// `release_date` is ISO `YYYY-MM-DD` text so that ORDER BY and range
/// filters compare chronologically.
pub async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id TEXT PRIMARY KEY NOT NULL,
            song_name TEXT NOT NULL,
            artist_name TEXT NOT NULL,
            release_date TEXT,
            song_text TEXT,
            link TEXT,
            CHECK (length(trim(song_name, char(32, 9, 10, 13))) > 0),
            CHECK (length(trim(artist_name, char(32, 9, 10, 13))) > 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_name_artist ON songs(song_name, artist_name)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[tokio::test]
    async fn test_init_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("nested").join("songbook.db"),
            max_connections: 2,
            acquire_timeout: Duration::from_secs(1),
            query_timeout: Duration::from_secs(1),
        };

        let pool = init_database(&config).await.expect("database should open");
        assert!(config.path.exists());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);

        // Second open is idempotent
        pool.close().await;
        init_database(&config).await.expect("reopen should succeed");
    }

    #[tokio::test]
    async fn test_empty_name_violates_check() {
        let pool = init_memory_database().await.unwrap();

        let err: Error = sqlx::query("INSERT INTO songs (id, song_name, artist_name) VALUES ('a', '', 'Muse')")
            .execute(&pool)
            .await
            .unwrap_err()
            .into();

        assert!(matches!(err, Error::ConstraintViolation(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_blank_artist_violates_check() {
        let pool = init_memory_database().await.unwrap();

        let err: Error = sqlx::query("INSERT INTO songs (id, song_name, artist_name) VALUES ('a', 'Numb', ?)")
            .bind(" \t\n ")
            .execute(&pool)
            .await
            .unwrap_err()
            .into();

        assert!(matches!(err, Error::ConstraintViolation(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_like_is_case_sensitive() {
        let pool = init_memory_database().await.unwrap();

        let matched: i64 = sqlx::query_scalar("SELECT 'Muse' LIKE 'muse'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(matched, 0);
    }
}
