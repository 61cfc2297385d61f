//! SQLite message cache for the WhatsApp helper.
//!
//! One cache file per device holds every message the session engine has
//! ingested. Writes go through a transaction per batch; reads return the
//! newest messages first.
//!
//! # Example
//!
//! ```no_run
//! use message_cache::{message, Database, MessageRecord};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::open("whatsapp_data/whatsapp_491511234567.sqlite").await?;
//!     db.migrate().await?;
//!
//!     let mut tx = db.begin().await?;
//!     let record = MessageRecord::text("ABC123", "491701111111", "491511234567", "hi", 1_700_000_000);
//!     message::insert_ignore(&mut tx, &record).await?;
//!     tx.commit().await?;
//!
//!     let recent = message::list_recent(db.pool(), 100).await?;
//!     println!("{} cached messages", recent.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod message;
pub mod models;

pub use error::{CacheError, Result};
pub use models::{MessageRecord, MessageSummary};

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Cache connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size. Writers are serialized by the session engine, so a
    /// handful of connections covers concurrent readers.
    const DEFAULT_POOL_SIZE: u32 = 4;

    /// Open (creating if missing) the cache file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = Self::pool_with(options, Self::DEFAULT_POOL_SIZE).await?;
        tracing::info!("Opened message cache: {}", path.as_ref().display());

        Ok(Self { pool })
    }

    /// A private in-memory cache. Uses a single connection so every query
    /// sees the same database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = Self::pool_with(options, 1).await?;
        Ok(Self { pool })
    }

    async fn pool_with(options: SqliteConnectOptions, pool_size: u32) -> Result<SqlitePool> {
        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;
        Ok(pool)
    }

    /// Run migrations. Creates the `messages` table on first use.
    pub async fn migrate(&self) -> Result<()> {
        tracing::debug!("Running cache migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::debug!("Migrations complete");
        Ok(())
    }

    /// Start a transaction. Dropping it without `commit` rolls back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool, waiting for checked-out connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("whatsapp_491511234567.sqlite");

        let db = Database::open(&path).await.unwrap();
        db.migrate().await.unwrap();
        assert!(path.exists());

        // Migrating twice is harmless
        db.migrate().await.unwrap();
        assert_eq!(message::count_messages(db.pool()).await.unwrap(), 0);

        db.close().await;
        assert!(db.pool().is_closed());
    }

    #[tokio::test]
    async fn test_reopen_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");

        {
            let db = Database::open(&path).await.unwrap();
            db.migrate().await.unwrap();
            let mut tx = db.begin().await.unwrap();
            let rec = MessageRecord::text("A", "4915", "4917", "hello", 10);
            message::insert_ignore(&mut tx, &rec).await.unwrap();
            tx.commit().await.unwrap();
            db.close().await;
        }

        let db = Database::open(&path).await.unwrap();
        db.migrate().await.unwrap();
        assert_eq!(message::count_messages(db.pool()).await.unwrap(), 1);
    }
}
