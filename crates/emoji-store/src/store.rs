//! SQLite persistence for emoji records

use crate::error::{Result, StoreError};
use crate::types::{EmojiRecord, EmojiRow, NewEmojiRecord};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Current on-disk schema version. Bumping it wipes every cached record.
pub const SCHEMA_VERSION: i64 = 2;

/// Rows fetched per round trip while scanning by time
pub const SCAN_PAGE_SIZE: i64 = 128;

const SELECT_COLUMNS: &str = "SELECT id, key, payload, mime_type, created_at, source_url FROM emojis";

/// Durable key-indexed emoji store
#[derive(Debug, Clone)]
pub struct EmojiStore {
    pool: SqlitePool,
    database_url: String,
}

impl EmojiStore {
    /// Open the store at the current schema version, creating or upgrading it
    pub async fn open(database_url: &str) -> Result<Self> {
        Self::open_with_version(database_url, SCHEMA_VERSION).await
    }

    /// Open the store at an explicit schema version
    ///
    /// If the database was last written at a different version, the table is
    /// dropped and recreated empty.
    pub async fn open_with_version(database_url: &str, version: i64) -> Result<Self> {
        let in_memory = database_url.contains(":memory:");
        let mut options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every connection to `sqlite::memory:` is its own database, so keep
        // exactly one alive for the lifetime of the pool.
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        Self::prepare_schema(&pool, version).await?;
        info!(database_url, version, "Emoji store opened");

        Ok(Self {
            pool,
            database_url: database_url.to_string(),
        })
    }

    async fn prepare_schema(pool: &SqlitePool, version: i64) -> Result<()> {
        let mut tx = pool.begin().await?;

        let (current,): (i64,) = sqlx::query_as("PRAGMA user_version")
            .fetch_one(&mut *tx)
            .await?;

        if current != version {
            if current != 0 {
                warn!(
                    from = current,
                    to = version,
                    "Schema version changed, dropping all cached emojis"
                );
            }
            sqlx::query("DROP TABLE IF EXISTS emojis")
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS emojis (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL UNIQUE,
                payload BLOB NOT NULL,
                mime_type TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                source_url TEXT NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS emojis_created_at_idx ON emojis (created_at, id)",
        )
        .execute(&mut *tx)
        .await?;

        // PRAGMA does not accept bound parameters
        sqlx::query(&format!("PRAGMA user_version = {}", version))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// The URL this store was opened with
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Point lookup through the unique key index
    pub async fn get_by_key(&self, key: &str) -> Result<Option<EmojiRecord>> {
        let row = sqlx::query_as::<_, EmojiRow>(&format!("{} WHERE key = ?", SELECT_COLUMNS))
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(EmojiRecord::from))
    }

    /// Append a record, returning its store-assigned id
    ///
    /// Fails with [`StoreError::Constraint`] if the key is already present;
    /// existing records are never overwritten.
    pub async fn insert(&self, record: &NewEmojiRecord) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO emojis (key, payload, mime_type, created_at, source_url)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.key.as_str())
        .bind(record.payload.as_slice())
        .bind(record.mime_type.as_str())
        .bind(record.created_at.timestamp_millis())
        .bind(record.source_url.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = done.last_insert_rowid();
                debug!(key = %record.key, id, size = record.payload.len(), "Inserted emoji");
                Ok(id)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::Constraint(record.key.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a record by id (no-op if absent)
    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM emojis WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Number of stored records
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM emojis")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Lazily stream every record in ascending `created_at` order
    ///
    /// Pages are fetched with keyset pagination on `(created_at, id)`, so no
    /// read cursor stays open between items and callers may delete records
    /// while iterating.
    pub fn scan_by_time(&self) -> BoxStream<'static, Result<EmojiRecord>> {
        let pool = self.pool.clone();

        stream::try_unfold(Some((i64::MIN, i64::MIN)), move |cursor| {
            next_page(pool.clone(), cursor)
        })
        .map_ok(|rows| {
            stream::iter(
                rows.into_iter()
                    .map(|row| Ok::<_, StoreError>(EmojiRecord::from(row))),
            )
        })
        .try_flatten()
        .boxed()
    }

    /// Close the underlying pool
    pub async fn close(&self) {
        self.pool.close().await;
        debug!(database_url = %self.database_url, "Emoji store closed");
    }
}

type PageCursor = Option<(i64, i64)>;

async fn next_page(
    pool: SqlitePool,
    cursor: PageCursor,
) -> Result<Option<(Vec<EmojiRow>, PageCursor)>> {
    let Some(after) = cursor else {
        return Ok(None);
    };
    let rows = fetch_page(&pool, after).await?;
    let next = if rows.len() < SCAN_PAGE_SIZE as usize {
        None
    } else {
        rows.last().map(|row| (row.created_at, row.id))
    };
    Ok(Some((rows, next)))
}

async fn fetch_page(pool: &SqlitePool, after: (i64, i64)) -> Result<Vec<EmojiRow>> {
    let rows = sqlx::query_as::<_, EmojiRow>(&format!(
        "{} WHERE (created_at, id) > (?, ?) ORDER BY created_at, id LIMIT ?",
        SELECT_COLUMNS
    ))
    .bind(after.0)
    .bind(after.1)
    .bind(SCAN_PAGE_SIZE)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
