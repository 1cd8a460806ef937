//! Store record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted emoji asset
///
/// Records are immutable once written; the only mutation the store offers is
/// deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmojiRecord {
    /// Store-assigned surrogate id, never reused
    pub id: i64,
    /// Logical key, unique across live records
    pub key: String,
    #[serde(skip)]
    pub payload: Vec<u8>,
    pub mime_type: String,
    /// Insertion time, the sole basis for expiry
    pub created_at: DateTime<Utc>,
    /// Where the payload was downloaded from (diagnostics only)
    pub source_url: String,
}

/// A record about to be inserted; the id is assigned by the store
#[derive(Debug, Clone)]
pub struct NewEmojiRecord {
    pub key: String,
    pub payload: Vec<u8>,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    pub source_url: String,
}

/// Raw row as stored in SQLite (timestamps in epoch milliseconds)
#[derive(Debug, FromRow)]
pub(crate) struct EmojiRow {
    pub id: i64,
    pub key: String,
    pub payload: Vec<u8>,
    pub mime_type: String,
    pub created_at: i64,
    pub source_url: String,
}

impl From<EmojiRow> for EmojiRecord {
    fn from(row: EmojiRow) -> Self {
        Self {
            id: row.id,
            key: row.key,
            payload: row.payload,
            mime_type: row.mime_type,
            created_at: DateTime::from_timestamp_millis(row.created_at).unwrap_or_default(),
            source_url: row.source_url,
        }
    }
}
