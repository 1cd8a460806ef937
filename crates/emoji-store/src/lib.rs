//! SQLite-backed emoji blob store
//!
//! Durable, key-indexed storage for small binary assets. Each record carries a
//! unique logical key and an insertion timestamp; the schema is versioned and
//! dropped wholesale whenever the version changes, since the store only ever
//! holds a cache.

mod error;
mod handle;
mod store;
mod types;

pub use error::{Result, StoreError};
pub use handle::StoreHandle;
pub use store::{EmojiStore, SCAN_PAGE_SIZE, SCHEMA_VERSION};
pub use types::{EmojiRecord, NewEmojiRecord};
