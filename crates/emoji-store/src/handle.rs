//! Lazily opened, shareable store handle

use crate::error::Result;
use crate::store::EmojiStore;
use tokio::sync::RwLock;
use tracing::debug;

/// Owns at most one open [`EmojiStore`] and opens it on first use
///
/// Concurrent callers racing on the first [`get`](Self::get) share a single
/// open. A failed open is not cached, so the next call retries. After
/// [`close`](Self::close) the next `get` reopens the same URL.
#[derive(Debug)]
pub struct StoreHandle {
    database_url: String,
    store: RwLock<Option<EmojiStore>>,
}

impl StoreHandle {
    /// Create a handle that opens `database_url` lazily
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            store: RwLock::new(None),
        }
    }

    /// Wrap an already opened store
    pub fn from_store(store: EmojiStore) -> Self {
        Self {
            database_url: store.database_url().to_string(),
            store: RwLock::new(Some(store)),
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Return the open store, opening it if needed
    pub async fn get(&self) -> Result<EmojiStore> {
        if let Some(store) = self.store.read().await.as_ref() {
            return Ok(store.clone());
        }

        let mut guard = self.store.write().await;
        if let Some(store) = guard.as_ref() {
            return Ok(store.clone());
        }

        debug!(database_url = %self.database_url, "Opening emoji store");
        let store = EmojiStore::open(&self.database_url).await?;
        *guard = Some(store.clone());
        Ok(store)
    }

    pub async fn is_open(&self) -> bool {
        self.store.read().await.is_some()
    }

    /// Close the store if it is open
    pub async fn close(&self) {
        let store = self.store.write().await.take();
        if let Some(store) = store {
            store.close().await;
        }
    }
}
