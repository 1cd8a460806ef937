//! Remote resolution: lookup, download, persist

use crate::error::Result;
use crate::events::{EventBus, ResolveEvent};
use crate::lookup::CacheLookup;
use crate::source::EmojiSource;
use crate::types::{AssetOrigin, LocalAsset};
use chrono::Utc;
use emoji_store::{NewEmojiRecord, StoreError, StoreHandle};
use std::sync::Arc;

/// Resolves a key through the [`EmojiSource`] and persists what it downloads
#[derive(Clone)]
pub struct RemoteResolver {
    source: Arc<dyn EmojiSource>,
    store: Arc<StoreHandle>,
    cache: CacheLookup,
    events: EventBus,
}

impl RemoteResolver {
    pub fn new(
        source: Arc<dyn EmojiSource>,
        store: Arc<StoreHandle>,
        cache: CacheLookup,
        events: EventBus,
    ) -> Self {
        Self {
            source,
            store,
            cache,
            events,
        }
    }

    /// Resolve `key` remotely
    ///
    /// The cache is re-checked under the effective key before downloading, so
    /// a caller that completed the same resolution in the meantime is reused.
    /// Losing the insert race to another caller is not an error: the freshly
    /// downloaded bytes are served from memory.
    pub async fn resolve(&self, key: &str) -> Result<LocalAsset> {
        let metadata = self.source.lookup(key).await?;
        let effective_key = metadata.effective_key();

        if let Some(asset) = self.cache.lookup(&effective_key).await {
            return Ok(asset);
        }

        let fetched = self.source.fetch(&metadata.download_url).await?;
        self.events.emit(ResolveEvent::Fetched {
            key: effective_key.clone(),
            size: fetched.bytes.len(),
        });

        let record = NewEmojiRecord {
            key: effective_key.clone(),
            payload: fetched.bytes.to_vec(),
            mime_type: fetched.mime_type.clone(),
            created_at: Utc::now(),
            source_url: metadata.download_url.clone(),
        };

        let store = self.store.get().await?;
        match store.insert(&record).await {
            Ok(_) => Ok(LocalAsset::from_fetched(
                effective_key,
                fetched,
                AssetOrigin::Remote,
            )),
            Err(StoreError::Constraint(_)) => {
                self.events.emit(ResolveEvent::RaceLost {
                    key: effective_key.clone(),
                });
                Ok(LocalAsset::from_fetched(
                    effective_key,
                    fetched,
                    AssetOrigin::RaceLost,
                ))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for RemoteResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteResolver")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
