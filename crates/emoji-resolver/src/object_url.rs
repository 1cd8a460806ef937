//! Caller-owned local reference handles

use crate::types::LocalAsset;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

const DEFAULT_PREFIX: &str = "blob:emoji/";

/// Registry of URL handles wrapping in-memory assets
///
/// Handles stay registered until the caller revokes them; the resolver never
/// revokes on its own. A [`bounded`](Self::bounded) registry additionally
/// drops the least recently used handles past its capacity and handles left
/// unread for its idle timeout.
pub struct ObjectUrls {
    prefix: String,
    next_id: AtomicU64,
    assets: Cache<String, LocalAsset>,
}

impl ObjectUrls {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Mint handles as `<prefix><n>`, e.g. `/blob/` for URLs a server can route
    pub fn with_prefix(prefix: &str) -> Self {
        Self::from_cache(prefix, Cache::builder().build())
    }

    /// A registry holding at most `capacity` handles, each expiring after
    /// `idle` without a read
    pub fn bounded(prefix: &str, capacity: u64, idle: Duration) -> Self {
        let assets = Cache::builder()
            .max_capacity(capacity)
            .time_to_idle(idle)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self::from_cache(prefix, assets)
    }

    fn from_cache(prefix: &str, assets: Cache<String, LocalAsset>) -> Self {
        Self {
            prefix: prefix.to_string(),
            next_id: AtomicU64::new(1),
            assets,
        }
    }

    /// Register `asset` and return its handle
    pub async fn create(&self, asset: LocalAsset) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("{}{}", self.prefix, id);
        self.assets.insert(url.clone(), asset).await;
        url
    }

    pub async fn get(&self, url: &str) -> Option<LocalAsset> {
        self.assets.get(url).await
    }

    /// Release a handle; returns whether it was registered
    pub async fn revoke(&self, url: &str) -> bool {
        let removed = self.assets.remove(url).await.is_some();
        if removed {
            debug!(url, "Revoked object url");
        }
        removed
    }

    /// Handle for a bare id under this registry's prefix
    pub fn url_for(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    pub async fn len(&self) -> usize {
        self.assets.run_pending_tasks().await;
        self.assets.entry_count() as usize
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ObjectUrls {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectUrls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectUrls")
            .field("prefix", &self.prefix)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetOrigin;
    use bytes::Bytes;

    fn asset(key: &str) -> LocalAsset {
        LocalAsset {
            key: key.to_string(),
            bytes: Bytes::from_static(b"PNG"),
            mime_type: "image/png".to_string(),
            origin: AssetOrigin::Cache,
        }
    }

    #[tokio::test]
    async fn test_create_get_revoke() {
        let urls = ObjectUrls::new();

        let url = urls.create(asset("blobcat")).await;
        assert!(url.starts_with("blob:emoji/"));
        assert_eq!(urls.get(&url).await.unwrap().key, "blobcat");

        assert!(urls.revoke(&url).await);
        assert!(urls.get(&url).await.is_none());
        assert!(!urls.revoke(&url).await);
        assert!(urls.is_empty().await);
    }

    #[tokio::test]
    async fn test_handles_are_unique() {
        let urls = ObjectUrls::with_prefix("/blob/");

        let a = urls.create(asset("a")).await;
        let b = urls.create(asset("a")).await;

        assert_ne!(a, b);
        assert_eq!(urls.len().await, 2);
        assert_eq!(urls.url_for("1"), a);
    }

    #[tokio::test]
    async fn test_bounded_registry_drops_oldest_handles() {
        let urls = ObjectUrls::bounded("/blob/", 3, Duration::from_secs(60));

        let mut handles = Vec::new();
        for _ in 0..10 {
            handles.push(urls.create(asset("blobcat")).await);
        }

        assert!(urls.len().await <= 3);
        assert!(urls.get(&handles[0]).await.is_none());
        assert_eq!(urls.get(&handles[9]).await.unwrap().key, "blobcat");
    }
}
