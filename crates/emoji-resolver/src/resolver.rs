//! Public cache-aside entry point

use crate::events::{EventBus, ResolveEvent};
use crate::lookup::CacheLookup;
use crate::remote::RemoteResolver;
use crate::source::EmojiSource;
use crate::sweeper::ExpirySweeper;
use crate::types::{AssetOrigin, LocalAsset, ResolverConfig, ResolverStats};
use emoji_store::StoreHandle;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::debug;

/// Upper bound on how long a finished in-flight entry may linger if its
/// owner never invalidates it
const INFLIGHT_TTL_SECS: u64 = 30;
const INFLIGHT_CAPACITY: u64 = 10_000;

/// Resolves emoji keys to local assets: cache first, then remote
///
/// Never fails outward. Every internal error becomes `None` plus a
/// [`ResolveEvent::Failed`].
pub struct AssetResolver {
    store: Arc<StoreHandle>,
    cache: CacheLookup,
    remote: RemoteResolver,
    events: EventBus,
    ttl_days: u32,
    /// Present only when in-flight coalescing is enabled
    inflight: Option<Cache<String, Option<LocalAsset>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    failures: AtomicU64,
}

impl AssetResolver {
    pub fn new(
        store: Arc<StoreHandle>,
        source: Arc<dyn EmojiSource>,
        config: ResolverConfig,
    ) -> Self {
        let events = EventBus::new(config.event_capacity);
        let cache = CacheLookup::new(store.clone(), config.ttl_days, events.clone());
        let remote = RemoteResolver::new(source, store.clone(), cache.clone(), events.clone());

        let inflight = config.coalesce_inflight.then(|| {
            Cache::builder()
                .max_capacity(INFLIGHT_CAPACITY)
                .time_to_live(Duration::from_secs(INFLIGHT_TTL_SECS))
                .build()
        });

        Self {
            store,
            cache,
            remote,
            events,
            ttl_days: config.ttl_days,
            inflight,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            fetches: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Resolve `key` to a local asset, or `None` if it cannot be served
    pub async fn get_asset_url(&self, key: &str) -> Option<LocalAsset> {
        if let Some(asset) = self.cache.lookup(key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(asset);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        match &self.inflight {
            None => self.resolve_remote(key).await,
            Some(inflight) => {
                let asset = inflight
                    .get_with(key.to_string(), self.resolve_remote(key))
                    .await;
                // Only coalesce while the resolution is running; the store is
                // the cache.
                inflight.invalidate(key).await;
                asset
            }
        }
    }

    async fn resolve_remote(&self, key: &str) -> Option<LocalAsset> {
        match self.remote.resolve(key).await {
            Ok(asset) => {
                match asset.origin {
                    AssetOrigin::Cache => self.hits.fetch_add(1, Ordering::Relaxed),
                    AssetOrigin::Remote | AssetOrigin::RaceLost => {
                        self.fetches.fetch_add(1, Ordering::Relaxed)
                    }
                };
                debug!(key, resolved = %asset.key, origin = ?asset.origin, "Resolved emoji");
                Some(asset)
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                self.events.emit(ResolveEvent::Failed {
                    key: key.to_string(),
                    stage: e.stage(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    /// A sweeper sharing this resolver's store, TTL and event bus
    pub fn sweeper(&self) -> ExpirySweeper {
        ExpirySweeper::new(self.store.clone(), self.ttl_days, self.events.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResolveEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &Arc<StoreHandle> {
        &self.store
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for AssetResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetResolver")
            .field("store", &self.store)
            .field("ttl_days", &self.ttl_days)
            .field("coalesce_inflight", &self.inflight.is_some())
            .finish_non_exhaustive()
    }
}
