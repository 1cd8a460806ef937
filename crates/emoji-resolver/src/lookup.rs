//! Read-only cache lookup

use crate::events::{EventBus, ResolveEvent, Stage};
use crate::expiry::is_expired;
use crate::types::LocalAsset;
use chrono::Utc;
use emoji_store::StoreHandle;
use std::sync::Arc;

/// Serves valid cached emojis without ever mutating the store
///
/// Stale records are reported and skipped but left in place; removing them is
/// the sweeper's job.
#[derive(Debug, Clone)]
pub struct CacheLookup {
    store: Arc<StoreHandle>,
    ttl_days: u32,
    events: EventBus,
}

impl CacheLookup {
    pub fn new(store: Arc<StoreHandle>, ttl_days: u32, events: EventBus) -> Self {
        Self {
            store,
            ttl_days,
            events,
        }
    }

    /// Look up `key`, returning `None` on miss, expiry, or any store failure
    pub async fn lookup(&self, key: &str) -> Option<LocalAsset> {
        let store = match self.store.get().await {
            Ok(store) => store,
            Err(e) => {
                self.fail(key, e.to_string());
                return None;
            }
        };

        let record = match store.get_by_key(key).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.events.emit(ResolveEvent::CacheMiss {
                    key: key.to_string(),
                });
                return None;
            }
            Err(e) => {
                self.fail(key, e.to_string());
                return None;
            }
        };

        let now = Utc::now();
        if is_expired(record.created_at, self.ttl_days, now) {
            self.events.emit(ResolveEvent::Expired {
                key: key.to_string(),
                age_ms: (now - record.created_at).num_milliseconds(),
            });
            return None;
        }

        self.events.emit(ResolveEvent::CacheHit {
            key: key.to_string(),
        });
        Some(LocalAsset::from_record(record))
    }

    fn fail(&self, key: &str, reason: String) {
        self.events.emit(ResolveEvent::Failed {
            key: key.to_string(),
            stage: Stage::Store,
            reason,
        });
    }
}
