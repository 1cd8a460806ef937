//! Structured diagnostic events
//!
//! Failures never reach callers of the resolver, so every decision and every
//! absorbed error is published here and mirrored to `tracing`.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Pipeline stage an event or failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Store,
    Lookup,
    Fetch,
    Transport,
    Sweep,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ResolveEvent {
    CacheHit { key: String },
    CacheMiss { key: String },
    /// A record exists but is stale; it is left for the sweeper
    Expired { key: String, age_ms: i64 },
    Fetched { key: String, size: usize },
    /// Another caller persisted the key first; the fetched bytes were served anyway
    RaceLost { key: String },
    Failed { key: String, stage: Stage, reason: String },
    Swept { scanned: usize, deleted: usize },
}

/// In-process fan-out of [`ResolveEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ResolveEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResolveEvent> {
        self.sender.subscribe()
    }

    /// Log the event and publish it to any subscribers
    pub fn emit(&self, event: ResolveEvent) {
        match &event {
            ResolveEvent::CacheHit { key } => debug!(key = %key, "Cache hit"),
            ResolveEvent::CacheMiss { key } => debug!(key = %key, "Cache miss"),
            ResolveEvent::Expired { key, age_ms } => {
                debug!(key = %key, age_ms, "Cached emoji expired")
            }
            ResolveEvent::Fetched { key, size } => debug!(key = %key, size, "Fetched emoji"),
            ResolveEvent::RaceLost { key } => {
                debug!(key = %key, "Emoji already persisted by another caller")
            }
            ResolveEvent::Failed { key, stage, reason } => {
                warn!(key = %key, stage = ?stage, reason = %reason, "Emoji resolution failed")
            }
            ResolveEvent::Swept { scanned, deleted } => {
                info!(scanned, deleted, "Expired emojis swept")
            }
        }

        // No subscribers is fine
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
