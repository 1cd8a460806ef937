//! On-demand removal of expired records

use crate::error::Result;
use crate::events::{EventBus, ResolveEvent, Stage};
use crate::expiry::is_expired;
use chrono::Utc;
use emoji_store::StoreHandle;
use futures::TryStreamExt;
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub deleted: usize,
}

/// Deletes stale records in creation order
///
/// Not scheduled; call [`sweep`](Self::sweep) explicitly (e.g. at startup).
/// A TTL of zero makes the sweep a no-op even though lookups treat every
/// record as expired in that mode.
#[derive(Debug, Clone)]
pub struct ExpirySweeper {
    store: Arc<StoreHandle>,
    ttl_days: u32,
    events: EventBus,
}

impl ExpirySweeper {
    pub fn new(store: Arc<StoreHandle>, ttl_days: u32, events: EventBus) -> Self {
        Self {
            store,
            ttl_days,
            events,
        }
    }

    pub async fn sweep(&self) -> Result<SweepReport> {
        let store = self.store.get().await?;

        if self.ttl_days == 0 {
            return Ok(SweepReport::default());
        }

        let now = Utc::now();
        let mut report = SweepReport::default();
        let mut records = store.scan_by_time();

        while let Some(record) = records.try_next().await? {
            report.scanned += 1;
            if !is_expired(record.created_at, self.ttl_days, now) {
                continue;
            }
            match store.delete(record.id).await {
                Ok(()) => report.deleted += 1,
                Err(e) => self.events.emit(ResolveEvent::Failed {
                    key: record.key,
                    stage: Stage::Sweep,
                    reason: e.to_string(),
                }),
            }
        }

        self.events.emit(ResolveEvent::Swept {
            scanned: report.scanned,
            deleted: report.deleted,
        });
        Ok(report)
    }
}
