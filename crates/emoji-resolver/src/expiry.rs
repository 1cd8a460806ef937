//! Time-based expiry policy

use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Whether a record created at `created_at` is stale at `now`
///
/// A TTL of zero days treats every record as expired. Otherwise a record
/// expires once its age strictly exceeds `ttl_days` whole days.
pub fn is_expired(created_at: DateTime<Utc>, ttl_days: u32, now: DateTime<Utc>) -> bool {
    if ttl_days == 0 {
        return true;
    }
    let age_ms = (now - created_at).num_milliseconds();
    age_ms > i64::from(ttl_days) * MILLIS_PER_DAY
}
