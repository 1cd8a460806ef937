//! Core types for the emoji resolver

use crate::error::{ResolveError, Result};
use bytes::Bytes;
use emoji_store::EmojiRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record id as returned by the lookup service (number or string)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Raw response from the lookup service
#[derive(Debug, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub emoji_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Validated lookup metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiMetadata {
    pub resolved_key: Option<String>,
    pub record_id: Option<String>,
    pub download_url: String,
}

impl EmojiMetadata {
    /// Key the downloaded asset is cached under
    ///
    /// Uses the upstream name when present, otherwise `no.<record id>`.
    pub fn effective_key(&self) -> String {
        self.resolved_key.clone().unwrap_or_else(|| {
            format!("no.{}", self.record_id.as_deref().unwrap_or_default())
        })
    }
}

impl TryFrom<LookupResponse> for EmojiMetadata {
    type Error = ResolveError;

    fn try_from(response: LookupResponse) -> Result<Self> {
        let download_url = response
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ResolveError::Lookup("response has no download url".to_string()))?;

        let resolved_key = response.emoji_name.filter(|n| !n.trim().is_empty());
        let record_id = response
            .id
            .map(|id| id.to_string())
            .filter(|id| !id.is_empty());

        if resolved_key.is_none() && record_id.is_none() {
            return Err(ResolveError::Lookup(
                "response has neither emoji_name nor id".to_string(),
            ));
        }

        Ok(Self {
            resolved_key,
            record_id,
            download_url,
        })
    }
}

/// Bytes downloaded from the asset transport
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    pub bytes: Bytes,
    pub mime_type: String,
}

/// Where a [`LocalAsset`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetOrigin {
    /// Served from a valid cached record
    Cache,
    /// Downloaded and persisted by this call
    Remote,
    /// Downloaded, but another caller persisted the key first
    RaceLost,
}

/// A locally usable handle over an emoji's bytes
///
/// Owned by the caller; nothing in the resolver keeps a reference to it.
#[derive(Debug, Clone)]
pub struct LocalAsset {
    pub key: String,
    pub bytes: Bytes,
    pub mime_type: String,
    pub origin: AssetOrigin,
}

impl LocalAsset {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn from_record(record: EmojiRecord) -> Self {
        Self {
            key: record.key,
            bytes: Bytes::from(record.payload),
            mime_type: record.mime_type,
            origin: AssetOrigin::Cache,
        }
    }

    pub fn from_fetched(key: String, fetched: FetchedAsset, origin: AssetOrigin) -> Self {
        Self {
            key,
            bytes: fetched.bytes,
            mime_type: fetched.mime_type,
            origin,
        }
    }
}

/// Resolver settings
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Days a cached emoji stays valid; zero disables cache serving
    pub ttl_days: u32,
    /// Share one remote resolution among concurrent callers of the same key
    pub coalesce_inflight: bool,
    /// Buffer size of the diagnostic event channel
    pub event_capacity: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ttl_days: 7,
            coalesce_inflight: false,
            event_capacity: 256,
        }
    }
}

/// Counters describing resolver activity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverStats {
    pub hits: u64,
    pub misses: u64,
    pub fetches: u64,
    pub failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<EmojiMetadata> {
        let response: LookupResponse = serde_json::from_str(json).unwrap();
        EmojiMetadata::try_from(response)
    }

    #[test]
    fn test_effective_key_prefers_name() {
        let meta = parse(r#"{"id": 7, "emoji_name": "blobcat", "url": "https://e/x.png"}"#).unwrap();
        assert_eq!(meta.effective_key(), "blobcat");
        assert_eq!(meta.download_url, "https://e/x.png");
    }

    #[test]
    fn test_effective_key_falls_back_to_record_id() {
        let meta = parse(r#"{"id": 7, "emoji_name": "", "url": "https://e/x.png"}"#).unwrap();
        assert_eq!(meta.effective_key(), "no.7");

        let meta = parse(r#"{"id": 7, "url": "https://e/x.png"}"#).unwrap();
        assert_eq!(meta.effective_key(), "no.7");

        let meta = parse(r#"{"id": "42", "emoji_name": null, "url": "https://e/x.png"}"#).unwrap();
        assert_eq!(meta.effective_key(), "no.42");
    }

    #[test]
    fn test_missing_url_is_lookup_failure() {
        let err = parse(r#"{"id": 7, "emoji_name": "blobcat"}"#).unwrap_err();
        assert!(matches!(err, ResolveError::Lookup(_)));

        let err = parse(r#"{"id": 7, "emoji_name": "blobcat", "url": ""}"#).unwrap_err();
        assert!(matches!(err, ResolveError::Lookup(_)));
    }

    #[test]
    fn test_nameless_idless_response_is_lookup_failure() {
        let err = parse(r#"{"url": "https://e/x.png"}"#).unwrap_err();
        assert!(matches!(err, ResolveError::Lookup(_)));
    }

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert_eq!(config.ttl_days, 7);
        assert!(!config.coalesce_inflight);
    }

    #[test]
    fn test_stats_default() {
        let stats = ResolverStats::default();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.fetches, 0);
        assert_eq!(stats.failures, 0);
    }
}
