//! Request and response bodies for the emoji proxy

use emoji_resolver::{RenderProfile, RenderedEmoji, ResolverStats};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub resolver: ResolverStats,
    /// Persisted record count; absent when the store cannot be read
    pub cached_emojis: Option<i64>,
    pub object_urls: usize,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub keys: Vec<String>,
    #[serde(default)]
    pub profile: RenderProfile,
}

#[derive(Debug, Serialize)]
pub struct RenderedItem {
    pub key: String,
    pub html: String,
    pub fallback: bool,
}

impl From<RenderedEmoji> for RenderedItem {
    fn from(rendered: RenderedEmoji) -> Self {
        Self {
            key: rendered.key().to_string(),
            html: rendered.to_html(),
            fallback: rendered.is_fallback(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub items: Vec<RenderedItem>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_request_default_profile() {
        let request: RenderRequest = serde_json::from_str(r#"{"keys": ["blobcat"]}"#).unwrap();
        assert_eq!(request.keys, vec!["blobcat"]);
        assert_eq!(request.profile, RenderProfile::Inline);

        let request: RenderRequest =
            serde_json::from_str(r#"{"keys": [], "profile": "large"}"#).unwrap();
        assert_eq!(request.profile, RenderProfile::Large);
    }

    #[test]
    fn test_rendered_item_from_fallback() {
        let item = RenderedItem::from(RenderedEmoji::fallback("ghost"));
        assert_eq!(item.key, "ghost");
        assert_eq!(item.html, "[ghost]");
        assert!(item.fallback);
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            uptime_secs: 3600,
            resolver: ResolverStats {
                hits: 500,
                misses: 50,
                fetches: 45,
                failures: 5,
            },
            cached_emojis: Some(45),
            object_urls: 2,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("3600"));
        assert!(json.contains("\"hits\":500"));
        assert!(json.contains("\"cached_emojis\":45"));
    }
}
