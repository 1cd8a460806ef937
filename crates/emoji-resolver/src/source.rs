//! Remote lookup service and asset transport

use crate::error::{ResolveError, Result};
use crate::events::Stage;
use crate::types::{EmojiMetadata, FetchedAsset, LookupResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where emoji metadata and bytes come from
#[async_trait]
pub trait EmojiSource: Send + Sync {
    /// Ask the lookup service for a key's download URL and metadata
    async fn lookup(&self, key: &str) -> Result<EmojiMetadata>;

    /// Download the full asset body
    async fn fetch(&self, url: &str) -> Result<FetchedAsset>;
}

/// [`EmojiSource`] backed by an HTTP lookup endpoint
#[derive(Debug, Clone)]
pub struct HttpEmojiSource {
    client: Client,
    lookup_url: String,
}

impl HttpEmojiSource {
    /// Create a source querying `GET <lookup_url>?name=<key>`
    pub fn new(lookup_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(client, lookup_url))
    }

    pub fn with_client(client: Client, lookup_url: &str) -> Self {
        Self {
            client,
            lookup_url: lookup_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl EmojiSource for HttpEmojiSource {
    async fn lookup(&self, key: &str) -> Result<EmojiMetadata> {
        let url = format!("{}?name={}", self.lookup_url, urlencoding::encode(key));
        debug!(key, url = %url, "Looking up emoji");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ResolveError::http(Stage::Lookup, e))?;

        if !response.status().is_success() {
            return Err(ResolveError::Lookup(format!(
                "lookup service returned status {}",
                response.status()
            )));
        }

        let data: LookupResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::Lookup(format!("malformed lookup response: {}", e)))?;

        EmojiMetadata::try_from(data)
    }

    async fn fetch(&self, url: &str) -> Result<FetchedAsset> {
        debug!(url = %url, "Fetching emoji");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ResolveError::http(Stage::Fetch, e))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), url = %url, "Failed to fetch emoji");
            return Err(ResolveError::Fetch(format!(
                "asset transport returned status {}",
                response.status()
            )));
        }

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ResolveError::http(Stage::Fetch, e))?;

        debug!(size = bytes.len(), mime_type = %mime_type, "Fetched emoji bytes");
        Ok(FetchedAsset { bytes, mime_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn source_for(server: &MockServer) -> HttpEmojiSource {
        HttpEmojiSource::new(&format!("{}/api/emoji", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/emoji"))
            .and(query_param("name", "blob cat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 12,
                "emoji_name": "blob cat",
                "url": "https://files.example/blobcat.png"
            })))
            .mount(&server)
            .await;

        let meta = source_for(&server).await.lookup("blob cat").await.unwrap();
        assert_eq!(meta.effective_key(), "blob cat");
        assert_eq!(meta.record_id.as_deref(), Some("12"));
        assert_eq!(meta.download_url, "https://files.example/blobcat.png");
    }

    #[tokio::test]
    async fn test_lookup_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/emoji"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = source_for(&server).await.lookup("blobcat").await.unwrap_err();
        assert!(matches!(err, ResolveError::Lookup(_)));
    }

    #[tokio::test]
    async fn test_lookup_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/emoji"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = source_for(&server).await.lookup("blobcat").await.unwrap_err();
        assert!(matches!(err, ResolveError::Lookup(_)));
    }

    #[tokio::test]
    async fn test_fetch_reads_body_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/blobcat.webp"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![0x52, 0x49, 0x46, 0x46])
                    .insert_header("content-type", "image/webp"),
            )
            .mount(&server)
            .await;

        let fetched = source_for(&server)
            .await
            .fetch(&format!("{}/files/blobcat.webp", server.uri()))
            .await
            .unwrap();
        assert_eq!(&fetched.bytes[..], &[0x52u8, 0x49, 0x46, 0x46]);
        assert_eq!(fetched.mime_type, "image/webp");
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/missing.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = source_for(&server)
            .await
            .fetch(&format!("{}/files/missing.png", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_connection_failures_are_tagged_with_their_call() {
        // Nothing listens on the discard port
        let source = HttpEmojiSource::new("http://127.0.0.1:9/api/emoji").unwrap();

        let err = source.lookup("blobcat").await.unwrap_err();
        assert!(matches!(err, ResolveError::Http { .. }));
        assert_eq!(err.stage(), Stage::Lookup);

        let err = source.fetch("http://127.0.0.1:9/files/blobcat.png").await.unwrap_err();
        assert!(matches!(err, ResolveError::Http { .. }));
        assert_eq!(err.stage(), Stage::Fetch);
    }
}
