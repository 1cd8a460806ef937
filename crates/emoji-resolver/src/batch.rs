//! Concurrent placeholder resolution

use crate::object_url::ObjectUrls;
use crate::render::{RenderProfile, RenderedEmoji};
use crate::resolver::AssetResolver;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// An unresolved emoji reference inside a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub key: String,
}

impl Placeholder {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// One item of a rendering container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Text { text: String },
    Placeholder(Placeholder),
    Rendered(RenderedEmoji),
}

impl Node {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Node::Placeholder(_))
    }
}

/// Replaces every placeholder in a container, concurrently and independently
#[derive(Debug, Clone)]
pub struct BatchResolver {
    resolver: Arc<AssetResolver>,
    urls: Arc<ObjectUrls>,
    profile: RenderProfile,
}

impl BatchResolver {
    pub fn new(resolver: Arc<AssetResolver>, urls: Arc<ObjectUrls>, profile: RenderProfile) -> Self {
        Self {
            resolver,
            urls,
            profile,
        }
    }

    pub fn with_profile(&self, profile: RenderProfile) -> Self {
        Self {
            profile,
            ..self.clone()
        }
    }

    /// Resolve one key into an image, or a `[key]` fallback
    pub async fn render_one(&self, key: &str) -> RenderedEmoji {
        match self.resolver.get_asset_url(key).await {
            Some(asset) if !asset.is_empty() => {
                let src = self.urls.create(asset).await;
                RenderedEmoji::image(key, src, self.profile.preset_for_key(key))
            }
            Some(_) => {
                debug!(key, "Resolved emoji is empty, using fallback");
                RenderedEmoji::fallback(key)
            }
            None => RenderedEmoji::fallback(key),
        }
    }

    /// Resolve every key; output order matches input order
    pub async fn render_keys(&self, keys: &[String]) -> Vec<RenderedEmoji> {
        futures::future::join_all(keys.iter().map(|key| self.render_one(key))).await
    }

    /// Replace every [`Node::Placeholder`] in `nodes`, leaving other nodes untouched
    ///
    /// Completes once every placeholder has produced either an image or a
    /// fallback. A failing item never affects the others.
    pub async fn render(&self, nodes: Vec<Node>) -> Vec<Node> {
        let pending = nodes.iter().filter(|n| n.is_placeholder()).count();
        debug!(nodes = nodes.len(), pending, "Rendering emoji placeholders");

        let resolved = nodes.into_iter().map(|node| async move {
            match node {
                Node::Placeholder(placeholder) => {
                    Node::Rendered(self.render_one(&placeholder.key).await)
                }
                other => other,
            }
        });

        futures::future::join_all(resolved).await
    }
}
