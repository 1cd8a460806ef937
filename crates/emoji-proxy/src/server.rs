//! HTTP server for emoji proxy endpoints
//!
//! Provides /health, /emoji/{key}, /render, /sweep and /blob/{id}.

use crate::types::{ErrorResponse, HealthResponse, RenderRequest, RenderResponse, RenderedItem};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use emoji_resolver::{
    AssetOrigin, AssetResolver, BatchResolver, LocalAsset, ObjectUrls, RenderProfile,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

/// Path prefix under which object urls are served
pub const BLOB_PREFIX: &str = "/blob/";

const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Shared state for the HTTP server
pub struct ServerState {
    pub resolver: Arc<AssetResolver>,
    pub urls: Arc<ObjectUrls>,
    pub batch: BatchResolver,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    /// Browsers never revoke the urls they are handed, so the server bounds
    /// them itself: at most `capacity` live urls, each dropped after `idle`
    /// without a read
    pub fn new(resolver: Arc<AssetResolver>, capacity: u64, idle: Duration) -> Self {
        let urls = Arc::new(ObjectUrls::bounded(BLOB_PREFIX, capacity, idle));
        let batch = BatchResolver::new(resolver.clone(), urls.clone(), RenderProfile::Inline);
        Self {
            resolver,
            urls,
            batch,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/emoji/{key}", get(get_emoji))
        .route("/render", post(render))
        .route("/sweep", post(sweep))
        .route("/blob/{id}", get(get_blob).delete(revoke_blob))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    let cached_emojis = match state.resolver.store().get().await {
        Ok(store) => store.count().await.ok(),
        Err(_) => None,
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        resolver: state.resolver.stats(),
        cached_emojis,
        object_urls: state.urls.len().await,
    })
}

/// Resolve and serve an emoji by key
async fn get_emoji(State(state): State<SharedState>, Path(key): Path<String>) -> Response {
    match state.resolver.get_asset_url(&key).await {
        Some(asset) if !asset.is_empty() => asset_response(asset),
        _ => {
            debug!(key = %key, "Emoji not available");
            not_found("Emoji not found")
        }
    }
}

/// Render a batch of keys into HTML fragments
async fn render(
    State(state): State<SharedState>,
    Json(request): Json<RenderRequest>,
) -> Json<RenderResponse> {
    let rendered = state
        .batch
        .with_profile(request.profile)
        .render_keys(&request.keys)
        .await;

    Json(RenderResponse {
        items: rendered.into_iter().map(RenderedItem::from).collect(),
    })
}

/// Delete expired records on demand
async fn sweep(State(state): State<SharedState>) -> Response {
    match state.resolver.sweeper().sweep().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!(error = %e, "Sweep failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Sweep failed: {}", e),
                }),
            )
                .into_response()
        }
    }
}

/// Serve a previously minted object url
async fn get_blob(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    match state.urls.get(&state.urls.url_for(&id)).await {
        Some(asset) => asset_response(asset),
        None => not_found("Object url not found"),
    }
}

/// Release an object url
async fn revoke_blob(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    if state.urls.revoke(&state.urls.url_for(&id)).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found("Object url not found")
    }
}

fn asset_response(asset: LocalAsset) -> Response {
    let cache_header = match asset.origin {
        AssetOrigin::Cache => "HIT",
        AssetOrigin::Remote | AssetOrigin::RaceLost => "MISS",
    };

    (
        [
            (header::CONTENT_TYPE, asset.mime_type),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
            (X_CACHE, cache_header.to_string()),
        ],
        Body::from(asset.bytes),
    )
        .into_response()
}

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}
