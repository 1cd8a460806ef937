//! Cache-aside emoji resolver
//!
//! Resolves a logical emoji key to a locally servable asset. Valid cached
//! blobs are served from [`emoji_store`]; misses are looked up through a
//! remote [`EmojiSource`], downloaded and persisted. Every failure is absorbed
//! into an absent result and reported as a [`ResolveEvent`].

pub mod batch;
pub mod error;
pub mod events;
pub mod expiry;
pub mod lookup;
pub mod object_url;
pub mod remote;
pub mod render;
pub mod resolver;
pub mod source;
pub mod sweeper;
pub mod types;

pub use batch::{BatchResolver, Node, Placeholder};
pub use error::{ResolveError, Result};
pub use events::{EventBus, ResolveEvent, Stage};
pub use expiry::is_expired;
pub use lookup::CacheLookup;
pub use object_url::ObjectUrls;
pub use remote::RemoteResolver;
pub use render::{KeyShape, Preset, RenderProfile, RenderedEmoji};
pub use resolver::AssetResolver;
pub use source::{EmojiSource, HttpEmojiSource};
pub use sweeper::{ExpirySweeper, SweepReport};
pub use types::{
    AssetOrigin, EmojiMetadata, FetchedAsset, LocalAsset, LookupResponse, RecordId,
    ResolverConfig, ResolverStats,
};
