//! Error types for the emoji resolver

use crate::events::Stage;
use emoji_store::StoreError;
use std::fmt;

#[derive(Debug)]
pub enum ResolveError {
    /// Upstream lookup returned a bad status or unusable metadata
    Lookup(String),
    /// Asset download returned a bad status
    Fetch(String),
    /// Transport-level HTTP failure, tagged with the call it happened in
    Http {
        stage: Stage,
        source: Box<reqwest::Error>,
    },
    Store(StoreError),
}

impl ResolveError {
    pub fn http(stage: Stage, err: reqwest::Error) -> Self {
        ResolveError::Http {
            stage,
            source: Box::new(err),
        }
    }

    /// Pipeline stage the error is attributed to in diagnostics
    pub fn stage(&self) -> Stage {
        match self {
            ResolveError::Lookup(_) => Stage::Lookup,
            ResolveError::Fetch(_) => Stage::Fetch,
            ResolveError::Http { stage, .. } => *stage,
            ResolveError::Store(_) => Stage::Store,
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Lookup(msg) => write!(f, "Lookup error: {}", msg),
            ResolveError::Fetch(msg) => write!(f, "Fetch error: {}", msg),
            ResolveError::Http { source, .. } => write!(f, "HTTP error: {}", source),
            ResolveError::Store(err) => write!(f, "Store error: {}", err),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Http { source, .. } => Some(source.as_ref()),
            ResolveError::Store(err) => Some(err),
            _ => None,
        }
    }
}

/// Failures outside a lookup or fetch call, e.g. building the client
impl From<reqwest::Error> for ResolveError {
    fn from(err: reqwest::Error) -> Self {
        ResolveError::http(Stage::Transport, err)
    }
}

impl From<StoreError> for ResolveError {
    fn from(err: StoreError) -> Self {
        ResolveError::Store(err)
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_error_display() {
        let err = ResolveError::Lookup("missing url".to_string());
        assert_eq!(format!("{}", err), "Lookup error: missing url");
        assert_eq!(err.stage(), Stage::Lookup);
    }

    #[test]
    fn test_store_error_wraps_source() {
        let err = ResolveError::from(StoreError::Constraint("blobcat".to_string()));
        assert!(format!("{}", err).contains("blobcat"));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.stage(), Stage::Store);
    }

    #[test]
    fn test_fetch_error_stage() {
        let err = ResolveError::Fetch("status 404".to_string());
        assert_eq!(err.stage(), Stage::Fetch);
    }
}
