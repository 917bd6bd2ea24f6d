//! Collaborators on the far side of the sync boundary.
//!
//! The remote album service owns the authoritative tree and assigns version
//! markers. The auth session owns the bearer token. Both are consumed through
//! async traits so sessions can run against HTTP clients or test doubles.

use async_trait::async_trait;
use folio_model::{AlbumId, AlbumTree, FolderId, VersionMarker};
use thiserror::Error;

/// Per-request identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub album_id: AlbumId,
    pub bearer: String,
}

impl RequestContext {
    /// `None` when the auth session has no token
    pub async fn from_auth(album_id: &AlbumId, auth: &dyn AuthSession) -> Option<Self> {
        auth.bearer().await.map(|bearer| Self {
            album_id: album_id.clone(),
            bearer,
        })
    }
}

/// Answer to a persist request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOutcome {
    pub accepted: bool,

    /// Marker assigned to the persisted tree
    pub marker: VersionMarker,
}

/// Answer to a freshness check
#[derive(Debug, Clone, PartialEq)]
pub struct VersionCheck {
    pub is_current: bool,

    /// Authoritative tree, when the remote ships it with the answer
    pub conflict_tree: Option<AlbumTree>,
}

impl VersionCheck {
    pub fn current() -> Self {
        Self {
            is_current: true,
            conflict_tree: None,
        }
    }

    pub fn stale(conflict_tree: Option<AlbumTree>) -> Self {
        Self {
            is_current: false,
            conflict_tree,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Rejected: {0}")]
    Rejected(String),
}

impl RemoteError {
    pub fn is_auth(&self) -> bool {
        matches!(self, RemoteError::Unauthorized(_))
    }

    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Network(_) => true,
            RemoteError::Server { status, .. } => *status >= 500,
            RemoteError::Unauthorized(_) | RemoteError::Rejected(_) => false,
        }
    }
}

/// Remote album storage
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Store `tree` and drop the images in `deleted_ids` server-side
    async fn persist(
        &self,
        ctx: &RequestContext,
        tree: &AlbumTree,
        deleted_ids: &[FolderId],
    ) -> Result<PersistOutcome, RemoteError>;

    async fn fetch_tree(&self, ctx: &RequestContext) -> Result<AlbumTree, RemoteError>;

    /// Ask whether `known` is still the current marker
    async fn check_version(
        &self,
        ctx: &RequestContext,
        known: &VersionMarker,
    ) -> Result<VersionCheck, RemoteError>;
}

/// Token holder of the signed-in user
#[async_trait]
pub trait AuthSession: Send + Sync {
    async fn bearer(&self) -> Option<String>;

    /// The remote refused the token; the user has to sign in again
    fn signal_logout(&self, reason: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(RemoteError::Network("reset".into()).is_retryable());
        assert!(RemoteError::Server {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());
        assert!(!RemoteError::Server {
            status: 409,
            message: "conflict".into()
        }
        .is_retryable());
        assert!(!RemoteError::Unauthorized("expired".into()).is_retryable());
        assert!(RemoteError::Unauthorized("expired".into()).is_auth());
    }
}
