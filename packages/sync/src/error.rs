use crate::remote::RemoteError;
use folio_editor::EditorError;
use folio_layout::LayoutError;
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Saving failed. Auto-save tries again on its next tick.
    #[error("Persist failed: {0}")]
    Persist(RemoteError),

    /// Freshness check or tree fetch failed
    #[error("Remote request failed: {0}")]
    Remote(RemoteError),

    /// The remote refused our credentials. Sync is terminated.
    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("A save is already in flight")]
    SaveInFlight,

    #[error("Sync has been terminated")]
    Terminated,

    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
}

impl SyncError {
    pub fn is_auth(&self) -> bool {
        matches!(self, SyncError::Auth(_))
    }
}
