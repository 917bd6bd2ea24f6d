//! # Folio Sync
//!
//! Background persistence and conflict handling for one open album.
//!
//! Two repeating tasks run per session: an auto-save every 90 seconds and a
//! freshness poll every 30 seconds. Both, plus the explicit save, delete and
//! reload entry points, pass through a single [`SyncGate`] so that at most
//! one network mutation or consistency check is in flight.
//!
//! ```rust,ignore
//! let session = AlbumSession::open(album_id, remote, auth, resolver, access, &config).await?;
//!
//! session.document().apply(mutation)?;
//! session.coordinator().force_save().await?;
//!
//! session.close().await;
//! ```

mod config;
mod coordinator;
mod error;
mod gate;
mod remote;
mod retry;
mod scheduler;
mod session;

pub use config::{RetryConfig, SessionConfig, SyncConfig};
pub use coordinator::{
    AlbumAccess, AutoSaveOutcome, CheckOutcome, SaveOutcome, SkipReason, SyncCoordinator,
    SyncHandle,
};
pub use error::{SyncError, SyncResult};
pub use gate::{Activity, BlockingOperation, GateTicket, SyncGate, SyncStatus};
pub use remote::{
    AuthSession, PersistOutcome, PersistenceService, RemoteError, RequestContext, VersionCheck,
};
pub use retry::RetryPolicy;
pub use scheduler::{RepeatingTask, TickControl};
pub use session::AlbumSession;
