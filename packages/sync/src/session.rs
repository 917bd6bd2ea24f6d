use crate::config::SessionConfig;
use crate::coordinator::{AlbumAccess, SyncCoordinator, SyncHandle};
use crate::error::{SyncError, SyncResult};
use crate::remote::{AuthSession, PersistenceService, RequestContext};
use crate::retry::RetryPolicy;
use folio_editor::{DocumentStore, SharedDocument};
use folio_layout::{Correction, LayoutResolver};
use folio_model::AlbumId;
use std::sync::Arc;

/// One open album: the editable document plus its running sync loops
#[derive(Debug)]
pub struct AlbumSession {
    coordinator: Arc<SyncCoordinator>,
    handle: Option<SyncHandle>,
    corrections: Vec<Correction>,
}

impl AlbumSession {
    /// Fetch the album, correct stale layouts and start syncing
    pub async fn open(
        album_id: AlbumId,
        remote: Arc<dyn PersistenceService>,
        auth: Arc<dyn AuthSession>,
        resolver: LayoutResolver,
        access: Arc<AlbumAccess>,
        config: &SessionConfig,
    ) -> SyncResult<Self> {
        let Some(ctx) = RequestContext::from_auth(&album_id, auth.as_ref()).await else {
            let reason = "no bearer token";
            auth.signal_logout(reason);
            return Err(SyncError::Auth(reason.to_string()));
        };

        let retry = RetryPolicy::from(&config.sync.retry);
        let service = &remote;
        let ctx_ref = &ctx;
        let tree = match retry
            .run("fetch_tree", move || service.fetch_tree(ctx_ref))
            .await
        {
            Ok(tree) => tree,
            Err(e) if e.is_auth() => {
                auth.signal_logout(&e.to_string());
                return Err(SyncError::Auth(e.to_string()));
            }
            Err(e) => return Err(SyncError::Remote(e)),
        };

        let (store, corrections) = DocumentStore::from_remote(tree, resolver)?;
        let store = store.with_history_limit(config.history_limit);
        let version = store.marker().version;

        let coordinator = Arc::new(SyncCoordinator::new(
            album_id,
            SharedDocument::new(store),
            remote,
            auth,
            access,
            config.sync.clone(),
        ));
        let handle = coordinator.start();

        tracing::info!(
            album_id = %coordinator.album_id(),
            version,
            corrections = corrections.len(),
            "Album session opened"
        );
        Ok(Self {
            coordinator,
            handle: Some(handle),
            corrections,
        })
    }

    pub fn document(&self) -> &SharedDocument {
        self.coordinator.document()
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    /// Layout corrections made while loading the album
    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(SyncHandle::is_running)
            .unwrap_or(false)
    }

    /// Stop both loops and drop the tree. Unsaved edits are not flushed.
    pub async fn close(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.shutdown().await;
        }

        let unsaved = self.document().has_unsaved_change();
        tracing::info!(
            album_id = %self.coordinator.album_id(),
            unsaved,
            "Album session closed"
        );
    }
}
