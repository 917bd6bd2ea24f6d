#![allow(dead_code)]

use async_trait::async_trait;
use folio_editor::{DocumentStore, Mutation, SharedDocument};
use folio_layout::fixtures::sample_catalog;
use folio_layout::LayoutResolver;
use folio_model::{fixtures, AlbumId, AlbumTree, FolderId, VersionMarker};
use folio_sync::{
    AlbumAccess, AuthSession, PersistOutcome, PersistenceService, RemoteError, RequestContext,
    SyncConfig, SyncCoordinator, VersionCheck,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ALBUM: &str = "album-42";

#[derive(Debug)]
struct ServerState {
    tree: AlbumTree,
    persist_failures: VecDeque<RemoteError>,
    checks: VecDeque<Result<VersionCheck, RemoteError>>,
    fetch_failures: VecDeque<RemoteError>,
    deleted: Vec<FolderId>,
}

/// In-memory album service. Accepted persists bump the server version.
#[derive(Debug)]
pub struct MockRemote {
    state: Mutex<ServerState>,
    persist_delay: Duration,
    persist_calls: AtomicUsize,
    check_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl MockRemote {
    pub fn new(tree: AlbumTree) -> Self {
        Self {
            state: Mutex::new(ServerState {
                tree,
                persist_failures: VecDeque::new(),
                checks: VecDeque::new(),
                fetch_failures: VecDeque::new(),
                deleted: Vec::new(),
            }),
            persist_delay: Duration::ZERO,
            persist_calls: AtomicUsize::new(0),
            check_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_persist_delay(mut self, delay: Duration) -> Self {
        self.persist_delay = delay;
        self
    }

    /// The next persist call fails with `error`
    pub fn fail_persist(&self, error: RemoteError) {
        self.state.lock().unwrap().persist_failures.push_back(error);
    }

    pub fn fail_fetch(&self, error: RemoteError) {
        self.state.lock().unwrap().fetch_failures.push_back(error);
    }

    /// The next check_version call answers `result`
    pub fn script_check(&self, result: Result<VersionCheck, RemoteError>) {
        self.state.lock().unwrap().checks.push_back(result);
    }

    pub fn set_server_tree(&self, tree: AlbumTree) {
        self.state.lock().unwrap().tree = tree;
    }

    pub fn server_tree(&self) -> AlbumTree {
        self.state.lock().unwrap().tree.clone()
    }

    /// Ids received as `deletedIds` by accepted persists
    pub fn deleted_ids(&self) -> Vec<FolderId> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn persist_calls(&self) -> usize {
        self.persist_calls.load(Ordering::SeqCst)
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceService for MockRemote {
    async fn persist(
        &self,
        ctx: &RequestContext,
        tree: &AlbumTree,
        deleted_ids: &[FolderId],
    ) -> Result<PersistOutcome, RemoteError> {
        assert_eq!(ctx.album_id.as_str(), ALBUM);
        self.persist_calls.fetch_add(1, Ordering::SeqCst);
        if !self.persist_delay.is_zero() {
            tokio::time::sleep(self.persist_delay).await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.persist_failures.pop_front() {
            return Err(error);
        }

        let marker = VersionMarker::new(state.tree.version + 1, tree.creation_time);
        let mut stored = tree.clone();
        stored.set_marker(marker);
        state.tree = stored;
        state.deleted.extend_from_slice(deleted_ids);

        Ok(PersistOutcome {
            accepted: true,
            marker,
        })
    }

    async fn fetch_tree(&self, _ctx: &RequestContext) -> Result<AlbumTree, RemoteError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        match state.fetch_failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(state.tree.clone()),
        }
    }

    async fn check_version(
        &self,
        _ctx: &RequestContext,
        known: &VersionMarker,
    ) -> Result<VersionCheck, RemoteError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(scripted) = state.checks.pop_front() {
            return scripted;
        }

        if state.tree.marker() == *known {
            Ok(VersionCheck::current())
        } else {
            Ok(VersionCheck::stale(None))
        }
    }
}

#[derive(Debug)]
pub struct MockAuth {
    bearer: Mutex<Option<String>>,
    logouts: AtomicUsize,
    last_reason: Mutex<Option<String>>,
}

impl MockAuth {
    pub fn signed_in() -> Self {
        Self {
            bearer: Mutex::new(Some("token-1".to_string())),
            logouts: AtomicUsize::new(0),
            last_reason: Mutex::new(None),
        }
    }

    pub fn signed_out() -> Self {
        let auth = Self::signed_in();
        *auth.bearer.lock().unwrap() = None;
        auth
    }

    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }

    pub fn last_reason(&self) -> Option<String> {
        self.last_reason.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthSession for MockAuth {
    async fn bearer(&self) -> Option<String> {
        self.bearer.lock().unwrap().clone()
    }

    fn signal_logout(&self, reason: &str) {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        *self.last_reason.lock().unwrap() = Some(reason.to_string());
    }
}

pub fn resolver() -> LayoutResolver {
    LayoutResolver::with_seed(Arc::new(sample_catalog()), 9)
}

pub fn document() -> SharedDocument {
    let store = DocumentStore::new(fixtures::sample_tree(), resolver()).unwrap();
    SharedDocument::new(store)
}

pub fn coordinator(remote: &Arc<MockRemote>, auth: &Arc<MockAuth>) -> Arc<SyncCoordinator> {
    coordinator_with_access(remote, auth, Arc::new(AlbumAccess::owned()))
}

pub fn coordinator_with_access(
    remote: &Arc<MockRemote>,
    auth: &Arc<MockAuth>,
    access: Arc<AlbumAccess>,
) -> Arc<SyncCoordinator> {
    let remote: Arc<dyn PersistenceService> = remote.clone();
    let auth: Arc<dyn AuthSession> = auth.clone();
    Arc::new(SyncCoordinator::new(
        AlbumId::new(ALBUM),
        document(),
        remote,
        auth,
        access,
        SyncConfig::default(),
    ))
}

pub fn theme(id: &str) -> Mutation {
    Mutation::SetTheme {
        theme_id: Some(id.to_string()),
    }
}

pub fn server_error(status: u16) -> RemoteError {
    RemoteError::Server {
        status,
        message: "unavailable".to_string(),
    }
}
