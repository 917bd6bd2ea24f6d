//! # Sync Coordinator
//!
//! Keeps the local album tree and the remote one consistent without a live
//! connection.
//!
//! ```text
//!  auto-save (90s) ─┐                     ┌─ persist(tree, deletedIds)
//!  force_save ──────┼──▶ SyncGate ──────▶ ┤
//!  delete_images ───┘   (one at a time)   └─ checkVersion → fetch → replace
//!  freshness poll (30s) ──────▶ ┘
//! ```
//!
//! Local edits are optimistic: they are applied to the store immediately and
//! persisted later as whole trees. When the remote reports a newer version the
//! local tree is replaced wholesale and history is discarded. There is no
//! field-level merge.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::gate::{Activity, BlockingOperation, SyncGate, SyncStatus};
use crate::remote::{AuthSession, PersistenceService, RemoteError, RequestContext};
use crate::retry::RetryPolicy;
use crate::scheduler::{RepeatingTask, TickControl};
use folio_editor::{EditorError, Mutation, SharedDocument};
use folio_layout::Correction;
use folio_model::{AlbumId, AlbumTree, FolderId, SubtreeKind, VersionMarker};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Who may write the album right now
#[derive(Debug, Default)]
pub struct AlbumAccess {
    owned: AtomicBool,
    locked: AtomicBool,
}

impl AlbumAccess {
    pub fn new(owned: bool, locked: bool) -> Self {
        Self {
            owned: AtomicBool::new(owned),
            locked: AtomicBool::new(locked),
        }
    }

    /// Owned by the signed-in user and not locked
    pub fn owned() -> Self {
        Self::new(true, false)
    }

    pub fn is_owned(&self) -> bool {
        self.owned.load(Ordering::Acquire)
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    pub fn set_owned(&self, owned: bool) {
        self.owned.store(owned, Ordering::Release);
    }

    /// Albums are locked once ordered
    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another save or check holds the gate
    Busy(Activity),

    /// A blocking operation is running
    Blocked,

    /// Sync was terminated
    Inactive,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AutoSaveOutcome {
    /// Not owned, locked, or terminated
    NotEligible,

    /// Nothing to save
    Clean,

    Skipped(SkipReason),

    Saved(VersionMarker),

    /// The change stays pending for the next tick
    Failed(SyncError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(VersionMarker),
    UpToDate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Current,

    /// The local tree was replaced by the remote one
    Replaced {
        from: VersionMarker,
        to: VersionMarker,
        corrections: Vec<Correction>,
    },

    /// The remote tree was older than the local one
    Ignored(VersionMarker),

    Skipped(SkipReason),
}

pub struct SyncCoordinator {
    album_id: AlbumId,
    document: SharedDocument,
    remote: Arc<dyn PersistenceService>,
    auth: Arc<dyn AuthSession>,
    gate: Arc<SyncGate>,
    access: Arc<AlbumAccess>,
    config: SyncConfig,
    retry: RetryPolicy,

    /// Image ids deleted locally but not yet persisted
    pending_deletions: Mutex<Vec<FolderId>>,

    terminated: AtomicBool,
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("album_id", &self.album_id)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

impl SyncCoordinator {
    pub fn new(
        album_id: AlbumId,
        document: SharedDocument,
        remote: Arc<dyn PersistenceService>,
        auth: Arc<dyn AuthSession>,
        access: Arc<AlbumAccess>,
        config: SyncConfig,
    ) -> Self {
        let retry = RetryPolicy::from(&config.retry);
        Self {
            album_id,
            document,
            remote,
            auth,
            gate: Arc::new(SyncGate::new()),
            access,
            config,
            retry,
            pending_deletions: Mutex::new(Vec::new()),
            terminated: AtomicBool::new(false),
        }
    }

    pub fn album_id(&self) -> &AlbumId {
        &self.album_id
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn access(&self) -> &Arc<AlbumAccess> {
        &self.access
    }

    pub fn is_saving(&self) -> bool {
        self.gate.is_saving()
    }

    pub fn is_checking(&self) -> bool {
        self.gate.is_checking()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.gate.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        self.gate.status()
    }

    /// Hold off auto-saves (e.g. while the album is added to the basket)
    pub fn begin_blocking_operation(&self) -> BlockingOperation {
        self.gate.begin_blocking()
    }

    pub fn pending_deletions(&self) -> Vec<FolderId> {
        self.deletions().clone()
    }

    fn deletions(&self) -> MutexGuard<'_, Vec<FolderId>> {
        self.pending_deletions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn has_work(&self) -> bool {
        self.document.has_unsaved_change() || !self.deletions().is_empty()
    }

    /// One auto-save tick. Never retries: a failed save stays pending and is
    /// picked up by the next tick.
    pub async fn auto_save_tick(&self) -> AutoSaveOutcome {
        if self.is_terminated() || !self.access.is_owned() || self.access.is_locked() {
            return AutoSaveOutcome::NotEligible;
        }
        if self.gate.is_blocked() {
            return AutoSaveOutcome::Skipped(SkipReason::Blocked);
        }
        if !self.has_work() {
            return AutoSaveOutcome::Clean;
        }

        let Some(_ticket) = self.gate.try_enter(Activity::Saving) else {
            let busy = self.gate.current().unwrap_or(Activity::Saving);
            tracing::debug!(album_id = %self.album_id, ?busy, "Auto-save skipped");
            return AutoSaveOutcome::Skipped(SkipReason::Busy(busy));
        };

        match self.save_snapshot(&RetryPolicy::none()).await {
            Ok(Some(marker)) => AutoSaveOutcome::Saved(marker),
            Ok(None) => AutoSaveOutcome::Clean,
            Err(e) => AutoSaveOutcome::Failed(e),
        }
    }

    /// Save now, retrying transient failures. Waits for a running check but
    /// refuses to overlap another save.
    pub async fn force_save(&self) -> SyncResult<SaveOutcome> {
        if self.is_terminated() {
            return Err(SyncError::Terminated);
        }
        if self.gate.is_saving() {
            return Err(SyncError::SaveInFlight);
        }

        let _ticket = self.gate.enter(Activity::Saving).await;
        if !self.has_work() {
            return Ok(SaveOutcome::UpToDate);
        }

        match self.save_snapshot(&self.retry).await? {
            Some(marker) => Ok(SaveOutcome::Saved(marker)),
            None => Ok(SaveOutcome::UpToDate),
        }
    }

    /// Remove photos locally right away, then persist the deletion.
    ///
    /// Only book slots are removed and queued. Pages, spreads and unknown ids
    /// are skipped. The ids stay queued until a persist succeeds, so a failed
    /// call is picked up by the next save.
    pub async fn delete_images(&self, ids: Vec<FolderId>) -> SyncResult<SaveOutcome> {
        if self.is_terminated() {
            return Err(SyncError::Terminated);
        }

        let kind = SubtreeKind::Book;
        let removed = self.document.with(|store| {
            let book = &store.current().book;
            let mut slots: Vec<FolderId> = Vec::new();
            for id in &ids {
                if book.depth_of(*id) == Some(kind.slot_depth()) && !slots.contains(id) {
                    slots.push(*id);
                }
            }
            if !slots.is_empty() {
                store.apply(Mutation::RemoveImages {
                    subtree: kind,
                    folder_ids: slots.clone(),
                })?;
            }
            Ok::<_, EditorError>(slots)
        })?;

        if removed.len() < ids.len() {
            tracing::warn!(
                album_id = %self.album_id,
                requested = ids.len(),
                removed = removed.len(),
                "Skipped ids that are not photo slots"
            );
        }
        {
            let mut pending = self.deletions();
            for id in removed {
                if !pending.contains(&id) {
                    pending.push(id);
                }
            }
        }

        self.force_save().await
    }

    /// Persist the current tree. The caller holds the gate.
    async fn save_snapshot(&self, policy: &RetryPolicy) -> SyncResult<Option<VersionMarker>> {
        let ctx = self.context().await?;

        let (tree, fingerprint, unsaved) = self.document.with(|store| {
            (
                store.snapshot(),
                store.fingerprint(),
                store.has_unsaved_change(),
            )
        });
        let fingerprint = fingerprint?;
        let deleted = self.pending_deletions();
        if !unsaved && deleted.is_empty() {
            return Ok(None);
        }

        tracing::debug!(
            album_id = %self.album_id,
            version = tree.version,
            deleted = deleted.len(),
            "Persisting album"
        );

        let remote = &self.remote;
        let (ctx_ref, tree_ref, deleted_ref) = (&ctx, &tree, deleted.as_slice());
        let outcome = policy
            .run("persist", move || remote.persist(ctx_ref, tree_ref, deleted_ref))
            .await
            .map_err(|e| self.remote_failure(e, SyncError::Persist))?;

        if !outcome.accepted {
            let error = SyncError::Persist(RemoteError::Rejected(
                "persist was not accepted".to_string(),
            ));
            self.gate.record_error(&error.to_string());
            tracing::warn!(album_id = %self.album_id, "Persist was not accepted");
            return Err(error);
        }

        // Only the ids that were sent; deletions queued meanwhile stay
        self.deletions().retain(|id| !deleted.contains(id));
        self.document
            .with(|store| store.mark_persisted(fingerprint, outcome.marker));
        self.gate.record_saved(outcome.marker);

        tracing::info!(
            album_id = %self.album_id,
            version = outcome.marker.version,
            "Album saved"
        );
        Ok(Some(outcome.marker))
    }

    /// One freshness poll. Skipped while a save or another check runs.
    pub async fn poll_tick(&self) -> SyncResult<CheckOutcome> {
        if self.is_terminated() {
            return Ok(CheckOutcome::Skipped(SkipReason::Inactive));
        }

        let Some(_ticket) = self.gate.try_enter(Activity::Checking) else {
            let busy = self.gate.current().unwrap_or(Activity::Checking);
            return Ok(CheckOutcome::Skipped(SkipReason::Busy(busy)));
        };
        self.check_remote().await
    }

    /// Check freshness now, waiting for a running save to finish first
    pub async fn force_check(&self) -> SyncResult<CheckOutcome> {
        if self.is_terminated() {
            return Err(SyncError::Terminated);
        }

        let _ticket = self.gate.enter(Activity::Checking).await;
        self.check_remote().await
    }

    /// Discard local state and load the remote tree, whatever its marker
    pub async fn reload(&self) -> SyncResult<CheckOutcome> {
        if self.is_terminated() {
            return Err(SyncError::Terminated);
        }

        let _ticket = self.gate.enter(Activity::Checking).await;
        let ctx = self.context().await?;
        let tree = self.fetch(&ctx).await?;
        self.replace(tree)
    }

    /// The caller holds the gate
    async fn check_remote(&self) -> SyncResult<CheckOutcome> {
        let ctx = self.context().await?;
        let known = self.document.marker();

        let remote = &self.remote;
        let (ctx_ref, known_ref) = (&ctx, &known);
        let check = self
            .retry
            .run("check_version", move || remote.check_version(ctx_ref, known_ref))
            .await
            .map_err(|e| self.remote_failure(e, SyncError::Remote))?;

        if check.is_current {
            tracing::debug!(album_id = %self.album_id, version = known.version, "Album is current");
            return Ok(CheckOutcome::Current);
        }

        let tree = match check.conflict_tree {
            Some(tree) => tree,
            None => self.fetch(&ctx).await?,
        };

        let incoming = tree.marker();
        if incoming.is_superseded_by(&known) {
            tracing::debug!(
                album_id = %self.album_id,
                local = %known,
                remote = %incoming,
                "Ignoring older remote tree"
            );
            return Ok(CheckOutcome::Ignored(incoming));
        }

        self.replace(tree)
    }

    async fn fetch(&self, ctx: &RequestContext) -> SyncResult<AlbumTree> {
        let remote = &self.remote;
        self.retry
            .run("fetch_tree", move || remote.fetch_tree(ctx))
            .await
            .map_err(|e| self.remote_failure(e, SyncError::Remote))
    }

    /// Swap in a remote tree. Unsaved local edits are discarded.
    fn replace(&self, tree: AlbumTree) -> SyncResult<CheckOutcome> {
        let to = tree.marker();
        let (from, unsaved, corrections) = self.document.with(|store| {
            let from = store.marker();
            let unsaved = store.has_unsaved_change();
            store
                .replace_from_remote(tree)
                .map(|corrections| (from, unsaved, corrections))
        })?;

        let dropped = std::mem::take(&mut *self.deletions());
        if unsaved || !dropped.is_empty() {
            tracing::info!(
                album_id = %self.album_id,
                version = to.version,
                dropped_deletions = dropped.len(),
                "Discarded unsaved local edits in favour of the remote tree"
            );
        }

        tracing::info!(
            album_id = %self.album_id,
            from = %from,
            to = %to,
            corrections = corrections.len(),
            "Album replaced from remote"
        );
        Ok(CheckOutcome::Replaced {
            from,
            to,
            corrections,
        })
    }

    async fn context(&self) -> SyncResult<RequestContext> {
        match RequestContext::from_auth(&self.album_id, self.auth.as_ref()).await {
            Some(ctx) => Ok(ctx),
            None => {
                let reason = "no bearer token";
                self.terminate(reason);
                Err(SyncError::Auth(reason.to_string()))
            }
        }
    }

    /// Map a remote failure, terminating sync on authorization errors
    fn remote_failure(&self, error: RemoteError, wrap: fn(RemoteError) -> SyncError) -> SyncError {
        if let RemoteError::Unauthorized(reason) = &error {
            self.terminate(reason);
            return SyncError::Auth(reason.clone());
        }

        tracing::warn!(album_id = %self.album_id, error = %error, "Remote request failed");
        let error = wrap(error);
        self.gate.record_error(&error.to_string());
        error
    }

    /// Stop all background sync and hand the user back to sign-in. Only the
    /// first call has an effect.
    pub fn terminate(&self, reason: &str) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }

        tracing::warn!(album_id = %self.album_id, reason, "Sync terminated");
        self.gate.record_error(reason);
        self.gate.mark_terminated();
        self.auth.signal_logout(reason);
    }

    /// Spawn the auto-save and freshness loops
    pub fn start(self: &Arc<Self>) -> SyncHandle {
        let this = Arc::clone(self);
        let auto_save = RepeatingTask::spawn(
            "auto-save",
            self.config.auto_save_interval(),
            move || {
                let this = Arc::clone(&this);
                async move {
                    if this.is_terminated() {
                        return TickControl::Stop;
                    }
                    match this.auto_save_tick().await {
                        AutoSaveOutcome::Failed(e) => {
                            tracing::warn!(album_id = %this.album_id, error = %e, "Auto-save failed");
                        }
                        outcome => {
                            tracing::trace!(album_id = %this.album_id, ?outcome, "Auto-save tick");
                        }
                    }
                    if this.is_terminated() {
                        TickControl::Stop
                    } else {
                        TickControl::Continue
                    }
                }
            },
        );

        let this = Arc::clone(self);
        let poll = RepeatingTask::spawn("freshness-poll", self.config.poll_interval(), move || {
            let this = Arc::clone(&this);
            async move {
                if this.is_terminated() {
                    return TickControl::Stop;
                }
                if let Err(e) = this.poll_tick().await {
                    tracing::warn!(album_id = %this.album_id, error = %e, "Freshness check failed");
                }
                if this.is_terminated() {
                    TickControl::Stop
                } else {
                    TickControl::Continue
                }
            }
        });

        tracing::info!(
            album_id = %self.album_id,
            auto_save_secs = self.config.auto_save_interval_secs,
            poll_secs = self.config.poll_interval_secs,
            "Sync started"
        );
        SyncHandle { auto_save, poll }
    }
}

/// Running background loops of one coordinator
#[derive(Debug)]
pub struct SyncHandle {
    auto_save: RepeatingTask,
    poll: RepeatingTask,
}

impl SyncHandle {
    pub fn stop(&self) {
        self.auto_save.stop();
        self.poll.stop();
    }

    pub async fn shutdown(self) {
        self.auto_save.shutdown().await;
        self.poll.shutdown().await;
    }

    pub fn is_running(&self) -> bool {
        !self.auto_save.is_finished() || !self.poll.is_finished()
    }
}
