//! # Document Store
//!
//! One active album tree plus its editing history.
//!
//! ## Lifecycle
//!
//! ```text
//! Fetch → Reconcile → Edit ⇄ Undo/Redo → Persist → (Conflict → Replace)
//!   ↓         ↓          ↓                  ↓               ↓
//! Remote   Layouts   Mutations         Fingerprint     History cleared
//! ```
//!
//! Every edit runs on a clone of the current tree. The previous tree goes to
//! the undo stack untouched, so undo and redo are plain swaps. Change
//! detection compares fingerprints of the stripped tree, never markers.

use crate::errors::EditorResult;
use crate::mutations::{Mutation, MutationResult};
use crate::post_effects::PostEffectEngine;
use crate::undo_stack::UndoStack;
use folio_layout::{Correction, LayoutCatalog, LayoutResolver};
use folio_model::{check_structure, AlbumTree, Fingerprint, VersionMarker};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Editable album document
#[derive(Debug)]
pub struct DocumentStore {
    tree: AlbumTree,

    history: UndoStack,

    resolver: LayoutResolver,

    effects: PostEffectEngine,

    /// Fingerprint of the last tree known to match the remote
    persisted: Fingerprint,

    /// Increments on every change of the current tree
    revision: u64,
}

impl DocumentStore {
    /// Wrap a tree that is known to match the remote as-is
    pub fn new(tree: AlbumTree, resolver: LayoutResolver) -> EditorResult<Self> {
        let persisted = Fingerprint::of(&tree)?;
        Ok(Self {
            tree,
            history: UndoStack::new(),
            resolver,
            effects: PostEffectEngine::new(),
            persisted,
            revision: 0,
        })
    }

    /// Load a freshly fetched tree, correcting layouts that no longer fit
    pub fn from_remote(
        tree: AlbumTree,
        resolver: LayoutResolver,
    ) -> EditorResult<(Self, Vec<Correction>)> {
        let mut store = Self::new(tree.clone(), resolver)?;
        let corrections = store.replace_from_remote(tree)?;
        Ok((store, corrections))
    }

    pub fn with_history_limit(mut self, max_levels: usize) -> Self {
        self.history = UndoStack::with_max_levels(max_levels);
        self
    }

    pub fn with_effects(mut self, effects: PostEffectEngine) -> Self {
        self.effects = effects;
        self
    }

    /// Apply a mutation and its post-effects as one undo step
    pub fn apply(&mut self, mutation: Mutation) -> EditorResult<MutationResult> {
        let (next, secondary) =
            self.effects
                .apply_with_effects(&mutation, &self.tree, &mut self.resolver)?;

        tracing::debug!(
            mutation = mutation.describe(),
            secondary = secondary.len(),
            "Applied mutation"
        );
        Ok(self.commit(next, Some(mutation.describe()), secondary))
    }

    /// Apply several mutations as a single undo step. Nothing changes if any
    /// of them fails.
    pub fn apply_batch(
        &mut self,
        description: &str,
        mutations: Vec<Mutation>,
    ) -> EditorResult<MutationResult> {
        let mut next = self.tree.clone();
        let mut secondary = Vec::new();

        for mutation in &mutations {
            let (tree, mut effects) =
                self.effects
                    .apply_with_effects(mutation, &next, &mut self.resolver)?;
            next = tree;
            secondary.append(&mut effects);
        }

        tracing::debug!(
            description,
            count = mutations.len(),
            secondary = secondary.len(),
            "Applied batch"
        );
        Ok(self.commit(next, Some(description), secondary))
    }

    fn commit(
        &mut self,
        next: AlbumTree,
        description: Option<&str>,
        secondary: Vec<Mutation>,
    ) -> MutationResult {
        let before = std::mem::replace(&mut self.tree, next);
        self.history.record(before, description);
        self.revision += 1;

        MutationResult {
            revision: self.revision,
            secondary,
        }
    }

    /// Group the following `apply` calls into one undo step
    pub fn begin_batch(&mut self, description: impl Into<String>) {
        self.history.begin_batch(description);
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    /// Restore the tree before the last step. The current version marker is
    /// kept so the restored tree is persisted as a new edit.
    pub fn undo(&mut self) -> bool {
        let marker = self.tree.marker();
        if !self.history.undo(&mut self.tree) {
            return false;
        }
        self.tree.set_marker(marker);
        self.revision += 1;
        true
    }

    /// Re-apply the last undone step, keeping the current version marker
    pub fn redo(&mut self) -> bool {
        let marker = self.tree.marker();
        if !self.history.redo(&mut self.tree) {
            return false;
        }
        self.tree.set_marker(marker);
        self.revision += 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.history.undo_description()
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.history.redo_description()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn current(&self) -> &AlbumTree {
        &self.tree
    }

    /// Owned copy of the current tree, for work outside the lock
    pub fn snapshot(&self) -> AlbumTree {
        self.tree.clone()
    }

    pub fn fingerprint(&self) -> EditorResult<Fingerprint> {
        Ok(Fingerprint::of(&self.tree)?)
    }

    /// True when the current tree differs from the last persisted one
    pub fn has_unsaved_change(&self) -> bool {
        match Fingerprint::of(&self.tree) {
            Ok(fingerprint) => fingerprint != self.persisted,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fingerprint album tree");
                true
            }
        }
    }

    /// Record that a snapshot with `fingerprint` was accepted by the remote
    /// and adopt the marker it assigned. Edits made after the snapshot was
    /// taken stay unsaved.
    pub fn mark_persisted(&mut self, fingerprint: Fingerprint, marker: VersionMarker) {
        self.persisted = fingerprint;
        self.tree.set_marker(marker);
    }

    /// Replace the tree wholesale with a remote one and clear history.
    ///
    /// Layout corrections made while loading count as unsaved changes. A
    /// folder no layout fits is installed as the remote has it.
    pub fn replace_from_remote(&mut self, tree: AlbumTree) -> EditorResult<Vec<Correction>> {
        let server = Fingerprint::of(&tree)?;

        for issue in check_structure(&tree) {
            tracing::warn!(version = tree.version, %issue, "Remote tree has a structural issue");
        }

        let mut tree = tree;
        let corrections = self.resolver.reconcile_lenient(&mut tree);

        self.tree = tree;
        self.history.clear();
        self.persisted = server;
        self.revision += 1;

        tracing::info!(
            version = self.tree.version,
            corrections = corrections.len(),
            "Replaced album tree from remote"
        );
        Ok(corrections)
    }

    pub fn marker(&self) -> VersionMarker {
        self.tree.marker()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn catalog(&self) -> &Arc<LayoutCatalog> {
        self.resolver.catalog()
    }

    pub fn resolver_mut(&mut self) -> &mut LayoutResolver {
        &mut self.resolver
    }
}

/// Cloneable handle to a store shared between the interactive path and the
/// background sync flows. Locks are held for synchronous sections only.
#[derive(Debug, Clone)]
pub struct SharedDocument {
    inner: Arc<Mutex<DocumentStore>>,
}

impl SharedDocument {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Lock the store. A panic in another holder does not make the tree
    /// unusable, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, DocumentStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut DocumentStore) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn apply(&self, mutation: Mutation) -> EditorResult<MutationResult> {
        self.lock().apply(mutation)
    }

    pub fn undo(&self) -> bool {
        self.lock().undo()
    }

    pub fn redo(&self) -> bool {
        self.lock().redo()
    }

    pub fn snapshot(&self) -> AlbumTree {
        self.lock().snapshot()
    }

    pub fn has_unsaved_change(&self) -> bool {
        self.lock().has_unsaved_change()
    }

    pub fn marker(&self) -> VersionMarker {
        self.lock().marker()
    }
}
