//! # Layout Resolver
//!
//! Keeps every layout-bearing folder on a layout that fits its content.
//!
//! - `validate` keeps a layout when it belongs to the right group and
//!   supports the folder's occupied-slot count, otherwise it picks another one
//! - `pick_random` chooses uniformly within a bucket, avoiding the layout the
//!   folder had before so a content change visibly changes the page
//! - an empty bucket is a catalog configuration error and is reported, never
//!   papered over with a wrong-shaped layout

use crate::catalog::{CatalogKey, LayoutCatalog};
use crate::error::{LayoutError, LayoutResult};
use crate::family::LayoutFamily;
use folio_model::{AlbumTree, FolderRef, LayoutId, SubtreeKind};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;

/// A layout replaced because it no longer fit its folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub folder: FolderRef,
    pub from: Option<LayoutId>,
    pub to: LayoutId,
    pub content_count: usize,
}

#[derive(Debug, Clone)]
pub struct LayoutResolver {
    catalog: Arc<LayoutCatalog>,
    rng: StdRng,
}

impl LayoutResolver {
    pub fn new(catalog: Arc<LayoutCatalog>) -> Self {
        Self {
            catalog,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic choices, for tests and reproducible tooling runs
    pub fn with_seed(catalog: Arc<LayoutCatalog>, seed: u64) -> Self {
        Self {
            catalog,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn catalog(&self) -> &Arc<LayoutCatalog> {
        &self.catalog
    }

    /// Return `layout_id` if it fits `content_count` in the group, otherwise a
    /// replacement from the matching bucket
    pub fn validate(
        &mut self,
        layout_id: Option<LayoutId>,
        content_count: usize,
        key: impl Into<CatalogKey>,
    ) -> LayoutResult<LayoutId> {
        let key = key.into();

        if let Some(id) = layout_id {
            if self.catalog.group(key).supports(id, content_count) {
                return Ok(id);
            }
        }

        let replacement = self.pick_random(content_count, key, layout_id)?;
        tracing::warn!(
            catalog = %key,
            content_count,
            from = ?layout_id,
            to = %replacement,
            "Layout does not fit content, correcting"
        );
        Ok(replacement)
    }

    /// Uniform choice from the `(count, key)` bucket.
    ///
    /// `excluding` is skipped whenever the bucket offers anything else.
    pub fn pick_random(
        &mut self,
        count: usize,
        key: impl Into<CatalogKey>,
        excluding: Option<LayoutId>,
    ) -> LayoutResult<LayoutId> {
        let key = key.into();
        let bucket = self.catalog.group(key).bucket(count);

        let candidates: Vec<LayoutId> = bucket
            .iter()
            .copied()
            .filter(|id| Some(*id) != excluding)
            .collect();
        let pool = if candidates.is_empty() {
            bucket
        } else {
            candidates.as_slice()
        };

        pool.choose(&mut self.rng)
            .copied()
            .ok_or(LayoutError::EmptyBucket { count, key })
    }

    /// Family of a layout in the group used by `key`
    pub fn family_of(&self, id: LayoutId, key: impl Into<CatalogKey>) -> Option<LayoutFamily> {
        self.catalog
            .layout(key.into(), id)
            .map(LayoutFamily::classify)
    }

    /// Check one layout-bearing folder. `None` when it is fine or not a
    /// layout-bearing folder at all.
    pub fn check_folder(
        &mut self,
        tree: &AlbumTree,
        folder: FolderRef,
    ) -> LayoutResult<Option<Correction>> {
        if !tree.is_layout_folder(folder) {
            return Ok(None);
        }
        let Some(node) = tree.find_folder(folder) else {
            return Ok(None);
        };

        let key = CatalogKey::for_subtree(folder.subtree, tree.mode());
        let content_count = node.occupied_count();
        let to = self.validate(node.layout_id, content_count, key)?;

        if node.layout_id == Some(to) {
            Ok(None)
        } else {
            Ok(Some(Correction {
                folder,
                from: node.layout_id,
                to,
                content_count,
            }))
        }
    }

    /// Validate every layout-bearing folder of both subtrees and apply the
    /// corrections in place
    pub fn reconcile(&mut self, tree: &mut AlbumTree) -> LayoutResult<Vec<Correction>> {
        let mut corrections = Vec::new();
        for folder in Self::layout_targets(tree) {
            if let Some(correction) = self.check_folder(tree, folder)? {
                if let Some(node) = tree.find_folder_mut(folder) {
                    node.layout_id = Some(correction.to);
                }
                corrections.push(correction);
            }
        }

        if !corrections.is_empty() {
            tracing::info!(count = corrections.len(), "Reconciled layouts");
        }
        Ok(corrections)
    }

    /// Like `reconcile`, but a folder that cannot be corrected keeps its
    /// layout and the error is logged. Used for trees that must be installed
    /// as they are.
    pub fn reconcile_lenient(&mut self, tree: &mut AlbumTree) -> Vec<Correction> {
        let mut corrections = Vec::new();
        for folder in Self::layout_targets(tree) {
            match self.check_folder(tree, folder) {
                Ok(Some(correction)) => {
                    if let Some(node) = tree.find_folder_mut(folder) {
                        node.layout_id = Some(correction.to);
                    }
                    corrections.push(correction);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(%folder, error = %e, "Left layout uncorrected");
                }
            }
        }

        if !corrections.is_empty() {
            tracing::info!(count = corrections.len(), "Reconciled layouts");
        }
        corrections
    }

    fn layout_targets(tree: &AlbumTree) -> Vec<FolderRef> {
        let mut targets = Vec::new();
        for kind in [SubtreeKind::Book, SubtreeKind::Cover] {
            targets.extend(
                tree.layout_folders(kind)
                    .into_iter()
                    .filter(|f| f.folder_id.is_occupied())
                    .map(|f| FolderRef::new(kind, f.folder_id)),
            );
        }
        targets
    }
}
