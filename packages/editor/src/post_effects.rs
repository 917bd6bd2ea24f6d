//! # Post-Effect System
//!
//! Mutations trigger cascading effects to keep the album consistent.
//!
//! ## Design
//!
//! When a mutation is applied, it may require additional changes:
//! - Removing a folder → drop images and texts that pointed into it
//! - Changing a page's slot count → pick a layout that fits the new count
//!
//! Post-effects only look at the tree before and after the primary mutation.
//! Their output is plain secondary mutations, so the document store records
//! them in the same history entry as the mutation that caused them.

use crate::errors::EditorResult;
use crate::mutations::Mutation;
use folio_layout::LayoutResolver;
use folio_model::{AlbumTree, FolderId, SubtreeKind};
use std::collections::HashSet;

/// Trees around a primary mutation plus the resolver used for corrections
pub struct EffectContext<'a> {
    pub before: &'a AlbumTree,
    pub after: &'a AlbumTree,
    pub resolver: &'a mut LayoutResolver,
}

/// Post-effect that can be triggered by a mutation
pub trait PostEffect: std::fmt::Debug + Send {
    /// Analyze the mutation and generate secondary mutations if needed
    fn analyze(&self, mutation: &Mutation, ctx: &mut EffectContext<'_>) -> EditorResult<Vec<Mutation>>;
}

/// Drop content whose folder was removed by the mutation
#[derive(Debug)]
pub struct PruneOrphanedContent;

impl PostEffect for PruneOrphanedContent {
    fn analyze(&self, _mutation: &Mutation, ctx: &mut EffectContext<'_>) -> EditorResult<Vec<Mutation>> {
        let mut out = Vec::new();

        for kind in [SubtreeKind::Book, SubtreeKind::Cover] {
            let after = ctx.after.subtree(kind);
            let remaining: HashSet<FolderId> = after.folder_ids().into_iter().collect();
            let removed: HashSet<FolderId> = ctx
                .before
                .subtree(kind)
                .folder_ids()
                .into_iter()
                .filter(|id| !remaining.contains(id))
                .collect();

            if removed.is_empty() {
                continue;
            }

            let mut orphans: Vec<FolderId> = after
                .images
                .iter()
                .map(|i| i.folder_id)
                .chain(after.texts.iter().map(|t| t.folder_id))
                .filter(|id| removed.contains(id))
                .collect();
            orphans.sort();
            orphans.dedup();

            if !orphans.is_empty() {
                tracing::debug!(subtree = ?kind, count = orphans.len(), "Pruning orphaned content");
                out.push(Mutation::RemoveImages {
                    subtree: kind,
                    folder_ids: orphans,
                });
            }
        }

        Ok(out)
    }
}

/// Re-pick layouts for folders whose slot count changed
#[derive(Debug)]
pub struct RevalidateLayouts;

impl PostEffect for RevalidateLayouts {
    fn analyze(&self, mutation: &Mutation, ctx: &mut EffectContext<'_>) -> EditorResult<Vec<Mutation>> {
        let mut out = Vec::new();

        for folder in mutation.affected_layout_folders(ctx.before) {
            if let Some(correction) = ctx.resolver.check_folder(ctx.after, folder)? {
                out.push(Mutation::SetLayout {
                    folder: correction.folder,
                    layout_id: correction.to,
                });
            }
        }

        Ok(out)
    }
}

/// Post-effect engine that applies all registered effects
#[derive(Debug)]
pub struct PostEffectEngine {
    effects: Vec<Box<dyn PostEffect>>,
}

impl PostEffectEngine {
    /// Create engine with default effects
    pub fn new() -> Self {
        Self {
            effects: vec![Box::new(PruneOrphanedContent), Box::new(RevalidateLayouts)],
        }
    }

    /// Engine that applies mutations without any follow-up
    pub fn empty() -> Self {
        Self { effects: Vec::new() }
    }

    /// Analyze a mutation and generate all secondary mutations
    pub fn analyze(&self, mutation: &Mutation, ctx: &mut EffectContext<'_>) -> EditorResult<Vec<Mutation>> {
        let mut secondary_mutations = Vec::new();

        for effect in &self.effects {
            let mut effect_mutations = effect.analyze(mutation, ctx)?;
            secondary_mutations.append(&mut effect_mutations);
        }

        Ok(secondary_mutations)
    }

    /// Apply a mutation with all its post-effects to a copy of `before`.
    ///
    /// Returns the new tree and the secondary mutations that were applied.
    /// `before` is never touched, so a failure leaves nothing to roll back.
    pub fn apply_with_effects(
        &self,
        mutation: &Mutation,
        before: &AlbumTree,
        resolver: &mut LayoutResolver,
    ) -> EditorResult<(AlbumTree, Vec<Mutation>)> {
        let catalog = resolver.catalog().clone();
        let mut after = before.clone();

        // Apply primary mutation
        mutation.apply(&mut after, &catalog)?;

        // Generate and apply secondary mutations
        let secondary = {
            let mut ctx = EffectContext {
                before,
                after: &after,
                resolver,
            };
            self.analyze(mutation, &mut ctx)?
        };
        for secondary_mutation in &secondary {
            secondary_mutation.apply(&mut after, &catalog)?;
        }

        Ok((after, secondary))
    }
}

impl Default for PostEffectEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_layout::fixtures::sample_catalog;
    use folio_model::{fixtures, Folder, FolderRef, LayoutId};
    use std::sync::Arc;

    fn resolver() -> LayoutResolver {
        LayoutResolver::with_seed(Arc::new(sample_catalog()), 1)
    }

    #[test]
    fn test_post_effect_engine_creation() {
        let engine = PostEffectEngine::new();
        assert_eq!(engine.effects.len(), 2);
    }

    #[test]
    fn test_theme_change_has_no_effects() {
        let engine = PostEffectEngine::new();
        let tree = fixtures::sample_tree();
        let mut resolver = resolver();

        let mutation = Mutation::SetTheme {
            theme_id: Some("winter".to_string()),
        };
        let (after, secondary) = engine
            .apply_with_effects(&mutation, &tree, &mut resolver)
            .unwrap();

        assert!(secondary.is_empty());
        assert_eq!(after.attributes.theme_id.as_deref(), Some("winter"));
    }

    #[test]
    fn test_removing_a_spread_prunes_its_content() {
        let engine = PostEffectEngine::new();
        let tree = fixtures::sample_tree();
        let mut resolver = resolver();

        let mutation = Mutation::RemoveFolder {
            folder: FolderRef::book(2),
        };
        let (after, secondary) = engine
            .apply_with_effects(&mutation, &tree, &mut resolver)
            .unwrap();

        assert_eq!(
            secondary,
            vec![Mutation::RemoveImages {
                subtree: SubtreeKind::Book,
                folder_ids: [21, 211, 212, 213].into_iter().map(FolderId::new).collect(),
            }]
        );
        assert_eq!(after.book.images.len(), 3);
        assert!(after.book.texts.is_empty());
        assert_eq!(after.cover, tree.cover);
    }

    #[test]
    fn test_slot_insert_revalidates_page_layout() {
        let engine = PostEffectEngine::new();
        let tree = fixtures::sample_tree();
        let mut resolver = resolver();

        let mutation = Mutation::InsertFolder {
            subtree: SubtreeKind::Book,
            parent: Some(FolderId::new(11)),
            index: 2,
            folder: Folder::new(113),
        };
        let (after, secondary) = engine
            .apply_with_effects(&mutation, &tree, &mut resolver)
            .unwrap();

        assert_eq!(secondary.len(), 1);
        let layout = after.find_folder(FolderRef::book(11)).unwrap().layout_id;
        assert!([Some(LayoutId(130)), Some(LayoutId(131))].contains(&layout));
        // The input tree is untouched
        assert_eq!(tree, fixtures::sample_tree());
    }

    #[test]
    fn test_new_pages_get_layouts() {
        let engine = PostEffectEngine::new();
        let tree = fixtures::sample_tree();
        let mut resolver = resolver();

        let mutation = Mutation::InsertFolder {
            subtree: SubtreeKind::Book,
            parent: None,
            index: 2,
            folder: Folder::new(3).with_children(vec![Folder::new(31), Folder::new(32)]),
        };
        let (after, secondary) = engine
            .apply_with_effects(&mutation, &tree, &mut resolver)
            .unwrap();

        assert_eq!(secondary.len(), 2);
        for id in [31, 32] {
            let layout = after.find_folder(FolderRef::book(id)).unwrap().layout_id;
            assert!([Some(LayoutId(100)), Some(LayoutId(101))].contains(&layout));
        }
    }

    #[test]
    fn test_empty_engine_skips_effects() {
        let engine = PostEffectEngine::empty();
        let tree = fixtures::sample_tree();
        let mut resolver = resolver();

        let mutation = Mutation::RemoveFolder {
            folder: FolderRef::book(2),
        };
        let (after, secondary) = engine
            .apply_with_effects(&mutation, &tree, &mut resolver)
            .unwrap();

        assert!(secondary.is_empty());
        assert_eq!(after.book.images.len(), 6);
    }
}
