//! # Album Mutations
//!
//! High-level editing operations on an album tree.
//!
//! ## Design Principles
//!
//! 1. **Intent-preserving**: each mutation is one user-visible operation
//! 2. **Validated**: structure is checked before anything is touched
//! 3. **Whole-folder**: content moves with its folder, ids never change
//!
//! ## Mutation Semantics
//!
//! ### MoveFolder
//! - Relocates a folder inside its own subtree
//! - Fails if the new parent is the folder itself or one of its descendants
//! - Fails if the folder would change depth (a slot never becomes a page)
//!
//! ### InsertFolder / RemoveFolder
//! - Insert rejects ids already present in the subtree
//! - Remove takes all descendants with it; their content is pruned by
//!   `PruneOrphanedContent`
//!
//! ### RemoveImages
//! - Lenient: unknown ids are ignored so a retried delete never fails
//!
//! Slot counts changed by a mutation are re-validated afterwards by
//! `RevalidateLayouts`.

use folio_layout::{CatalogKey, LayoutCatalog, LayoutFamily};
use folio_model::{
    AlbumTree, Direction, Folder, FolderId, FolderRef, Image, LayoutId, SubtreeKind, Text,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Semantic mutations (intent-preserving operations)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Move a folder to a new parent at index. `None` moves it to the top
    /// level of its subtree.
    MoveFolder {
        folder: FolderRef,
        new_parent: Option<FolderId>,
        index: usize,
    },

    /// Insert a folder (with its children) under `parent`
    InsertFolder {
        subtree: SubtreeKind,
        parent: Option<FolderId>,
        index: usize,
        folder: Folder,
    },

    /// Remove a folder and all of its descendants
    RemoveFolder { folder: FolderRef },

    /// Assign a layout to a page or cover panel
    SetLayout { folder: FolderRef, layout_id: LayoutId },

    /// Set (or clear) the caption of a page or cover panel
    SetCaption {
        folder: FolderRef,
        content: Option<String>,
    },

    /// Put an image into a slot, replacing whatever was there
    PlaceImage {
        folder: FolderRef,
        source: String,
        width: u32,
        height: u32,
    },

    /// Remove slots and the content attached to them
    RemoveImages {
        subtree: SubtreeKind,
        folder_ids: Vec<FolderId>,
    },

    /// Rename the album. Blank titles clear it.
    SetTitle { title: Option<String> },

    SetTheme { theme_id: Option<String> },

    SetDirection { direction: Direction },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Folder not found: {0}")]
    NodeNotFound(FolderRef),

    #[error("Parent not found: {0}")]
    ParentNotFound(FolderRef),

    #[error("Empty placeholder folders cannot be addressed")]
    EmptyId,

    #[error("Folder id already in use: {0}")]
    DuplicateId(FolderRef),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("Folder depth would change from {expected} to {found}")]
    DepthMismatch { expected: usize, found: usize },

    #[error("{folder} cannot hold more than {max} item(s)")]
    CapacityExceeded { folder: FolderRef, max: usize },

    #[error("{0} does not carry a layout")]
    NotALayoutFolder(FolderRef),

    #[error("{0} is not a content slot")]
    NotASlot(FolderRef),

    #[error("Layout {0} is not available for this folder")]
    UnknownLayout(LayoutId),

    #[error("Layout {layout} does not fit {count} item(s)")]
    LayoutMismatch { layout: LayoutId, count: usize },

    #[error("{feature} are not available on {folder}")]
    FeatureUnavailable {
        folder: FolderRef,
        feature: &'static str,
    },

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

/// Outcome of applying a mutation through the document store
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    /// Store revision after the mutation
    pub revision: u64,

    /// Mutations generated by post-effects, in application order
    pub secondary: Vec<Mutation>,
}

impl Mutation {
    /// Apply mutation to the tree with validation
    pub fn apply(&self, tree: &mut AlbumTree, catalog: &LayoutCatalog) -> Result<(), MutationError> {
        // Validate first
        self.validate(tree, catalog)?;

        match self {
            Mutation::MoveFolder {
                folder,
                new_parent,
                index,
            } => Self::apply_move(tree, *folder, *new_parent, *index),

            Mutation::InsertFolder {
                subtree,
                parent,
                index,
                folder,
            } => Self::apply_insert(tree, *subtree, *parent, *index, folder),

            Mutation::RemoveFolder { folder } => {
                tree.subtree_mut(folder.subtree)
                    .detach(folder.id)
                    .ok_or(MutationError::NodeNotFound(*folder))?;
                Ok(())
            }

            Mutation::SetLayout { folder, layout_id } => {
                let node = tree
                    .find_folder_mut(*folder)
                    .ok_or(MutationError::NodeNotFound(*folder))?;
                node.layout_id = Some(*layout_id);
                Ok(())
            }

            Mutation::SetCaption { folder, content } => {
                Self::apply_caption(tree, *folder, content.as_deref());
                Ok(())
            }

            Mutation::PlaceImage {
                folder,
                source,
                width,
                height,
            } => {
                let images = &mut tree.subtree_mut(folder.subtree).images;
                let image = Image {
                    folder_id: folder.id,
                    source: source.clone(),
                    width: *width,
                    height: *height,
                };
                match images.iter_mut().find(|i| i.folder_id == folder.id) {
                    Some(existing) => *existing = image,
                    None => images.push(image),
                }
                Ok(())
            }

            Mutation::RemoveImages {
                subtree,
                folder_ids,
            } => {
                Self::apply_remove_images(tree, *subtree, folder_ids);
                Ok(())
            }

            Mutation::SetTitle { title } => {
                tree.attributes.title = title
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string);
                Ok(())
            }

            Mutation::SetTheme { theme_id } => {
                tree.attributes.theme_id = theme_id.clone();
                Ok(())
            }

            Mutation::SetDirection { direction } => {
                tree.attributes.direction = *direction;
                Ok(())
            }
        }
    }

    fn apply_move(
        tree: &mut AlbumTree,
        folder: FolderRef,
        new_parent: Option<FolderId>,
        index: usize,
    ) -> Result<(), MutationError> {
        let subtree = tree.subtree_mut(folder.subtree);

        // Find and remove the folder from its current parent
        let detached = subtree
            .detach(folder.id)
            .ok_or(MutationError::NodeNotFound(folder))?;

        // Find new parent and insert at index
        let siblings = subtree
            .children_mut(new_parent)
            .ok_or_else(|| MutationError::ParentNotFound(parent_ref(folder.subtree, new_parent)))?;
        let insert_index = index.min(siblings.len());
        siblings.insert(insert_index, detached.folder);
        Ok(())
    }

    fn apply_insert(
        tree: &mut AlbumTree,
        kind: SubtreeKind,
        parent: Option<FolderId>,
        index: usize,
        folder: &Folder,
    ) -> Result<(), MutationError> {
        let siblings = tree
            .subtree_mut(kind)
            .children_mut(parent)
            .ok_or_else(|| MutationError::ParentNotFound(parent_ref(kind, parent)))?;
        let insert_index = index.min(siblings.len());
        siblings.insert(insert_index, folder.clone());
        Ok(())
    }

    fn apply_caption(tree: &mut AlbumTree, folder: FolderRef, content: Option<&str>) {
        let texts = &mut tree.subtree_mut(folder.subtree).texts;
        match content {
            Some(content) => match texts.iter_mut().find(|t| t.folder_id == folder.id) {
                Some(existing) => existing.content = content.to_string(),
                None => texts.push(Text {
                    folder_id: folder.id,
                    content: content.to_string(),
                }),
            },
            None => texts.retain(|t| t.folder_id != folder.id),
        }
    }

    fn apply_remove_images(tree: &mut AlbumTree, kind: SubtreeKind, folder_ids: &[FolderId]) {
        let subtree = tree.subtree_mut(kind);
        let targets: HashSet<FolderId> = folder_ids
            .iter()
            .copied()
            .filter(|id| id.is_occupied())
            .collect();

        // Only slots are removed here, pages and spreads stay put. Ids that
        // are already gone still drop their content.
        let mut removed = HashSet::new();
        for id in targets {
            match subtree.depth_of(id) {
                Some(depth) if depth == kind.slot_depth() => {
                    subtree.detach(id);
                    removed.insert(id);
                }
                Some(_) => {}
                None => {
                    removed.insert(id);
                }
            }
        }

        subtree.images.retain(|i| !removed.contains(&i.folder_id));
        subtree.texts.retain(|t| !removed.contains(&t.folder_id));
    }

    /// Validate without applying
    pub fn validate(&self, tree: &AlbumTree, catalog: &LayoutCatalog) -> Result<(), MutationError> {
        match self {
            Mutation::MoveFolder {
                folder, new_parent, ..
            } => {
                let subtree = tree.subtree(folder.subtree);
                require(tree, *folder)?;
                let current_depth = subtree
                    .depth_of(folder.id)
                    .ok_or(MutationError::NodeNotFound(*folder))?;

                let new_depth = match new_parent {
                    Some(pid) => {
                        let parent = parent_ref(folder.subtree, Some(*pid));
                        let depth = subtree
                            .depth_of(*pid)
                            .ok_or(MutationError::ParentNotFound(parent))?;

                        // Check not moving into itself or a descendant
                        if subtree.is_ancestor(folder.id, *pid) {
                            return Err(MutationError::CycleDetected);
                        }
                        depth + 1
                    }
                    None => 0,
                };

                if new_depth != current_depth {
                    return Err(MutationError::DepthMismatch {
                        expected: current_depth,
                        found: new_depth,
                    });
                }

                // A slot moving onto another page takes a place there
                let old_parent = subtree.parent_of(folder.id).map(|p| p.folder_id);
                if let Some(pid) = new_parent {
                    if Some(*pid) != old_parent && new_depth == folder.subtree.slot_depth() {
                        check_capacity(tree, catalog, FolderRef::new(folder.subtree, *pid), 1)?;
                    }
                }
                Ok(())
            }

            Mutation::InsertFolder {
                subtree: kind,
                parent,
                folder,
                ..
            } => {
                let subtree = tree.subtree(*kind);
                let depth = match parent {
                    Some(pid) => {
                        subtree
                            .depth_of(*pid)
                            .ok_or_else(|| MutationError::ParentNotFound(parent_ref(*kind, *parent)))?
                            + 1
                    }
                    None => 0,
                };

                let bottom = depth + height(folder);
                if bottom > kind.slot_depth() {
                    return Err(MutationError::DepthMismatch {
                        expected: kind.slot_depth(),
                        found: bottom,
                    });
                }

                // Ids must be unique in the subtree and inside the new folder
                let mut ids = Vec::new();
                folder.collect_ids(&mut ids);
                let mut seen = HashSet::new();
                for id in ids {
                    if subtree.contains(id) || !seen.insert(id) {
                        return Err(MutationError::DuplicateId(FolderRef::new(*kind, id)));
                    }
                }

                let layout_depth = kind.layout_depth();
                if depth == kind.slot_depth() {
                    if let (Some(pid), true) = (parent, folder.folder_id.is_occupied()) {
                        check_capacity(tree, catalog, FolderRef::new(*kind, *pid), 1)?;
                    }
                } else if depth <= layout_depth {
                    let max = max_count(tree, catalog, *kind);
                    for owner in folders_at(folder, layout_depth - depth) {
                        if owner.occupied_count() > max {
                            return Err(MutationError::CapacityExceeded {
                                folder: FolderRef::new(*kind, owner.folder_id),
                                max,
                            });
                        }
                    }
                }
                Ok(())
            }

            Mutation::RemoveFolder { folder } => {
                require(tree, *folder)?;
                Ok(())
            }

            Mutation::SetLayout { folder, layout_id } => {
                let node = require_layout_folder(tree, *folder)?;
                let key = CatalogKey::for_subtree(folder.subtree, tree.mode());
                let group = catalog.group(key);

                if !group.contains(*layout_id) {
                    return Err(MutationError::UnknownLayout(*layout_id));
                }
                let count = node.occupied_count();
                if !group.supports(*layout_id, count) {
                    return Err(MutationError::LayoutMismatch {
                        layout: *layout_id,
                        count,
                    });
                }
                Ok(())
            }

            Mutation::SetCaption { folder, content } => {
                let node = require_layout_folder(tree, *folder)?;
                if content.is_none() {
                    return Ok(());
                }

                let key = CatalogKey::for_subtree(folder.subtree, tree.mode());
                let allowed = node
                    .layout_id
                    .and_then(|id| catalog.layout(key, id))
                    .map(|layout| LayoutFamily::classify(layout).allows_captions())
                    .unwrap_or(false);
                if !allowed {
                    return Err(MutationError::FeatureUnavailable {
                        folder: *folder,
                        feature: "Captions",
                    });
                }
                Ok(())
            }

            Mutation::PlaceImage { folder, .. } => {
                require(tree, *folder)?;
                if tree.subtree(folder.subtree).depth_of(folder.id)
                    != Some(folder.subtree.slot_depth())
                {
                    return Err(MutationError::NotASlot(*folder));
                }
                Ok(())
            }

            Mutation::RemoveImages { .. }
            | Mutation::SetTitle { .. }
            | Mutation::SetTheme { .. }
            | Mutation::SetDirection { .. } => Ok(()),
        }
    }

    /// Layout-bearing folders whose slot count this mutation may change,
    /// resolved against the tree before the mutation
    pub fn affected_layout_folders(&self, before: &AlbumTree) -> Vec<FolderRef> {
        let mut out = Vec::new();

        match self {
            Mutation::MoveFolder {
                folder, new_parent, ..
            } => {
                out.extend(owner_above(before, *folder));
                if let Some(pid) = new_parent {
                    out.extend(owner_of(before, FolderRef::new(folder.subtree, *pid)));
                }
            }

            Mutation::InsertFolder {
                subtree: kind,
                parent,
                folder,
                ..
            } => {
                let depth = match parent {
                    Some(pid) => {
                        out.extend(owner_of(before, FolderRef::new(*kind, *pid)));
                        before.subtree(*kind).depth_of(*pid).map(|d| d + 1)
                    }
                    None => Some(0),
                };

                // New pages (or pages inside a new spread) need a layout
                if let Some(depth) = depth {
                    if depth <= kind.layout_depth() {
                        out.extend(
                            folders_at(folder, kind.layout_depth() - depth)
                                .into_iter()
                                .filter(|f| f.folder_id.is_occupied())
                                .map(|f| FolderRef::new(*kind, f.folder_id)),
                        );
                    }
                }
            }

            Mutation::RemoveFolder { folder } => {
                out.extend(owner_above(before, *folder));
            }

            Mutation::RemoveImages {
                subtree,
                folder_ids,
            } => {
                for id in folder_ids {
                    out.extend(owner_above(before, FolderRef::new(*subtree, *id)));
                }
            }

            Mutation::SetLayout { folder, .. } => out.push(*folder),

            Mutation::SetCaption { .. }
            | Mutation::PlaceImage { .. }
            | Mutation::SetTitle { .. }
            | Mutation::SetTheme { .. }
            | Mutation::SetDirection { .. } => {}
        }

        let mut seen = HashSet::new();
        out.retain(|f| seen.insert(*f));
        out
    }

    /// Short label for history entries
    pub fn describe(&self) -> &'static str {
        match self {
            Mutation::MoveFolder { .. } => "Move",
            Mutation::InsertFolder { .. } => "Insert",
            Mutation::RemoveFolder { .. } => "Remove",
            Mutation::SetLayout { .. } => "Change layout",
            Mutation::SetCaption { .. } => "Edit caption",
            Mutation::PlaceImage { .. } => "Place photo",
            Mutation::RemoveImages { .. } => "Delete photos",
            Mutation::SetTitle { .. } => "Rename album",
            Mutation::SetTheme { .. } => "Change theme",
            Mutation::SetDirection { .. } => "Change reading direction",
        }
    }
}

fn parent_ref(kind: SubtreeKind, parent: Option<FolderId>) -> FolderRef {
    FolderRef::new(kind, parent.unwrap_or(FolderId::EMPTY))
}

fn require(tree: &AlbumTree, folder: FolderRef) -> Result<&Folder, MutationError> {
    if folder.id.is_empty() {
        return Err(MutationError::EmptyId);
    }
    tree.find_folder(folder)
        .ok_or(MutationError::NodeNotFound(folder))
}

fn require_layout_folder(tree: &AlbumTree, folder: FolderRef) -> Result<&Folder, MutationError> {
    let node = require(tree, folder)?;
    if !tree.is_layout_folder(folder) {
        return Err(MutationError::NotALayoutFolder(folder));
    }
    Ok(node)
}

fn max_count(tree: &AlbumTree, catalog: &LayoutCatalog, kind: SubtreeKind) -> usize {
    catalog
        .group(CatalogKey::for_subtree(kind, tree.mode()))
        .max_count()
}

fn check_capacity(
    tree: &AlbumTree,
    catalog: &LayoutCatalog,
    owner: FolderRef,
    adding: usize,
) -> Result<(), MutationError> {
    let Some(node) = tree.find_folder(owner) else {
        return Ok(());
    };
    let max = max_count(tree, catalog, owner.subtree);
    if node.occupied_count() + adding > max {
        return Err(MutationError::CapacityExceeded { folder: owner, max });
    }
    Ok(())
}

/// Levels below `folder` (0 for a leaf)
fn height(folder: &Folder) -> usize {
    folder
        .children
        .iter()
        .map(|c| height(c) + 1)
        .max()
        .unwrap_or(0)
}

/// Descendants `depth` levels below `folder` (the folder itself for 0)
fn folders_at(folder: &Folder, depth: usize) -> Vec<&Folder> {
    if depth == 0 {
        return vec![folder];
    }
    folder
        .children
        .iter()
        .flat_map(|c| folders_at(c, depth - 1))
        .collect()
}

/// Layout folder on the path to `folder`, the folder itself included
fn owner_of(tree: &AlbumTree, folder: FolderRef) -> Option<FolderRef> {
    let path = tree.subtree(folder.subtree).path_to(folder.id)?;
    path.get(folder.subtree.layout_depth())
        .map(|id| FolderRef::new(folder.subtree, *id))
}

/// Layout folder strictly above `folder`
fn owner_above(tree: &AlbumTree, folder: FolderRef) -> Option<FolderRef> {
    let mut path = tree.subtree(folder.subtree).path_to(folder.id)?;
    path.pop();
    path.get(folder.subtree.layout_depth())
        .map(|id| FolderRef::new(folder.subtree, *id))
}
