//! Structural invariant checks.
//!
//! Remote trees are trusted but not blindly: issues are reported so they can
//! be logged or shown by tooling. None of them stop an editing session.

use crate::ids::FolderId;
use crate::tree::{AlbumTree, Folder, SubtreeKind};
use crate::visitor::{walk_folder, Visitor};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureIssue {
    /// The same non-empty id appears twice in one subtree
    DuplicateFolderId { subtree: SubtreeKind, id: FolderId },

    /// Image references no folder, or references the empty id
    OrphanImage { subtree: SubtreeKind, id: FolderId },

    /// Text references no folder, or references the empty id
    OrphanText { subtree: SubtreeKind, id: FolderId },

    /// Folder nested below the slot level
    TooDeep {
        subtree: SubtreeKind,
        id: FolderId,
        depth: usize,
    },
}

impl fmt::Display for StructureIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureIssue::DuplicateFolderId { subtree, id } => {
                write!(f, "{:?}: folder id {} is used more than once", subtree, id)
            }
            StructureIssue::OrphanImage { subtree, id } => {
                write!(f, "{:?}: image references missing folder {}", subtree, id)
            }
            StructureIssue::OrphanText { subtree, id } => {
                write!(f, "{:?}: text references missing folder {}", subtree, id)
            }
            StructureIssue::TooDeep { subtree, id, depth } => {
                write!(f, "{:?}: folder {} is nested too deep ({})", subtree, id, depth)
            }
        }
    }
}

/// Check every structural invariant of the tree
pub fn check_structure(tree: &AlbumTree) -> Vec<StructureIssue> {
    let mut checker = StructureChecker::default();
    checker.visit_tree(tree);

    let mut issues = checker.issues;
    for kind in [SubtreeKind::Book, SubtreeKind::Cover] {
        let subtree = tree.subtree(kind);
        let known: HashSet<FolderId> = subtree.folder_ids().into_iter().collect();

        for image in &subtree.images {
            if !known.contains(&image.folder_id) {
                issues.push(StructureIssue::OrphanImage {
                    subtree: kind,
                    id: image.folder_id,
                });
            }
        }
        for text in &subtree.texts {
            if !known.contains(&text.folder_id) {
                issues.push(StructureIssue::OrphanText {
                    subtree: kind,
                    id: text.folder_id,
                });
            }
        }
    }

    issues
}

#[derive(Default)]
struct StructureChecker {
    seen: HashSet<(SubtreeKind, FolderId)>,
    issues: Vec<StructureIssue>,
}

impl Visitor for StructureChecker {
    fn visit_folder(&mut self, kind: SubtreeKind, folder: &Folder, depth: usize) {
        let id = folder.folder_id;

        if id.is_occupied() && !self.seen.insert((kind, id)) {
            self.issues
                .push(StructureIssue::DuplicateFolderId { subtree: kind, id });
        }
        if depth > kind.slot_depth() {
            self.issues.push(StructureIssue::TooDeep {
                subtree: kind,
                id,
                depth,
            });
        }

        walk_folder(self, kind, folder, depth);
    }
}
