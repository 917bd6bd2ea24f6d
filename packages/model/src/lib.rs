//! # Folio Model
//!
//! The album document: a versioned tree of folders with flat image and text
//! arrays per subtree, plus the layout geometry the folders refer to.
//!
//! Everything here is a plain value. Transforms happen on explicit clones so
//! that history and conflict replacement can swap whole trees.

mod error;
mod fingerprint;
mod ids;
mod layout;
mod structure;
mod tree;
mod visitor;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use error::{ModelError, ModelResult};
pub use fingerprint::{stripped_json, Fingerprint};
pub use ids::{AlbumId, FolderId, LayoutId};
pub use layout::{AlbumMode, Frame, FrameKind, Layout};
pub use structure::{check_structure, StructureIssue};
pub use tree::{
    AlbumAttributes, AlbumTree, Detached, Direction, Folder, FolderRef, Image, Subtree,
    SubtreeKind, Text, VersionMarker,
};
pub use visitor::{walk_folder, walk_subtree, walk_tree, TreeStats, Visitor};
