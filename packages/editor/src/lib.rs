//! # Folio Editor
//!
//! Core document editing engine for Folio albums.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: AlbumTree, folders, fingerprints     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: DocumentStore + mutations           │
//! │  - Apply mutations with validation          │
//! │  - Post-effects keep layouts consistent     │
//! │  - Snapshot undo/redo                       │
//! │  - Unsaved-change detection                 │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ sync: auto-save, freshness poll, conflicts  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Tree is source of truth**: the current tree is always a complete value
//! 2. **Server authority**: a newer remote tree replaces the local one
//! 3. **No merging**: history is cleared on replacement, never rebased
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::{DocumentStore, Mutation};
//!
//! let (mut store, _corrections) = DocumentStore::from_remote(tree, resolver)?;
//!
//! store.apply(Mutation::MoveFolder {
//!     folder: FolderRef::book(112),
//!     new_parent: Some(FolderId::new(12)),
//!     index: 0,
//! })?;
//!
//! assert!(store.has_unsaved_change());
//! store.undo();
//! ```

mod document;
mod errors;
mod mutations;
mod post_effects;
mod undo_stack;

pub use document::{DocumentStore, SharedDocument};
pub use errors::{EditorError, EditorResult};
pub use mutations::{Mutation, MutationError, MutationResult};
pub use post_effects::{
    EffectContext, PostEffect, PostEffectEngine, PruneOrphanedContent, RevalidateLayouts,
};
pub use undo_stack::{HistoryEntry, UndoStack};
