//! # Undo/Redo Stack
//!
//! Tracks editing history as whole-tree snapshots.
//!
//! ## Design
//!
//! - Each applied mutation records the tree as it was before
//! - Undo swaps the current tree with the most recent snapshot and moves the
//!   replaced tree to the redo stack
//! - Redo swaps back
//! - New mutations clear the redo stack
//! - Batches group several mutations as one undo step
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = UndoStack::new();
//!
//! stack.record(tree.clone(), Some("Move"));
//! mutation.apply(&mut tree, &catalog)?;
//!
//! // Undo
//! stack.undo(&mut tree);
//!
//! // Redo
//! stack.redo(&mut tree);
//! ```

use folio_model::AlbumTree;
use std::mem;

/// Tree snapshot plus the label of the step that replaced it
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub tree: AlbumTree,

    pub description: Option<String>,
}

/// A batch being recorded. Only the first snapshot is kept.
#[derive(Debug)]
struct PendingBatch {
    before: Option<AlbumTree>,
    description: Option<String>,
}

/// Undo/redo stack for album editing
#[derive(Debug)]
pub struct UndoStack {
    /// Snapshots before each step (most recent last)
    undo_stack: Vec<HistoryEntry>,

    /// Snapshots replaced by undo (most recent last)
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Currently building a batch
    current_batch: Option<PendingBatch>,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create an undo stack with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
        }
    }

    /// Record the tree as it was before a step
    pub fn record(&mut self, before: AlbumTree, description: Option<&str>) {
        if let Some(batch) = &mut self.current_batch {
            // Add to current batch
            if batch.before.is_none() {
                batch.before = Some(before);
            }
            return;
        }

        self.push_entry(HistoryEntry {
            tree: before,
            description: description.map(str::to_string),
        });
    }

    /// Start a batch of steps (will be undone/redone together)
    pub fn begin_batch(&mut self, description: impl Into<String>) {
        self.end_batch();
        self.current_batch = Some(PendingBatch {
            before: None,
            description: Some(description.into()),
        });
    }

    /// End the current batch and push to undo stack
    pub fn end_batch(&mut self) {
        if let Some(batch) = self.current_batch.take() {
            if let Some(before) = batch.before {
                self.push_entry(HistoryEntry {
                    tree: before,
                    description: batch.description,
                });
            }
        }
    }

    pub fn is_batching(&self) -> bool {
        self.current_batch.is_some()
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // Clear redo stack (new action invalidates future)
        self.redo_stack.clear();
    }

    /// Swap `current` with the most recent snapshot. `false` if there is
    /// nothing to undo.
    pub fn undo(&mut self, current: &mut AlbumTree) -> bool {
        self.end_batch();

        match self.undo_stack.pop() {
            Some(entry) => {
                let replaced = mem::replace(current, entry.tree);
                self.redo_stack.push(HistoryEntry {
                    tree: replaced,
                    description: entry.description,
                });
                true
            }
            None => false,
        }
    }

    /// Swap `current` with the most recently undone tree. `false` if there
    /// is nothing to redo.
    pub fn redo(&mut self, current: &mut AlbumTree) -> bool {
        self.end_batch();

        match self.redo_stack.pop() {
            Some(entry) => {
                let replaced = mem::replace(current, entry.tree);
                self.undo_stack.push(HistoryEntry {
                    tree: replaced,
                    description: entry.description,
                });
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current_batch = None;
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }

    /// Get description of the next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
