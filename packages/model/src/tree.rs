//! # Album Tree
//!
//! The versioned album document.
//!
//! ```text
//! AlbumTree
//!  ├─ book:  spread → page → slot        (layouts live on pages)
//!  └─ cover: panel → slot                (layouts live on panels)
//! ```
//!
//! Images and texts are not owned by folders. Each subtree keeps one flat
//! array of each, keyed by `folderID`, and lookups scan those arrays.

use crate::ids::{FolderId, LayoutId};
use crate::layout::AlbumMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version marker assigned by the remote on every accepted write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionMarker {
    pub version: u64,
    pub creation_time: DateTime<Utc>,
}

impl VersionMarker {
    pub fn new(version: u64, creation_time: DateTime<Utc>) -> Self {
        Self {
            version,
            creation_time,
        }
    }

    /// True if `other` was assigned after this marker
    pub fn is_superseded_by(&self, other: &VersionMarker) -> bool {
        other.version > self.version
            || (other.version == self.version && other.creation_time > self.creation_time)
    }
}

impl fmt::Display for VersionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{} @ {}", self.version, self.creation_time.to_rfc3339())
    }
}

/// Reading order of the album
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

/// Global album attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumAttributes {
    /// Name shown on the shelf and the spine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub format: String,

    /// Layout family of the album (e.g. "classic", "dense")
    pub density: String,

    #[serde(default)]
    pub direction: Direction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,

    #[serde(default)]
    pub layflat: bool,
}

/// Root album document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumTree {
    pub version: u64,
    pub creation_time: DateTime<Utc>,

    #[serde(flatten)]
    pub attributes: AlbumAttributes,

    #[serde(default)]
    pub book: Subtree,

    #[serde(default)]
    pub cover: Subtree,
}

/// Which subtree a folder lives in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtreeKind {
    #[default]
    Book,
    Cover,
}

impl SubtreeKind {
    /// Depth at which folders carry a layout
    pub fn layout_depth(self) -> usize {
        match self {
            SubtreeKind::Book => 1,
            SubtreeKind::Cover => 0,
        }
    }

    /// Depth of content slots
    pub fn slot_depth(self) -> usize {
        self.layout_depth() + 1
    }
}

/// Address of a folder: ids are only unique within one subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderRef {
    #[serde(default)]
    pub subtree: SubtreeKind,
    pub id: FolderId,
}

impl FolderRef {
    pub fn new(subtree: SubtreeKind, id: FolderId) -> Self {
        Self { subtree, id }
    }

    pub fn book(id: u64) -> Self {
        Self::new(SubtreeKind::Book, FolderId::new(id))
    }

    pub fn cover(id: u64) -> Self {
        Self::new(SubtreeKind::Cover, FolderId::new(id))
    }
}

impl fmt::Display for FolderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subtree {
            SubtreeKind::Book => write!(f, "book:{}", self.id),
            SubtreeKind::Cover => write!(f, "cover:{}", self.id),
        }
    }
}

/// Folders plus the content arrays shared by all of them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subtree {
    #[serde(default)]
    pub folders: Vec<Folder>,

    #[serde(default)]
    pub images: Vec<Image>,

    #[serde(default)]
    pub texts: Vec<Text>,
}

/// Generic tree node: spread, page, cover panel or slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    #[serde(rename = "folderID", default)]
    pub folder_id: FolderId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<LayoutId>,

    #[serde(default)]
    pub children: Vec<Folder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(rename = "folderID", default)]
    pub folder_id: FolderId,

    /// Asset reference understood by the image service
    pub source: String,

    #[serde(default)]
    pub width: u32,

    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    #[serde(rename = "folderID", default)]
    pub folder_id: FolderId,

    pub content: String,
}

impl Folder {
    pub fn new(id: u64) -> Self {
        Self::with_id(FolderId::new(id))
    }

    pub fn with_id(folder_id: FolderId) -> Self {
        Self {
            folder_id,
            layout_id: None,
            children: Vec::new(),
        }
    }

    /// Empty slot placeholder
    pub fn placeholder() -> Self {
        Self::with_id(FolderId::EMPTY)
    }

    pub fn with_layout(mut self, layout_id: LayoutId) -> Self {
        self.layout_id = Some(layout_id);
        self
    }

    pub fn with_children(mut self, children: Vec<Folder>) -> Self {
        self.children = children;
        self
    }

    pub fn is_placeholder(&self) -> bool {
        self.folder_id.is_empty()
    }

    /// Children that hold content. Placeholders are never occupied.
    pub fn occupied_slots(&self) -> impl Iterator<Item = &Folder> {
        self.children.iter().filter(|c| c.folder_id.is_occupied())
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied_slots().count()
    }

    /// Collect this folder's id and all descendant ids (placeholders skipped)
    pub fn collect_ids(&self, out: &mut Vec<FolderId>) {
        if self.folder_id.is_occupied() {
            out.push(self.folder_id);
        }
        for child in &self.children {
            child.collect_ids(out);
        }
    }
}

impl Subtree {
    pub fn find_folder(&self, id: FolderId) -> Option<&Folder> {
        if id.is_empty() {
            return None;
        }
        find_in(&self.folders, id)
    }

    pub fn find_folder_mut(&mut self, id: FolderId) -> Option<&mut Folder> {
        if id.is_empty() {
            return None;
        }
        find_in_mut(&mut self.folders, id)
    }

    pub fn contains(&self, id: FolderId) -> bool {
        self.find_folder(id).is_some()
    }

    /// Parent folder of `id` (None for top-level or missing folders)
    pub fn parent_of(&self, id: FolderId) -> Option<&Folder> {
        let path = self.path_to(id)?;
        let parent = *path.iter().rev().nth(1)?;
        self.find_folder(parent)
    }

    pub fn depth_of(&self, id: FolderId) -> Option<usize> {
        self.path_to(id).map(|path| path.len() - 1)
    }

    /// Ids from the top-level ancestor down to `id` inclusive
    pub fn path_to(&self, id: FolderId) -> Option<Vec<FolderId>> {
        if id.is_empty() {
            return None;
        }
        let mut path = Vec::new();
        if path_in(&self.folders, id, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    /// True when `ancestor` is `id` itself or one of its ancestors
    pub fn is_ancestor(&self, ancestor: FolderId, id: FolderId) -> bool {
        self.path_to(id)
            .map(|path| path.contains(&ancestor))
            .unwrap_or(false)
    }

    pub fn folders_at_depth(&self, depth: usize) -> Vec<&Folder> {
        let mut out = Vec::new();
        collect_at_depth(&self.folders, depth, &mut out);
        out
    }

    /// All non-empty folder ids, depth-first
    pub fn folder_ids(&self) -> Vec<FolderId> {
        let mut ids = Vec::new();
        for folder in &self.folders {
            folder.collect_ids(&mut ids);
        }
        ids
    }

    /// Child list of `parent`, or the top-level list for `None`
    pub fn children_mut(&mut self, parent: Option<FolderId>) -> Option<&mut Vec<Folder>> {
        match parent {
            None => Some(&mut self.folders),
            Some(id) => self.find_folder_mut(id).map(|f| &mut f.children),
        }
    }

    /// Remove a folder from its parent, returning it with its former position
    pub fn detach(&mut self, id: FolderId) -> Option<Detached> {
        if id.is_empty() {
            return None;
        }
        let parent = self.parent_of(id).map(|p| p.folder_id);
        let siblings = self.children_mut(parent)?;
        let index = siblings.iter().position(|f| f.folder_id == id)?;
        let folder = siblings.remove(index);
        Some(Detached {
            parent,
            index,
            folder,
        })
    }

    pub fn image_for(&self, id: FolderId) -> Option<&Image> {
        if id.is_empty() {
            return None;
        }
        self.images.iter().find(|image| image.folder_id == id)
    }

    pub fn text_for(&self, id: FolderId) -> Option<&Text> {
        if id.is_empty() {
            return None;
        }
        self.texts.iter().find(|text| text.folder_id == id)
    }
}

/// A folder removed from the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Detached {
    pub parent: Option<FolderId>,
    pub index: usize,
    pub folder: Folder,
}

fn find_in(folders: &[Folder], id: FolderId) -> Option<&Folder> {
    for folder in folders {
        if folder.folder_id == id {
            return Some(folder);
        }
        if let Some(found) = find_in(&folder.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut(folders: &mut [Folder], id: FolderId) -> Option<&mut Folder> {
    for folder in folders {
        if folder.folder_id == id {
            return Some(folder);
        }
        if let Some(found) = find_in_mut(&mut folder.children, id) {
            return Some(found);
        }
    }
    None
}

fn path_in(folders: &[Folder], id: FolderId, path: &mut Vec<FolderId>) -> bool {
    for folder in folders {
        path.push(folder.folder_id);
        if folder.folder_id == id || path_in(&folder.children, id, path) {
            return true;
        }
        path.pop();
    }
    false
}

fn collect_at_depth<'a>(folders: &'a [Folder], depth: usize, out: &mut Vec<&'a Folder>) {
    for folder in folders {
        if depth == 0 {
            out.push(folder);
        } else {
            collect_at_depth(&folder.children, depth - 1, out);
        }
    }
}

impl AlbumTree {
    pub fn marker(&self) -> VersionMarker {
        VersionMarker::new(self.version, self.creation_time)
    }

    pub fn set_marker(&mut self, marker: VersionMarker) {
        self.version = marker.version;
        self.creation_time = marker.creation_time;
    }

    /// Stale when the remote has assigned a newer marker
    pub fn is_stale_against(&self, remote: &VersionMarker) -> bool {
        self.marker().is_superseded_by(remote)
    }

    pub fn mode(&self) -> AlbumMode {
        AlbumMode::from_layflat(self.attributes.layflat)
    }

    pub fn subtree(&self, kind: SubtreeKind) -> &Subtree {
        match kind {
            SubtreeKind::Book => &self.book,
            SubtreeKind::Cover => &self.cover,
        }
    }

    pub fn subtree_mut(&mut self, kind: SubtreeKind) -> &mut Subtree {
        match kind {
            SubtreeKind::Book => &mut self.book,
            SubtreeKind::Cover => &mut self.cover,
        }
    }

    pub fn find_folder(&self, folder: FolderRef) -> Option<&Folder> {
        self.subtree(folder.subtree).find_folder(folder.id)
    }

    pub fn find_folder_mut(&mut self, folder: FolderRef) -> Option<&mut Folder> {
        self.subtree_mut(folder.subtree).find_folder_mut(folder.id)
    }

    pub fn spreads(&self) -> &[Folder] {
        &self.book.folders
    }

    /// Book pages in reading order
    pub fn pages(&self) -> impl Iterator<Item = &Folder> {
        self.book.folders.iter().flat_map(|spread| spread.children.iter())
    }

    pub fn find_page(&self, page_id: FolderId) -> Option<&Folder> {
        if page_id.is_empty() {
            return None;
        }
        self.pages().find(|page| page.folder_id == page_id)
    }

    pub fn find_spread_by_page_id(&self, page_id: FolderId) -> Option<&Folder> {
        if page_id.is_empty() {
            return None;
        }
        self.book
            .folders
            .iter()
            .find(|spread| spread.children.iter().any(|p| p.folder_id == page_id))
    }

    pub fn spread_count(&self) -> usize {
        self.book.folders.len()
    }

    pub fn page_count(&self) -> usize {
        self.pages().count()
    }

    /// Images placed in the book (cover images excluded)
    pub fn image_count(&self) -> usize {
        self.book
            .images
            .iter()
            .filter(|image| image.folder_id.is_occupied())
            .count()
    }

    pub fn is_layout_folder(&self, folder: FolderRef) -> bool {
        self.subtree(folder.subtree).depth_of(folder.id) == Some(folder.subtree.layout_depth())
    }

    /// Folders that carry a layout in the given subtree
    pub fn layout_folders(&self, kind: SubtreeKind) -> Vec<&Folder> {
        self.subtree(kind).folders_at_depth(kind.layout_depth())
    }
}
