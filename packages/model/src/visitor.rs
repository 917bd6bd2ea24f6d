use crate::tree::{AlbumTree, Folder, Image, Subtree, SubtreeKind, Text};

/// Visitor pattern for traversing album trees immutably
///
/// Default implementations walk the entire tree. Override specific visit_*
/// methods to act on nodes; call the matching walk_* function to keep
/// descending.
pub trait Visitor: Sized {
    fn visit_tree(&mut self, tree: &AlbumTree) {
        walk_tree(self, tree);
    }

    fn visit_subtree(&mut self, kind: SubtreeKind, subtree: &Subtree) {
        walk_subtree(self, kind, subtree);
    }

    fn visit_folder(&mut self, kind: SubtreeKind, folder: &Folder, depth: usize) {
        walk_folder(self, kind, folder, depth);
    }

    fn visit_image(&mut self, _kind: SubtreeKind, _image: &Image) {
        // Leaf node
    }

    fn visit_text(&mut self, _kind: SubtreeKind, _text: &Text) {
        // Leaf node
    }
}

pub fn walk_tree<V: Visitor>(visitor: &mut V, tree: &AlbumTree) {
    visitor.visit_subtree(SubtreeKind::Book, &tree.book);
    visitor.visit_subtree(SubtreeKind::Cover, &tree.cover);
}

pub fn walk_subtree<V: Visitor>(visitor: &mut V, kind: SubtreeKind, subtree: &Subtree) {
    for folder in &subtree.folders {
        visitor.visit_folder(kind, folder, 0);
    }
    for image in &subtree.images {
        visitor.visit_image(kind, image);
    }
    for text in &subtree.texts {
        visitor.visit_text(kind, text);
    }
}

pub fn walk_folder<V: Visitor>(visitor: &mut V, kind: SubtreeKind, folder: &Folder, depth: usize) {
    for child in &folder.children {
        visitor.visit_folder(kind, child, depth + 1);
    }
}

/// Node counts per subtree, gathered in one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub spreads: usize,
    pub pages: usize,
    pub slots: usize,
    pub placeholders: usize,
    pub images: usize,
    pub texts: usize,
    pub cover_panels: usize,
    pub cover_images: usize,
}

impl TreeStats {
    pub fn collect(tree: &AlbumTree) -> Self {
        let mut stats = TreeStats::default();
        stats.visit_tree(tree);
        stats
    }
}

impl Visitor for TreeStats {
    fn visit_folder(&mut self, kind: SubtreeKind, folder: &Folder, depth: usize) {
        if folder.is_placeholder() {
            self.placeholders += 1;
        } else {
            match (kind, depth) {
                (SubtreeKind::Book, 0) => self.spreads += 1,
                (SubtreeKind::Book, 1) => self.pages += 1,
                (SubtreeKind::Cover, 0) => self.cover_panels += 1,
                _ => self.slots += 1,
            }
        }
        walk_folder(self, kind, folder, depth);
    }

    fn visit_image(&mut self, kind: SubtreeKind, _image: &Image) {
        match kind {
            SubtreeKind::Book => self.images += 1,
            SubtreeKind::Cover => self.cover_images += 1,
        }
    }

    fn visit_text(&mut self, _kind: SubtreeKind, _text: &Text) {
        self.texts += 1;
    }
}
