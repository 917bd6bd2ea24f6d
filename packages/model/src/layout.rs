//! Layout geometry templates.
//!
//! Layouts are read-only for the whole editing session. They are grouped
//! into catalogs by `folio-layout`; this module only describes their shape.

use crate::ids::LayoutId;
use serde::{Deserialize, Serialize};

/// Binding mode of the album, selects which layout group applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlbumMode {
    Spread,
    Layflat,
}

impl AlbumMode {
    pub fn from_layflat(layflat: bool) -> Self {
        if layflat {
            AlbumMode::Layflat
        } else {
            AlbumMode::Spread
        }
    }
}

/// Immutable geometry template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub id: LayoutId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub frames: Vec<Frame>,

    /// Declared attributes (e.g. "magazine")
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Image,
    Text,
}

/// Frame rectangle in normalised page coordinates (0..1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub kind: FrameKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    /// Number of content slots (image frames) the layout supports
    pub fn slot_count(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| f.kind == FrameKind::Image)
            .count()
    }

    pub fn text_frame_count(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| f.kind == FrameKind::Text)
            .count()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
