//! Sample documents for tests.
//!
//! Layout ids encode their bucket: `base + slots * 10 + variant`. Variant `1`
//! carries a caption frame. Spread layouts use base 100, layflat 200 and
//! cover 300.

use crate::ids::{FolderId, LayoutId};
use crate::layout::{Frame, FrameKind, Layout};
use crate::tree::{AlbumAttributes, AlbumTree, Direction, Folder, Image, Subtree, Text};
use chrono::{DateTime, TimeZone, Utc};

pub const SPREAD_BASE: u32 = 100;
pub const LAYFLAT_BASE: u32 = 200;
pub const COVER_BASE: u32 = 300;

pub fn sample_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0)
        .single()
        .unwrap_or_default()
}

/// Two spreads, four pages, one cover panel. Version 5.
///
/// ```text
/// spread 1: page 11 [111, 112]          L120
///           page 12 [121, <empty>]      L110
/// spread 2: page 21 [211, 212, 213]     L131 (captioned)
///           page 22 []                  L100
/// cover:    panel 900 [901]             L311 (titled)
/// ```
pub fn sample_tree() -> AlbumTree {
    let slots = |ids: &[u64]| -> Vec<Folder> { ids.iter().map(|id| Folder::new(*id)).collect() };

    let book = Subtree {
        folders: vec![
            Folder::new(1).with_children(vec![
                Folder::new(11)
                    .with_layout(LayoutId(120))
                    .with_children(slots(&[111, 112])),
                Folder::new(12)
                    .with_layout(LayoutId(110))
                    .with_children(vec![Folder::new(121), Folder::placeholder()]),
            ]),
            Folder::new(2).with_children(vec![
                Folder::new(21)
                    .with_layout(LayoutId(131))
                    .with_children(slots(&[211, 212, 213])),
                Folder::new(22).with_layout(LayoutId(100)),
            ]),
        ],
        images: [111, 112, 121, 211, 212, 213]
            .iter()
            .map(|id| image(*id))
            .collect(),
        texts: vec![text(21, "Summer in Lisbon")],
    };

    let cover = Subtree {
        folders: vec![Folder::new(900)
            .with_layout(LayoutId(311))
            .with_children(slots(&[901]))],
        images: vec![image(901)],
        texts: vec![text(900, "Our Trip")],
    };

    AlbumTree {
        version: 5,
        creation_time: sample_time(),
        attributes: AlbumAttributes {
            title: Some("Lisbon 2025".to_string()),
            format: "a4-landscape".to_string(),
            density: "classic".to_string(),
            direction: Direction::Ltr,
            theme_id: Some("summer".to_string()),
            layflat: false,
        },
        book,
        cover,
    }
}

pub fn image(folder_id: u64) -> Image {
    Image {
        folder_id: FolderId::new(folder_id),
        source: format!("asset://photos/{}.jpg", folder_id),
        width: 4000,
        height: 3000,
    }
}

pub fn text(folder_id: u64, content: &str) -> Text {
    Text {
        folder_id: FolderId::new(folder_id),
        content: content.to_string(),
    }
}

/// Two layouts (plain and captioned) for every slot count up to `max_slots`
pub fn layouts(base: u32, max_slots: usize) -> Vec<Layout> {
    let mut out = Vec::new();
    for slots in 0..=max_slots {
        for variant in 0..2u32 {
            out.push(layout(base + slots as u32 * 10 + variant, slots, variant == 1));
        }
    }
    out
}

pub fn spread_layouts() -> Vec<Layout> {
    layouts(SPREAD_BASE, 4)
}

pub fn layflat_layouts() -> Vec<Layout> {
    layouts(LAYFLAT_BASE, 4)
}

pub fn cover_layouts() -> Vec<Layout> {
    layouts(COVER_BASE, 2)
}

/// Image frames side by side, plus an optional caption band at the bottom
pub fn layout(id: u32, slots: usize, captioned: bool) -> Layout {
    let width = if slots == 0 { 1.0 } else { 1.0 / slots as f32 };
    let height = if captioned { 0.8 } else { 1.0 };

    let mut frames: Vec<Frame> = (0..slots)
        .map(|i| Frame {
            kind: FrameKind::Image,
            x: i as f32 * width,
            y: 0.0,
            width,
            height,
        })
        .collect();

    if captioned {
        frames.push(Frame {
            kind: FrameKind::Text,
            x: 0.0,
            y: 0.8,
            width: 1.0,
            height: 0.2,
        });
    }

    Layout {
        id: LayoutId(id),
        name: Some(format!("{}-up{}", slots, if captioned { " captioned" } else { "" })),
        frames,
        tags: Vec::new(),
    }
}
