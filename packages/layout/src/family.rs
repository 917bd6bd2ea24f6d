//! Layout family classification.
//!
//! Families are derived from a layout's declared attributes only. Callers use
//! them to decide which editing features a page offers.

use folio_model::{FrameKind, Layout};
use serde::{Deserialize, Serialize};

/// Frames reaching this close to the page edges count as full width
const FULL_WIDTH_TOLERANCE: f32 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutFamily {
    Regular,
    Magazine,
    Panorama,
}

impl LayoutFamily {
    pub fn classify(layout: &Layout) -> Self {
        if layout.has_tag("magazine") || layout.text_frame_count() > 0 {
            return LayoutFamily::Magazine;
        }

        let mut images = layout.frames.iter().filter(|f| f.kind == FrameKind::Image);
        match (images.next(), images.next()) {
            (Some(frame), None)
                if frame.x <= FULL_WIDTH_TOLERANCE
                    && frame.width >= 1.0 - FULL_WIDTH_TOLERANCE =>
            {
                LayoutFamily::Panorama
            }
            _ => LayoutFamily::Regular,
        }
    }

    /// Captions need a text frame to render into
    pub fn allows_captions(self) -> bool {
        matches!(self, LayoutFamily::Magazine)
    }

    /// Background art is hidden behind full-bleed panoramas
    pub fn allows_background(self) -> bool {
        !matches!(self, LayoutFamily::Panorama)
    }
}
