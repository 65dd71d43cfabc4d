//! Callout (text box) layout and rendering.
//!
//! A callout sits to the right of the marker, vertically centered on the
//! marker's top edge. Its colors and padding are fixed per kind as part
//! of the product's visual language, not user-configurable.

use image::{Rgba, RgbaImage};

use clip_core::constants::{
    ANNOTATION_MAX_WIDTH_PX, ANNOTATION_PADDING_PX, LINE_HEIGHT_PX, TRANSCRIPTION_MAX_WIDTH_PX,
    TRANSCRIPTION_PADDING_PX,
};
use clip_core::geometry::Coordinates;

use crate::raster::{GLYPH_SIZE_PX, draw_bitmap_text, fill_rounded_rect};
use crate::wrap::{block_width_px, word_wrap};

/// Horizontal gap between the marker's edge and the callout, in pixels.
const MARKER_GAP_PX: u32 = 8;

/// Corner radius of the callout box.
const CORNER_RADIUS_PX: f64 = 6.0;

/// Label drawn above a transcription body.
const TRANSCRIPTION_LABEL: &str = "TRANSCRIPTION";

/// What kind of text the callout carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalloutKind {
    /// A note the user typed.
    Annotation,
    /// A live speech transcript.
    Transcription,
}

impl CalloutKind {
    /// Maximum wrapped text width, in pixels.
    #[must_use]
    pub fn max_width_px(self) -> u32 {
        match self {
            Self::Annotation => ANNOTATION_MAX_WIDTH_PX,
            Self::Transcription => TRANSCRIPTION_MAX_WIDTH_PX,
        }
    }

    /// Box padding, in pixels.
    #[must_use]
    pub fn padding_px(self) -> u32 {
        match self {
            Self::Annotation => ANNOTATION_PADDING_PX,
            Self::Transcription => TRANSCRIPTION_PADDING_PX,
        }
    }

    fn border_width(self) -> u32 {
        match self {
            Self::Annotation => 1,
            Self::Transcription => 3,
        }
    }

    fn background(self) -> Rgba<u8> {
        match self {
            Self::Annotation => Rgba([255, 255, 255, 255]),
            Self::Transcription => Rgba([238, 242, 255, 255]),
        }
    }

    fn border(self) -> Rgba<u8> {
        match self {
            Self::Annotation => Rgba([51, 51, 51, 255]),
            Self::Transcription => Rgba([79, 70, 229, 255]),
        }
    }

    fn text_color(self) -> Rgba<u8> {
        Rgba([17, 17, 17, 255])
    }

    fn label(self) -> Option<&'static str> {
        match self {
            Self::Annotation => None,
            Self::Transcription => Some(TRANSCRIPTION_LABEL),
        }
    }
}

/// Placement input for one callout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextBoxConfig {
    /// Text to wrap and render.
    pub text: String,
    /// Anchor point — the marker center the box hangs off. The engine
    /// trusts this as given; clamping is the caller's job
    /// (see [`clamped_anchor`]).
    pub anchor: Coordinates,
    /// Marker edge length the box offsets from.
    pub anchor_size_px: u32,
    /// Annotation or transcription styling.
    pub kind: CalloutKind,
}

/// Resolved geometry for a callout, shared by drawing and clamping.
#[derive(Clone, Debug)]
pub struct CalloutLayout {
    /// Box left edge (may be off-canvas; drawing clips).
    pub x: i64,
    /// Box top edge.
    pub y: i64,
    /// Box width in pixels.
    pub width: u32,
    /// Box height in pixels.
    pub height: u32,
    /// Wrapped body lines.
    pub lines: Vec<String>,
    /// Label row above the body, when the kind has one.
    pub label: Option<&'static str>,
}

impl TextBoxConfig {
    /// Compute the box geometry for this config.
    #[must_use]
    pub fn layout(&self) -> CalloutLayout {
        let lines = word_wrap(&self.text, self.kind.max_width_px());
        let label = self.kind.label();
        let pad = self.kind.padding_px();

        let label_width = label.map_or(0, |l| l.chars().count() as u32 * GLYPH_SIZE_PX);
        let content_width = block_width_px(&lines).max(label_width);
        let rows = lines.len() as u32 + u32::from(label.is_some());

        let width = content_width + 2 * pad;
        let height = rows * LINE_HEIGHT_PX + 2 * pad;

        let half = i64::from(self.anchor_size_px / 2);
        let x = i64::from(self.anchor.x) + half + i64::from(MARKER_GAP_PX);
        // Vertically centered on the marker's top edge.
        let top_edge = i64::from(self.anchor.y) - half;
        let y = top_edge - i64::from(height / 2);

        CalloutLayout {
            x,
            y,
            width,
            height,
            lines,
            label,
        }
    }

    /// Draw the callout into the surface. Empty text draws nothing.
    pub fn draw(&self, img: &mut RgbaImage) {
        let layout = self.layout();
        if layout.lines.is_empty() {
            return;
        }

        let x0 = layout.x as i32;
        let y0 = layout.y as i32;
        let x1 = x0 + layout.width as i32;
        let y1 = y0 + layout.height as i32;

        // Rounded box: border-colored fill with the background inset by
        // the border width.
        fill_rounded_rect(img, x0, y0, x1, y1, CORNER_RADIUS_PX, self.kind.border());
        let bw = self.kind.border_width() as i32;
        fill_rounded_rect(
            img,
            x0 + bw,
            y0 + bw,
            x1 - bw,
            y1 - bw,
            (CORNER_RADIUS_PX - f64::from(bw)).max(0.0),
            self.kind.background(),
        );

        let pad = self.kind.padding_px() as i32;
        let glyph_offset = ((LINE_HEIGHT_PX - GLYPH_SIZE_PX) / 2) as i32;
        let mut row = 0i32;

        if let Some(label) = layout.label {
            draw_bitmap_text(
                img,
                x0 + pad,
                y0 + pad + glyph_offset,
                label,
                self.kind.border(),
            );
            row += 1;
        }

        for line in &layout.lines {
            draw_bitmap_text(
                img,
                x0 + pad,
                y0 + pad + row * LINE_HEIGHT_PX as i32 + glyph_offset,
                line,
                self.kind.text_color(),
            );
            row += 1;
        }
    }
}

/// Adjust an anchor so the callout never extends past the image's right or
/// bottom edge.
///
/// The orchestrator calls this before building the [`TextBoxConfig`]; the
/// engine itself does not re-derive placement.
#[must_use]
pub fn clamped_anchor(
    image_width: u32,
    image_height: u32,
    anchor: Coordinates,
    anchor_size_px: u32,
    kind: CalloutKind,
    text: &str,
) -> Coordinates {
    let probe = TextBoxConfig {
        text: text.to_owned(),
        anchor,
        anchor_size_px,
        kind,
    };
    let layout = probe.layout();

    let right = layout.x + i64::from(layout.width);
    let mut x = i64::from(anchor.x);
    if right > i64::from(image_width) {
        x -= right - i64::from(image_width);
    }

    let bottom = layout.y + i64::from(layout.height);
    let mut y = i64::from(anchor.y);
    if bottom > i64::from(image_height) {
        y -= bottom - i64::from(image_height);
    }

    Coordinates::new(x.max(0) as u32, y.max(0) as u32)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
