//! The compositing engine entry point.

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, RgbaImage};
use tracing::warn;

use crate::callout::TextBoxConfig;
use crate::errors::ComposeError;
use crate::icon::IconLoader;
use crate::marker::{MarkerConfig, draw_marker};

/// Composites a marker and an optional callout over a captured image.
///
/// Construction takes the icon loader once; every [`compose`](Self::compose)
/// call is then a pure function of its inputs.
pub struct Compositor {
    icon_loader: Arc<dyn IconLoader>,
}

impl Compositor {
    /// Build an engine around an icon source.
    #[must_use]
    pub fn new(icon_loader: Arc<dyn IconLoader>) -> Self {
        Self { icon_loader }
    }

    /// Composite `marker` (and `callout`, when present) over the base PNG.
    ///
    /// This never fails: if anything goes wrong beyond the icon fallback
    /// already built into marker drawing, the unmodified base bytes come
    /// back and the failure is logged. Output dimensions always equal
    /// input dimensions.
    #[must_use]
    pub fn compose(
        &self,
        base_png: &[u8],
        marker: &MarkerConfig,
        callout: Option<&TextBoxConfig>,
    ) -> Vec<u8> {
        match self.compose_inner(base_png, marker, callout) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, "compositing failed, returning base image unchanged");
                base_png.to_vec()
            }
        }
    }

    fn compose_inner(
        &self,
        base_png: &[u8],
        marker: &MarkerConfig,
        callout: Option<&TextBoxConfig>,
    ) -> Result<Vec<u8>, ComposeError> {
        let mut surface: RgbaImage = image::load_from_memory(base_png)
            .map_err(ComposeError::Decode)?
            .to_rgba8();

        draw_marker(&mut surface, marker, self.icon_loader.as_ref());
        if let Some(callout) = callout {
            callout.draw(&mut surface);
        }

        encode_png(&surface)
    }
}

/// Encode a surface back to PNG bytes.
pub(crate) fn encode_png(surface: &RgbaImage) -> Result<Vec<u8>, ComposeError> {
    let mut out = Cursor::new(Vec::new());
    surface
        .write_to(&mut out, ImageFormat::Png)
        .map_err(ComposeError::Encode)?;
    Ok(out.into_inner())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callout::CalloutKind;
    use crate::icon::NoIcons;
    use crate::marker::fallback_fill;
    use clip_core::geometry::Coordinates;
    use clip_core::state::IconVariant;
    use image::Rgba;

    fn base_png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([40, 40, 40, 255]));
        encode_png(&img).unwrap()
    }

    fn engine() -> Compositor {
        Compositor::new(Arc::new(NoIcons))
    }

    #[test]
    fn output_matches_input_dimensions() {
        let base = base_png(800, 600);
        let marker = MarkerConfig::at(Coordinates::new(100, 50), IconVariant::Blue);
        let out = engine().compose(&base, &marker, None);
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.width(), 800);
        assert_eq!(decoded.height(), 600);
    }

    #[test]
    fn failing_icon_loader_still_produces_marker() {
        let base = base_png(400, 300);
        let marker = MarkerConfig::at(Coordinates::new(200, 150), IconVariant::Dark);
        let out = engine().compose(&base, &marker, None);
        let decoded = image::load_from_memory(&out).unwrap().to_rgba8();
        assert_eq!(
            *decoded.get_pixel(200, 150),
            fallback_fill(IconVariant::Dark)
        );
    }

    #[test]
    fn annotation_renders_to_the_right_of_marker() {
        let base = base_png(800, 600);
        let coords = Coordinates::new(100, 50);
        let marker = MarkerConfig::at(coords, IconVariant::Blue);
        let callout = TextBoxConfig {
            text: "Broken layout here".into(),
            anchor: coords,
            anchor_size_px: 64,
            kind: CalloutKind::Annotation,
        };
        let out = engine().compose(&base, &marker, Some(&callout));
        let decoded = image::load_from_memory(&out).unwrap().to_rgba8();

        // Inside the callout: near-white background
        let layout = callout.layout();
        let bx = (layout.x + 4) as u32;
        let by = (layout.y + i64::from(layout.height) / 2) as u32;
        assert!(decoded.get_pixel(bx, by)[0] > 150);
        // Well away from both marker and box the base is untouched
        assert_eq!(*decoded.get_pixel(700, 500), Rgba([40, 40, 40, 255]));
    }

    #[test]
    fn undecodable_base_returns_input_unchanged() {
        let garbage = vec![1u8, 2, 3, 4];
        let marker = MarkerConfig::at(Coordinates::new(0, 0), IconVariant::Blue);
        let out = engine().compose(&garbage, &marker, None);
        assert_eq!(out, garbage);
    }

    #[test]
    fn compose_is_deterministic() {
        let base = base_png(200, 200);
        let marker = MarkerConfig::at(Coordinates::new(64, 64), IconVariant::Light);
        let a = engine().compose(&base, &marker, None);
        let b = engine().compose(&base, &marker, None);
        assert_eq!(a, b);
    }
}
