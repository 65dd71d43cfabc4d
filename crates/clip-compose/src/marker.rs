//! Marker placement.
//!
//! Draws the icon asset centered on the capture point, or the fallback
//! shape when the asset cannot be loaded. The fallback is deterministic:
//! a filled circle of half the marker diameter, palette keyed by variant,
//! with a white outer stroke for visibility and a thin black edge so the
//! white stroke survives light backgrounds.

use image::imageops::FilterType;
use image::{Rgba, RgbaImage, imageops};
use tracing::debug;

use clip_core::constants::MARKER_SIZE_PX;
use clip_core::geometry::Coordinates;
use clip_core::state::IconVariant;

use crate::icon::IconLoader;
use crate::raster::{draw_disc, draw_ring};

/// Width of the white outer stroke on the fallback shape.
const FALLBACK_OUTER_STROKE_PX: f64 = 3.0;

/// Width of the black contrast edge on the fallback shape.
const FALLBACK_INNER_STROKE_PX: f64 = 1.0;

/// Placement input for the marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkerConfig {
    /// Center of the marker.
    pub coordinates: Coordinates,
    /// Which asset/palette entry to use.
    pub icon_variant: IconVariant,
    /// Icon edge length in pixels.
    pub size_px: u32,
}

impl MarkerConfig {
    /// A marker at the given point with the default size.
    #[must_use]
    pub fn at(coordinates: Coordinates, icon_variant: IconVariant) -> Self {
        Self {
            coordinates,
            icon_variant,
            size_px: MARKER_SIZE_PX,
        }
    }
}

/// Fallback fill color for a variant. Three fixed palette entries.
#[must_use]
pub fn fallback_fill(variant: IconVariant) -> Rgba<u8> {
    match variant {
        IconVariant::Light => Rgba([245, 245, 245, 255]),
        IconVariant::Blue => Rgba([59, 130, 246, 255]),
        IconVariant::Dark => Rgba([31, 41, 55, 255]),
    }
}

/// Draw the marker into the surface.
///
/// Never fails: asset problems degrade to the fallback shape, which needs
/// nothing but the surface itself.
pub fn draw_marker(img: &mut RgbaImage, config: &MarkerConfig, loader: &dyn IconLoader) {
    match loader.load(config.icon_variant) {
        Ok(icon) => {
            let scaled = if icon.dimensions() == (config.size_px, config.size_px) {
                icon
            } else {
                imageops::resize(&icon, config.size_px, config.size_px, FilterType::Triangle)
            };
            let half = i64::from(config.size_px / 2);
            let x = i64::from(config.coordinates.x) - half;
            let y = i64::from(config.coordinates.y) - half;
            imageops::overlay(img, &scaled, x, y);
        }
        Err(err) => {
            debug!(variant = config.icon_variant.asset_stem(), error = %err, "icon load failed, using fallback marker");
            draw_fallback(img, config);
        }
    }
}

fn draw_fallback(img: &mut RgbaImage, config: &MarkerConfig) {
    let cx = f64::from(config.coordinates.x);
    let cy = f64::from(config.coordinates.y);
    // Filled circle of half the marker diameter.
    let radius = f64::from(config.size_px) / 4.0;

    draw_disc(img, cx, cy, radius, fallback_fill(config.icon_variant));
    // Black contrast edge sits just inside the white stroke.
    draw_ring(
        img,
        cx,
        cy,
        radius - FALLBACK_INNER_STROKE_PX,
        radius,
        Rgba([0, 0, 0, 255]),
    );
    draw_ring(
        img,
        cx,
        cy,
        radius,
        radius + FALLBACK_OUTER_STROKE_PX,
        Rgba([255, 255, 255, 255]),
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AssetError;
    use crate::icon::NoIcons;

    struct FixedIcon(RgbaImage);

    impl IconLoader for FixedIcon {
        fn load(&self, _variant: IconVariant) -> Result<RgbaImage, AssetError> {
            Ok(self.0.clone())
        }
    }

    fn blank(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn fallback_paints_variant_fill_at_center() {
        let mut img = blank(200, 200);
        let config = MarkerConfig::at(Coordinates::new(100, 100), IconVariant::Blue);
        draw_marker(&mut img, &config, &NoIcons);

        let center = img.get_pixel(100, 100);
        assert_eq!(*center, fallback_fill(IconVariant::Blue));
    }

    #[test]
    fn fallback_has_white_stroke_outside_fill() {
        let mut img = blank(200, 200);
        let config = MarkerConfig::at(Coordinates::new(100, 100), IconVariant::Dark);
        draw_marker(&mut img, &config, &NoIcons);

        // radius 16, stroke spans 16..19; probe at 18 to the right
        let stroke = img.get_pixel(118, 100);
        assert_eq!(*stroke, Rgba([255, 255, 255, 255]));
        // beyond the stroke the base survives
        assert_eq!(*img.get_pixel(125, 100), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn fallback_palette_is_distinct_per_variant() {
        let fills = [
            fallback_fill(IconVariant::Light),
            fallback_fill(IconVariant::Blue),
            fallback_fill(IconVariant::Dark),
        ];
        assert_ne!(fills[0], fills[1]);
        assert_ne!(fills[1], fills[2]);
        assert_ne!(fills[0], fills[2]);
    }

    #[test]
    fn icon_draws_centered() {
        let icon = RgbaImage::from_pixel(64, 64, Rgba([0, 255, 0, 255]));
        let mut img = blank(200, 200);
        let config = MarkerConfig::at(Coordinates::new(100, 100), IconVariant::Blue);
        draw_marker(&mut img, &config, &FixedIcon(icon));

        assert_eq!(img.get_pixel(100, 100)[1], 255);
        assert_eq!(img.get_pixel(69, 69)[1], 255, "icon top-left corner");
        assert_eq!(img.get_pixel(60, 60)[1], 0, "outside the icon");
    }

    #[test]
    fn icon_is_resized_to_marker_size() {
        let icon = RgbaImage::from_pixel(128, 128, Rgba([0, 255, 0, 255]));
        let mut img = blank(200, 200);
        let config = MarkerConfig {
            coordinates: Coordinates::new(100, 100),
            icon_variant: IconVariant::Blue,
            size_px: 32,
        };
        draw_marker(&mut img, &config, &FixedIcon(icon));

        assert_eq!(img.get_pixel(100, 100)[1], 255);
        assert_eq!(img.get_pixel(100 + 20, 100)[1], 0, "outside the 32px icon");
    }

    #[test]
    fn marker_near_edge_does_not_panic() {
        let mut img = blank(50, 50);
        let config = MarkerConfig::at(Coordinates::new(0, 0), IconVariant::Light);
        draw_marker(&mut img, &config, &NoIcons);
        let config = MarkerConfig::at(Coordinates::new(49, 49), IconVariant::Light);
        draw_marker(&mut img, &config, &NoIcons);
    }
}
