//! Alpha-blended raster primitives.
//!
//! Everything draws directly into an `RgbaImage` with source-over blending
//! and clamps to the image bounds, so callers never have to pre-clip.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};

/// Glyph cell edge of the bitmap font, in pixels.
pub const GLYPH_SIZE_PX: u32 = 8;

fn clamp_i32(value: i32, min_value: i32, max_value: i32) -> i32 {
    value.clamp(min_value, max_value)
}

/// Source-over blend of `src` onto `dst`.
#[must_use]
pub fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let r = (f64::from(dst[0]) * inv + f64::from(src[0]) * a)
        .round()
        .clamp(0.0, 255.0) as u8;
    let g = (f64::from(dst[1]) * inv + f64::from(src[1]) * a)
        .round()
        .clamp(0.0, 255.0) as u8;
    let b = (f64::from(dst[2]) * inv + f64::from(src[2]) * a)
        .round()
        .clamp(0.0, 255.0) as u8;
    let out_a = (f64::from(dst[3]) + f64::from(src[3]) * inv)
        .round()
        .clamp(0.0, 255.0) as u8;
    Rgba([r, g, b, out_a])
}

fn blend_at(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && x < img.width() as i32 && y < img.height() as i32 {
        let dst = *img.get_pixel(x as u32, y as u32);
        img.put_pixel(x as u32, y as u32, blend_pixel(dst, color));
    }
}

/// Fill a disc centered at (`cx`, `cy`).
pub fn draw_disc(img: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    if radius <= 0.1 {
        blend_at(img, cx.round() as i32, cy.round() as i32, color);
        return;
    }
    let min_x = clamp_i32((cx - radius).floor() as i32, 0, img.width() as i32 - 1);
    let max_x = clamp_i32((cx + radius).ceil() as i32, 0, img.width() as i32 - 1);
    let min_y = clamp_i32((cy - radius).floor() as i32, 0, img.height() as i32 - 1);
    let max_y = clamp_i32((cy + radius).ceil() as i32, 0, img.height() as i32 - 1);
    let r2 = radius * radius;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = f64::from(x) - cx;
            let dy = f64::from(y) - cy;
            if dx * dx + dy * dy <= r2 {
                let dst = *img.get_pixel(x as u32, y as u32);
                img.put_pixel(x as u32, y as u32, blend_pixel(dst, color));
            }
        }
    }
}

/// Fill the annulus `inner_radius <= d <= outer_radius` centered at
/// (`cx`, `cy`). Used for marker strokes.
pub fn draw_ring(
    img: &mut RgbaImage,
    cx: f64,
    cy: f64,
    inner_radius: f64,
    outer_radius: f64,
    color: Rgba<u8>,
) {
    if outer_radius <= inner_radius {
        return;
    }
    let min_x = clamp_i32((cx - outer_radius).floor() as i32, 0, img.width() as i32 - 1);
    let max_x = clamp_i32((cx + outer_radius).ceil() as i32, 0, img.width() as i32 - 1);
    let min_y = clamp_i32((cy - outer_radius).floor() as i32, 0, img.height() as i32 - 1);
    let max_y = clamp_i32((cy + outer_radius).ceil() as i32, 0, img.height() as i32 - 1);
    let inner2 = inner_radius * inner_radius;
    let outer2 = outer_radius * outer_radius;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = f64::from(x) - cx;
            let dy = f64::from(y) - cy;
            let d2 = dx * dx + dy * dy;
            if d2 >= inner2 && d2 <= outer2 {
                let dst = *img.get_pixel(x as u32, y as u32);
                img.put_pixel(x as u32, y as u32, blend_pixel(dst, color));
            }
        }
    }
}

/// Whether a point falls inside a rounded rectangle spanning
/// (`x0`, `y0`)–(`x1`, `y1`) exclusive, with the given corner radius.
#[must_use]
pub fn point_in_rounded_rect(px: i32, py: i32, x0: i32, y0: i32, x1: i32, y1: i32, radius: f64) -> bool {
    if px < x0 || px >= x1 || py < y0 || py >= y1 {
        return false;
    }
    if radius <= 0.1 {
        return true;
    }
    let r = radius
        .min(f64::from((x1 - x0).abs()) / 2.0)
        .min(f64::from((y1 - y0).abs()) / 2.0);
    let fx = f64::from(px);
    let fy = f64::from(py);
    let left = f64::from(x0);
    let right = f64::from(x1);
    let top = f64::from(y0);
    let bottom = f64::from(y1);

    if (fx >= left + r && fx <= right - r) || (fy >= top + r && fy <= bottom - r) {
        return true;
    }

    let corners = [
        (left + r, top + r),
        (right - r, top + r),
        (left + r, bottom - r),
        (right - r, bottom - r),
    ];
    corners.iter().any(|(cx, cy)| {
        let dx = fx - cx;
        let dy = fy - cy;
        dx * dx + dy * dy <= r * r
    })
}

/// Fill a rounded rectangle spanning (`x0`, `y0`)–(`x1`, `y1`) exclusive.
pub fn fill_rounded_rect(
    img: &mut RgbaImage,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    radius: f64,
    color: Rgba<u8>,
) {
    if img.width() == 0 || img.height() == 0 || x1 <= x0 || y1 <= y0 {
        return;
    }
    let min_x = clamp_i32(x0, 0, img.width() as i32 - 1);
    let max_x = clamp_i32(x1 - 1, 0, img.width() as i32 - 1);
    let min_y = clamp_i32(y0, 0, img.height() as i32 - 1);
    let max_y = clamp_i32(y1 - 1, 0, img.height() as i32 - 1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if point_in_rounded_rect(x, y, x0, y0, x1, y1, radius) {
                let dst = *img.get_pixel(x as u32, y as u32);
                img.put_pixel(x as u32, y as u32, blend_pixel(dst, color));
            }
        }
    }
}

/// Render a single line of text with the 8×8 bitmap font.
///
/// Unknown glyphs render as `?`; the cursor always advances one cell so
/// alignment survives unsupported characters.
pub fn draw_bitmap_text(img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>) {
    let mut cursor_x = x;
    for ch in text.chars() {
        let glyph = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?'));
        let Some(glyph) = glyph else {
            cursor_x += GLYPH_SIZE_PX as i32;
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            let row_bits = *row;
            for col_idx in 0..8 {
                if (row_bits >> col_idx) & 1 == 0 {
                    continue;
                }
                blend_at(img, cursor_x + col_idx, y + row_idx as i32, color);
            }
        }
        cursor_x += GLYPH_SIZE_PX as i32;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
