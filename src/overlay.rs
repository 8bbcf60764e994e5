//! Box outline rendering on RGB images

use crate::utils::BoundingBox;
use image::{Rgb, RgbImage};

/// Outline colour and stroke width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxStyle {
    pub color: Rgb<u8>,
    /// Stroke width in pixels, centred on the segment
    pub thickness: u32,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            color: Rgb([255, 0, 0]),
            thickness: 3,
        }
    }
}

/// Draw the outline of `bbox` onto `image` in place.
///
/// Four segments are drawn, (x1,y1)-(x2,y1)-(x2,y2)-(x1,y2)-(x1,y1). Parts
/// that fall outside the image are clipped.
pub fn draw_box(image: &mut RgbImage, bbox: &BoundingBox, style: &BoxStyle) {
    for (from, to) in bbox.edges() {
        draw_segment(image, from, to, style);
    }
}

/// Draw one axis-aligned stroke between two points
///
/// Box edges are always horizontal or vertical, so the stroke is the segment's
/// bounding rectangle grown by half the thickness on every side.
pub fn draw_segment(image: &mut RgbImage, from: (i32, i32), to: (i32, i32), style: &BoxStyle) {
    if style.thickness == 0 {
        return;
    }

    let before = ((style.thickness - 1) / 2) as i64;
    let after = (style.thickness / 2) as i64;

    let left = from.0.min(to.0) as i64 - before;
    let right = from.0.max(to.0) as i64 + after;
    let top = from.1.min(to.1) as i64 - before;
    let bottom = from.1.max(to.1) as i64 + after;

    fill_rect(image, left, top, right, bottom, style.color);
}

/// Fill the inclusive rectangle, clamped to the image
fn fill_rect(image: &mut RgbImage, left: i64, top: i64, right: i64, bottom: i64, color: Rgb<u8>) {
    let (width, height) = (image.width() as i64, image.height() as i64);
    if width == 0 || height == 0 {
        return;
    }

    let left = left.max(0);
    let top = top.max(0);
    let right = right.min(width - 1);
    let bottom = bottom.min(height - 1);

    for y in top..=bottom {
        for x in left..=right {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}
