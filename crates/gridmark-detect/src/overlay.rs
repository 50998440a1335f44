//! Debug drawing onto a frame. Nothing here runs during detection.

use crate::detector::Detection;
use gridmark_core::GrayImage;
use nalgebra::Point2;

const PATCH_SPACING: usize = 10;

/// Paste the kept patches of `detections` side by side along the top edge of
/// `frame`, stopping at the first patch that no longer fits in the row.
/// Returns how many were drawn.
pub fn stamp_patches(frame: &mut GrayImage, detections: &[Detection]) -> usize {
    let mut x = 0;
    let mut drawn = 0;
    for patch in detections.iter().filter_map(|d| d.patch.as_ref()) {
        if x + patch.width > frame.width || patch.height > frame.height {
            break;
        }
        for py in 0..patch.height {
            for px in 0..patch.width {
                frame.set(x + px, py, patch.get(px, py));
            }
        }
        x += patch.width + PATCH_SPACING;
        drawn += 1;
    }
    drawn
}

fn draw_line(frame: &mut GrayImage, a: Point2<f32>, b: Point2<f32>, value: u8) {
    let (mut x0, mut y0) = (a.x.round() as i64, a.y.round() as i64);
    let (x1, y1) = (b.x.round() as i64, b.y.round() as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if x0 >= 0 && y0 >= 0 && (x0 as usize) < frame.width && (y0 as usize) < frame.height {
            frame.set(x0 as usize, y0 as usize, value);
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Draw the closed outline through `corners` and mark the first corner with
/// a small filled square.
pub fn draw_quad_outline(frame: &mut GrayImage, corners: &[Point2<f32>; 4], value: u8) {
    for i in 0..4 {
        draw_line(frame, corners[i], corners[(i + 1) % 4], value);
    }
    let c = corners[0];
    for dy in -1..=1 {
        for dx in -1..=1 {
            let (x, y) = (c.x.round() as i64 + dx, c.y.round() as i64 + dy);
            if x >= 0 && y >= 0 && (x as usize) < frame.width && (y as usize) < frame.height {
                frame.set(x as usize, y as usize, value);
            }
        }
    }
}
