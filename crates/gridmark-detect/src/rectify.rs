//! Perspective rectification of quad candidates onto a square canvas.

use crate::detector::RejectReason;
use crate::morphology::{erode_cross, ErodeParams};
use crate::quad::Quad;
use crate::threshold::binarize_otsu;
use gridmark_core::{homography_from_4pt, warp_perspective_gray, GrayImage, GrayImageView, Homography};
use nalgebra::Point2;

/// Canvas corners in the order quad corners are matched to:
/// `(0,0), (0,S), (S,S), (S,0)`.
pub fn canvas_corners(size: usize) -> [Point2<f32>; 4] {
    let s = size as f32;
    [
        Point2::new(0.0, 0.0),
        Point2::new(0.0, s),
        Point2::new(s, s),
        Point2::new(s, 0.0),
    ]
}

/// Rotate an image 90° counter-clockwise `quarter_turns` times.
pub fn rotate_image_ccw(src: &GrayImage, quarter_turns: usize) -> GrayImage {
    let mut cur = src.clone();
    for _ in 0..quarter_turns % 4 {
        let (w, h) = (cur.width, cur.height);
        let mut next = GrayImage::filled(h, w, 0);
        for r in 0..w {
            for c in 0..h {
                next.set(c, r, cur.get(w - 1 - r, c));
            }
        }
        cur = next;
    }
    cur
}

/// A binarised, eroded `S × S` view of one candidate.
#[derive(Clone, Debug)]
pub struct RectifiedPatch {
    /// Pixels are 0 or 255.
    pub image: GrayImage,
    /// Otsu threshold the warped patch was binarised with.
    pub threshold: u8,
    pub h_img_from_canvas: Homography,
}

/// Homography taking canvas coordinates to image coordinates of `quad`.
pub fn canvas_to_image(quad: &Quad, canvas_size: usize) -> Result<Homography, RejectReason> {
    if quad.is_degenerate() {
        return Err(RejectReason::DegenerateQuad);
    }
    homography_from_4pt(&canvas_corners(canvas_size), &quad.corners)
        .ok_or(RejectReason::DegenerateQuad)
}

/// Warp the quad region of `frame` onto the canvas, binarise it with a
/// patch-local Otsu threshold and erode it.
pub fn rectify(
    frame: &GrayImageView<'_>,
    quad: &Quad,
    canvas_size: usize,
    erode: &ErodeParams,
) -> Result<RectifiedPatch, RejectReason> {
    let h_img_from_canvas = canvas_to_image(quad, canvas_size)?;
    let warped = warp_perspective_gray(frame, &h_img_from_canvas, canvas_size, canvas_size);
    let (binary, threshold) = binarize_otsu(&warped);
    let image = erode_cross(&binary, erode);
    Ok(RectifiedPatch {
        image,
        threshold,
        h_img_from_canvas,
    })
}
