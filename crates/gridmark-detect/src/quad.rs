//! Quadrilateral candidates from the nesting structure of a binary map.

use crate::contour::{find_contours, ContourSet};
use crate::polygon::{approx_poly_closed, shoelace};
use crate::subpix::{refine_corners, CornerSubPixParams};
use gridmark_core::GrayImageView;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Four image-space corners, ordered like the canvas corners
/// `(0,0), (0,S), (S,S), (S,0)`: counter-clockwise on screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub corners: [Point2<f32>; 4],
}

impl Quad {
    pub fn new(corners: [Point2<f32>; 4]) -> Self {
        Self { corners }
    }

    /// Twice the signed area; negative for the canvas winding.
    pub fn signed_area2(&self) -> f64 {
        shoelace(&self.corners)
    }

    /// Reorder to the canvas winding, keeping the first corner in place.
    pub fn with_canvas_winding(self) -> Self {
        if self.signed_area2() < 0.0 {
            self
        } else {
            let [p0, p1, p2, p3] = self.corners;
            Self::new([p0, p3, p2, p1])
        }
    }

    /// Cyclic shift so that corner `i` of the result is `corners[(i + 4 - k) % 4]`.
    pub fn rolled(&self, k: usize) -> Self {
        let c = self.corners;
        Self::new(std::array::from_fn(|i| c[(i + 4 - k % 4) % 4]))
    }

    /// A quad is degenerate when it encloses (almost) no area, any three of
    /// its corners are (almost) collinear, or it is not convex. A square seen
    /// through a camera is always convex.
    pub fn is_degenerate(&self) -> bool {
        const MIN_AREA2: f64 = 2.0;
        const MIN_SIN: f64 = 1e-3;

        if !self.corners.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
            return true;
        }
        if self.signed_area2().abs() < MIN_AREA2 {
            return true;
        }
        // every triple of a quad is a consecutive triple around some corner
        let mut turns = [0.0f64; 4];
        for (i, turn) in turns.iter_mut().enumerate() {
            let prev = self.corners[(i + 3) % 4];
            let cur = self.corners[i];
            let next = self.corners[(i + 1) % 4];
            let (ax, ay) = ((cur.x - prev.x) as f64, (cur.y - prev.y) as f64);
            let (bx, by) = ((next.x - cur.x) as f64, (next.y - cur.y) as f64);
            let la = ax.hypot(ay);
            let lb = bx.hypot(by);
            if la < 1e-6 || lb < 1e-6 {
                return true;
            }
            *turn = (ax * by - ay * bx) / (la * lb);
        }
        if turns.iter().any(|t| t.abs() < MIN_SIN) {
            return true;
        }
        let first = turns[0].is_sign_positive();
        turns.iter().any(|t| t.is_sign_positive() != first)
    }
}

/// Output of the candidate search, with counts for diagnostics.
#[derive(Clone, Debug, Default)]
pub struct QuadSearch {
    pub quads: Vec<Quad>,
    pub num_contours: usize,
    pub num_nested: usize,
}

/// Find four-cornered nested contours in `binary` and refine their corners
/// against `frame`.
pub fn find_quads(
    frame: &GrayImageView<'_>,
    binary: &GrayImageView<'_>,
    approx_epsilon: f64,
    subpix: &CornerSubPixParams,
) -> QuadSearch {
    let contours = find_contours(binary);
    let mut search = quads_from_contours(&contours, approx_epsilon);

    for quad in &mut search.quads {
        refine_corners(frame, &mut quad.corners, subpix);
        *quad = quad.with_canvas_winding();
    }

    log::debug!(
        "contours={} nested={} quads={}",
        search.num_contours,
        search.num_nested,
        search.quads.len()
    );
    search
}

/// Polygonise every nested contour and keep those with exactly 4 vertices.
pub fn quads_from_contours(contours: &ContourSet, approx_epsilon: f64) -> QuadSearch {
    let mut quads = Vec::new();
    let mut num_nested = 0;
    for idx in contours.nested() {
        num_nested += 1;
        let poly = approx_poly_closed(&contours.contours[idx].points, approx_epsilon);
        if poly.len() != 4 {
            log::trace!("contour {idx}: {} vertices, skipped", poly.len());
            continue;
        }
        let corners = std::array::from_fn(|i| Point2::new(poly[i].x as f32, poly[i].y as f32));
        quads.push(Quad::new(corners));
    }
    QuadSearch {
        quads,
        num_contours: contours.len(),
        num_nested,
    }
}
