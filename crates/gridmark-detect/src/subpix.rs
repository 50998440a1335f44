//! Sub-pixel corner refinement.
//!
//! For a true corner `q`, every gradient `g` sampled around it is orthogonal
//! to `p - q`. Each iteration solves the weighted least-squares system
//! `Σ w g gᵀ · q = Σ w g gᵀ · p` over a window centred on the current
//! estimate and moves the estimate there.

use gridmark_core::{sample_bilinear_clamped, GrayImageView};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerSubPixParams {
    /// Half side of the search window; the window is `2 * half_window + 1` wide.
    pub half_window: usize,
    pub max_iters: usize,
    /// Stop once an update moves the corner by no more than this.
    pub epsilon: f64,
}

impl Default for CornerSubPixParams {
    fn default() -> Self {
        Self {
            half_window: 3,
            max_iters: 100,
            epsilon: 0.001,
        }
    }
}

fn gaussian_mask(half_window: usize) -> Vec<f64> {
    let win = half_window as f64;
    let size = 2 * half_window + 1;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let t = (i as f64 - win) / win;
            (-t * t).exp()
        })
        .collect();
    let mut mask = Vec::with_capacity(size * size);
    for wy in &weights {
        for wx in &weights {
            mask.push(wx * wy);
        }
    }
    mask
}

/// Refine `corners` in place against `img`.
///
/// A corner that drifts more than `half_window` pixels from where it started
/// is put back to its starting position.
pub fn refine_corners(img: &GrayImageView<'_>, corners: &mut [Point2<f32>], params: &CornerSubPixParams) {
    if params.half_window == 0 {
        return;
    }
    let win = params.half_window as i64;
    let size = (2 * win + 1) as usize;
    let patch_size = size + 2;
    let mask = gaussian_mask(params.half_window);
    let eps_sq = params.epsilon * params.epsilon;
    let (w, h) = (img.width as f64, img.height as f64);

    let mut patch = vec![0f64; patch_size * patch_size];

    for corner in corners.iter_mut() {
        let start = (corner.x as f64, corner.y as f64);
        let (mut cx, mut cy) = start;

        for _ in 0..params.max_iters {
            let ox = cx - (win + 1) as f64;
            let oy = cy - (win + 1) as f64;
            for r in 0..patch_size {
                for s in 0..patch_size {
                    patch[r * patch_size + s] =
                        sample_bilinear_clamped(img, ox + s as f64, oy + r as f64);
                }
            }

            let (mut a, mut b, mut c) = (0.0, 0.0, 0.0);
            let (mut bb1, mut bb2) = (0.0, 0.0);
            for i in 0..size {
                let py = i as f64 - win as f64;
                for j in 0..size {
                    let px = j as f64 - win as f64;
                    let at = |r: usize, s: usize| patch[r * patch_size + s];
                    let m = mask[i * size + j];
                    let gx = at(i + 1, j + 2) - at(i + 1, j);
                    let gy = at(i + 2, j + 1) - at(i, j + 1);
                    let gxx = gx * gx * m;
                    let gxy = gx * gy * m;
                    let gyy = gy * gy * m;

                    a += gxx;
                    b += gxy;
                    c += gyy;
                    bb1 += gxx * px + gxy * py;
                    bb2 += gxy * px + gyy * py;
                }
            }

            let det = a * c - b * b;
            if det.abs() <= f64::EPSILON * f64::EPSILON {
                break;
            }
            let scale = 1.0 / det;
            let nx = cx + c * scale * bb1 - b * scale * bb2;
            let ny = cy - b * scale * bb1 + a * scale * bb2;
            let err = (nx - cx) * (nx - cx) + (ny - cy) * (ny - cy);
            cx = nx;
            cy = ny;

            if cx < 0.0 || cx >= w || cy < 0.0 || cy >= h || err <= eps_sq {
                break;
            }
        }

        if (cx - start.0).abs() > win as f64 || (cy - start.1).abs() > win as f64 {
            log::trace!("subpix: corner {:?} drifted, keeping start", start);
            (cx, cy) = start;
        }
        *corner = Point2::new(cx as f32, cy as f32);
    }
}
