//! Binary erosion with a cross-shaped structuring element, used to clean
//! bit-cell boundaries of rectified patches.

use gridmark_core::GrayImage;
use serde::{Deserialize, Serialize};

/// Erosion applied to rectified patches before the bit grid is sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErodeParams {
    /// Side of the cross-shaped structuring element (odd).
    pub kernel_size: usize,
    pub iterations: usize,
}

impl Default for ErodeParams {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            iterations: 2,
        }
    }
}

/// Grey erosion with a cross of arm length `kernel_size / 2`.
///
/// Neighbours outside the image are ignored, so foreground touching the
/// border is not eaten from outside.
pub fn erode_cross(src: &GrayImage, params: &ErodeParams) -> GrayImage {
    let arm = params.kernel_size / 2;
    let mut cur = src.clone();
    if arm == 0 {
        return cur;
    }
    let (w, h) = (src.width, src.height);

    for _ in 0..params.iterations {
        let mut out = cur.clone();
        for y in 0..h {
            for x in 0..w {
                let mut v = cur.get(x, y);
                for d in 1..=arm {
                    if x >= d {
                        v = v.min(cur.get(x - d, y));
                    }
                    if x + d < w {
                        v = v.min(cur.get(x + d, y));
                    }
                    if y >= d {
                        v = v.min(cur.get(x, y - d));
                    }
                    if y + d < h {
                        v = v.min(cur.get(x, y + d));
                    }
                }
                out.set(x, y, v);
            }
        }
        cur = out;
    }
    cur
}
