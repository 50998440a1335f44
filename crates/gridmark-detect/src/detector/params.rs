use super::DetectError;
use crate::morphology::ErodeParams;
use crate::subpix::CornerSubPixParams;
use serde::{Deserialize, Serialize};

/// Configuration for the marker detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Side of the adaptive-threshold neighbourhood (odd, >= 3).
    pub aperture_size: usize,
    /// A pixel is foreground when brighter than its local mean minus this.
    pub threshold_bias: i32,
    /// Maximum polygon-to-contour distance, in pixels.
    pub approx_epsilon: f64,
    pub subpix: CornerSubPixParams,
    /// Side of the square canvas candidates are rectified onto.
    pub canvas_size: usize,
    /// Cells per side of the marker grid, border included.
    pub grid_dim: usize,
    pub erode: ErodeParams,
    /// Keep the rectified patch of every detection.
    pub keep_patches: bool,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            aperture_size: 9,
            threshold_bias: 9,
            approx_epsilon: 2.5,
            subpix: CornerSubPixParams::default(),
            canvas_size: 120,
            grid_dim: 6,
            erode: ErodeParams::default(),
            keep_patches: false,
        }
    }
}

impl DetectorParams {
    /// Check values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), DetectError> {
        if self.aperture_size < 3 || self.aperture_size % 2 == 0 {
            return Err(DetectError::InvalidAperture(self.aperture_size));
        }
        if self.grid_dim < 3 {
            return Err(DetectError::InvalidGridDim(self.grid_dim));
        }
        if self.canvas_size < self.grid_dim || self.canvas_size % self.grid_dim != 0 {
            return Err(DetectError::InvalidCanvas {
                canvas: self.canvas_size,
                grid: self.grid_dim,
            });
        }
        Ok(())
    }
}
