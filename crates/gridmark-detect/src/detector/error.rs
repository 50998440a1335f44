use gridmark_core::ImageError;
use serde::{Deserialize, Serialize};

/// Errors returned by the marker detector.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("threshold aperture must be odd and >= 3 (got {0})")]
    InvalidAperture(usize),
    #[error("marker grid dimension must be >= 3 (got {0})")]
    InvalidGridDim(usize),
    #[error("canvas of {canvas} px is not a multiple of grid dimension {grid}")]
    InvalidCanvas { canvas: usize, grid: usize },
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// Why a quadrilateral candidate did not become a detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// Zero area or collinear corners; no perspective transform exists.
    DegenerateQuad,
    /// At least one border cell of the sampled grid is white.
    BorderNotBlack,
    /// `grid_dim` is below 3 or exceeds the patch side in pixels.
    UnsampleableGrid { grid_dim: usize },
    /// Payload corners `(TL, BL, BR, TR)` do not contain exactly one black cell.
    InvalidOrientation { corners: [u8; 4] },
}
