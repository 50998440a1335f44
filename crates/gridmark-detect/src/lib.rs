//! Square binary-grid fiducial marker detection.
//!
//! The pipeline runs in four stages over an 8-bit grayscale frame:
//!
//! 1. [`segment`]: adaptive mean threshold into a binary map.
//! 2. [`find_quads`]: border following with nesting, polygon simplification
//!    and sub-pixel corner refinement; keeps nested quadrilaterals.
//! 3. [`rectify`]: perspective warp onto a square canvas, Otsu binarisation
//!    and erosion.
//! 4. [`decode`]: bit-grid sampling, black-border check and orientation
//!    recovery from the payload's single black corner.
//!
//! [`Detector`] chains them:
//!
//! ```
//! use gridmark_core::GrayImage;
//! use gridmark_detect::{Detector, DetectorParams};
//!
//! let frame = GrayImage::filled(64, 64, 255);
//! let detector = Detector::new(DetectorParams::default()).unwrap();
//! assert!(detector.detect(&frame.view()).unwrap().is_empty());
//! ```

pub mod contour;
pub mod decode;
mod detector;
pub mod io;
pub mod morphology;
pub mod overlay;
pub mod polygon;
pub mod quad;
pub mod rectify;
pub mod render;
pub mod subpix;
pub mod threshold;

pub use decode::{decode, decode_grid, BitGrid, Decoded, Marker};
pub use detector::{
    detect, segment, DetectError, Detection, DetectionRun, Detector, DetectorParams, RejectReason,
    Rejection,
};
pub use io::{DetectConfig, DetectIoError, DetectReport};
pub use morphology::ErodeParams;
pub use quad::{find_quads, Quad, QuadSearch};
pub use rectify::{rectify, RectifiedPatch};
pub use subpix::CornerSubPixParams;
