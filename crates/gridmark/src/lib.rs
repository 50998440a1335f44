//! High-level facade crate for the `gridmark-*` workspace.
//!
//! This crate provides:
//! - re-exports of the core types and the detection pipeline
//! - (feature `image`) helpers that run the detector directly on
//!   `image::GrayImage` / `image::DynamicImage` frames
//! - (feature `cli`) the `gridmark` command-line tool
//!
//! ## Quickstart
//!
//! ```no_run
//! use gridmark::{detect, DetectorParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("frame.png")?;
//! let detections = detect::detect_dynamic(&img, &DetectorParams::default())?;
//! for d in &detections {
//!     println!("angle {} at {:?}", d.marker.angle, d.corners[0]);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `gridmark::core`: grayscale images, sampling, homographies, logging.
//! - `gridmark::pipeline`: the individual stages (threshold, contours,
//!   quads, rectification, decoding), rendering and JSON I/O.
//! - `gridmark::detect` (feature `image`): end-to-end helpers from `image` types.

pub use gridmark_core as core;
pub use gridmark_detect as pipeline;

pub use gridmark_core::{GrayImage, GrayImageView, Homography};
pub use gridmark_detect::{
    BitGrid, DetectError, Detection, DetectionRun, Detector, DetectorParams, Marker, Quad,
    RejectReason,
};

#[cfg(feature = "image")]
pub mod detect;
