//! Marker detection pipeline.
//!
//! Segmentation, candidate extraction, rectification and decoding are
//! chained here; each stage also lives as a free function in its own module.

mod error;
mod params;
mod pipeline;
mod result;

pub use error::{DetectError, RejectReason};
pub use params::DetectorParams;
pub use pipeline::{detect, segment, Detector};
pub use result::{Detection, DetectionRun, Rejection};
