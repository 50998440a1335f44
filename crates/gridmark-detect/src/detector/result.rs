use super::RejectReason;
use crate::decode::Marker;
use crate::quad::Quad;
use gridmark_core::{GrayImage, Homography};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// One decoded marker in a frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Refined corners as found, in canvas winding.
    pub quad: Quad,
    /// The same corners cyclically shifted so `corners[0]` is the marker's
    /// top-left corner in canonical pose.
    pub corners: [Point2<f32>; 4],
    pub marker: Marker,
    /// Maps canonical canvas coordinates to image coordinates.
    pub h_img_from_canvas: Homography,
    /// Rectified binary patch, kept when `DetectorParams::keep_patches` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<GrayImage>,
}

impl Detection {
    /// Mean of the four corners.
    pub fn center(&self) -> Point2<f32> {
        let (sx, sy) = self
            .corners
            .iter()
            .fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
        Point2::new(sx / 4.0, sy / 4.0)
    }
}

/// A candidate that failed after quad extraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub quad: Quad,
    pub reason: RejectReason,
}

/// Everything one detector pass produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionRun {
    pub detections: Vec<Detection>,
    pub rejections: Vec<Rejection>,
    pub num_contours: usize,
    /// Contours with both a parent and a child.
    pub num_nested: usize,
    pub num_quads: usize,
}
