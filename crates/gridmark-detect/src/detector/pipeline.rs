use super::{DetectError, Detection, DetectionRun, DetectorParams, RejectReason, Rejection};
use crate::decode::{decode, Decoded};
use crate::quad::{find_quads, Quad, QuadSearch};
use crate::rectify::{canvas_to_image, rectify, rotate_image_ccw};
use crate::threshold::adaptive_threshold_mean;
use gridmark_core::{GrayImage, GrayImageView};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Square binary-grid marker detector.
///
/// Stateless apart from its parameters; one detector can process any number
/// of frames, from several threads at once.
#[derive(Clone, Debug)]
pub struct Detector {
    params: DetectorParams,
}

impl Detector {
    /// Create a detector, rejecting parameters the pipeline cannot run with.
    pub fn new(params: DetectorParams) -> Result<Self, DetectError> {
        params.validate()?;
        Ok(Self { params })
    }

    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Adaptive-threshold segmentation of the frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn segment(&self, frame: &GrayImageView<'_>) -> Result<GrayImage, DetectError> {
        let frame = checked(frame)?;
        Ok(adaptive_threshold_mean(
            &frame,
            self.params.aperture_size,
            self.params.threshold_bias,
        ))
    }

    /// Nested quadrilaterals of the frame, corners refined and in canvas winding.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, frame)))]
    pub fn find_quads(&self, frame: &GrayImageView<'_>) -> Result<QuadSearch, DetectError> {
        let binary = self.segment(frame)?;
        Ok(find_quads(
            frame,
            &binary.view(),
            self.params.approx_epsilon,
            &self.params.subpix,
        ))
    }

    /// Rectify and decode a single candidate.
    ///
    /// `frame` must be well formed (as returned by `GrayImageView::from_raw`);
    /// [`Detector::run`] checks this before calling here.
    pub fn decode_quad(
        &self,
        frame: &GrayImageView<'_>,
        quad: &Quad,
    ) -> Result<Detection, RejectReason> {
        let p = &self.params;
        let patch = rectify(frame, quad, p.canvas_size, &p.erode)?;
        let marker = match decode(&patch.image, p.grid_dim) {
            Decoded::Accepted(marker) => marker,
            Decoded::Rejected(reason) => return Err(reason),
        };

        let turns = marker.quarter_turns();
        let oriented = quad.rolled(turns);
        let h_img_from_canvas = canvas_to_image(&oriented, p.canvas_size)?;
        Ok(Detection {
            quad: *quad,
            corners: oriented.corners,
            marker,
            h_img_from_canvas,
            // canonical pose: key corner top-left
            patch: p
                .keep_patches
                .then(|| rotate_image_ccw(&patch.image, turns)),
        })
    }

    /// Run the full pipeline and keep the bookkeeping.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn run(&self, frame: &GrayImageView<'_>) -> Result<DetectionRun, DetectError> {
        let search = self.find_quads(frame)?;

        #[cfg(feature = "rayon")]
        let outcomes: Vec<_> = search
            .quads
            .par_iter()
            .map(|q| (q, self.decode_quad(frame, q)))
            .collect();
        #[cfg(not(feature = "rayon"))]
        let outcomes: Vec<_> = search
            .quads
            .iter()
            .map(|q| (q, self.decode_quad(frame, q)))
            .collect();

        let mut run = DetectionRun {
            num_contours: search.num_contours,
            num_nested: search.num_nested,
            num_quads: search.quads.len(),
            ..DetectionRun::default()
        };
        for (quad, outcome) in outcomes {
            match outcome {
                Ok(det) => run.detections.push(det),
                Err(reason) => {
                    log::trace!("quad {:?} rejected: {:?}", quad.corners, reason);
                    run.rejections.push(Rejection {
                        quad: *quad,
                        reason,
                    });
                }
            }
        }

        log::debug!(
            "{} detections from {} quads ({} rejected)",
            run.detections.len(),
            run.num_quads,
            run.rejections.len()
        );
        Ok(run)
    }

    /// Decoded markers of the frame, in contour order.
    pub fn detect(&self, frame: &GrayImageView<'_>) -> Result<Vec<Detection>, DetectError> {
        Ok(self.run(frame)?.detections)
    }
}

/// Re-check a view that may have been built by hand.
fn checked<'a>(frame: &GrayImageView<'a>) -> Result<GrayImageView<'a>, DetectError> {
    Ok(GrayImageView::from_raw(
        frame.data,
        frame.width,
        frame.height,
    )?)
}

/// Validate `params` and detect markers in one go.
pub fn detect(
    frame: &GrayImageView<'_>,
    params: &DetectorParams,
) -> Result<Vec<Detection>, DetectError> {
    Detector::new(params.clone())?.detect(frame)
}

/// Adaptive-threshold segmentation with validated parameters.
pub fn segment(
    frame: &GrayImageView<'_>,
    aperture_size: usize,
    threshold_bias: i32,
) -> Result<GrayImage, DetectError> {
    if aperture_size < 3 || aperture_size % 2 == 0 {
        return Err(DetectError::InvalidAperture(aperture_size));
    }
    Ok(adaptive_threshold_mean(
        &checked(frame)?,
        aperture_size,
        threshold_bias,
    ))
}
