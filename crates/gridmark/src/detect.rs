use crate::{core, DetectError, Detection, DetectionRun, Detector, DetectorParams};
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Convert an `image::GrayImage` into the lightweight `gridmark-core` view type.
pub fn gray_view(img: &::image::GrayImage) -> core::GrayImageView<'_> {
    core::GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Copy a `gridmark-core` image into an `image::GrayImage`.
///
/// Returns `None` if the dimensions do not fit in `u32`.
pub fn to_image_gray(img: &core::GrayImage) -> Option<::image::GrayImage> {
    let w = u32::try_from(img.width).ok()?;
    let h = u32::try_from(img.height).ok()?;
    ::image::GrayImage::from_raw(w, h, img.data.clone())
}

/// Load any format `image` understands and convert it to 8-bit grayscale.
pub fn load_gray(path: impl AsRef<Path>) -> Result<::image::GrayImage, ::image::ImageError> {
    Ok(::image::open(path)?.to_luma8())
}

/// Run the detector on a grayscale frame, keeping rejections and counts.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, detector), fields(width = img.width(), height = img.height()))
)]
pub fn run_image(
    img: &::image::GrayImage,
    detector: &Detector,
) -> Result<DetectionRun, DetectError> {
    detector.run(&gray_view(img))
}

/// Validate `params` and detect markers in a grayscale frame.
pub fn detect_image(
    img: &::image::GrayImage,
    params: &DetectorParams,
) -> Result<Vec<Detection>, DetectError> {
    gridmark_detect::detect(&gray_view(img), params)
}

/// Detect markers in a frame of any pixel format (e.g. RGB camera frames).
pub fn detect_dynamic(
    img: &::image::DynamicImage,
    params: &DetectorParams,
) -> Result<Vec<Detection>, DetectError> {
    match img {
        ::image::DynamicImage::ImageLuma8(gray) => detect_image(gray, params),
        other => detect_image(&other.to_luma8(), params),
    }
}
