//! Core types for square fiducial marker detection.
//!
//! This crate is intentionally small: a borrowed/owned 8-bit grayscale frame,
//! bilinear sampling, and the 4-point projective transform used to rectify
//! marker candidates. It does *not* depend on any concrete imaging library.

mod homography;
mod image;
mod logger;

pub use homography::{homography_from_4pt, warp_perspective_gray, Homography};
pub use image::{
    sample_bilinear, sample_bilinear_clamped, sample_bilinear_u8, GrayImage, GrayImageView,
    ImageError,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
