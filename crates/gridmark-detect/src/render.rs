//! Synthetic marker images, used by tests, benches and the `render` command.

use crate::decode::{orientation_angle, BitGrid};
use crate::rectify::rotate_image_ccw;
use gridmark_core::{GrayImage, Homography};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// A marker to draw: black border ring around `payload`, `cell_px` pixels per cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSpec {
    pub payload: BitGrid,
    pub cell_px: usize,
}

impl MarkerSpec {
    pub fn new(payload: BitGrid, cell_px: usize) -> Self {
        Self { payload, cell_px }
    }

    /// Cells per side, border included.
    pub fn grid_dim(&self) -> usize {
        self.payload.side() + 2
    }

    pub fn side_px(&self) -> usize {
        self.grid_dim() * self.cell_px
    }

    /// True when the payload carries exactly one black corner, so a detector
    /// can recover its orientation.
    pub fn has_orientation_key(&self) -> bool {
        self.payload.side() >= 1 && orientation_angle(self.payload.corner_signature()).is_some()
    }

    /// Draw the marker in canonical pose.
    pub fn render(&self) -> GrayImage {
        let n = self.grid_dim();
        let side = self.side_px();
        let mut img = GrayImage::filled(side, side, 0);
        for gy in 1..n - 1 {
            for gx in 1..n - 1 {
                if self.payload.get(gy - 1, gx - 1) == 0 {
                    continue;
                }
                for y in gy * self.cell_px..(gy + 1) * self.cell_px {
                    for x in gx * self.cell_px..(gx + 1) * self.cell_px {
                        img.set(x, y, 255);
                    }
                }
            }
        }
        img
    }
}

/// A canvas markers are pasted onto.
#[derive(Clone, Debug)]
pub struct Scene {
    image: GrayImage,
}

impl Scene {
    pub fn new(width: usize, height: usize, background: u8) -> Self {
        Self {
            image: GrayImage::filled(width, height, background),
        }
    }

    /// Paste `marker` with its top-left pixel at `(x, y)`, clipping at the edges.
    pub fn place(&mut self, marker: &GrayImage, x: usize, y: usize) -> &mut Self {
        for my in 0..marker.height {
            for mx in 0..marker.width {
                let (sx, sy) = (x + mx, y + my);
                if sx < self.image.width && sy < self.image.height {
                    self.image.set(sx, sy, marker.get(mx, my));
                }
            }
        }
        self
    }

    /// Paste `marker` after rotating it counter-clockwise in 90° steps.
    pub fn place_rotated(
        &mut self,
        marker: &GrayImage,
        x: usize,
        y: usize,
        quarter_turns: usize,
    ) -> &mut Self {
        self.place(&rotate_image_ccw(marker, quarter_turns), x, y)
    }

    /// Paste `marker` through a projective map from marker pixels to scene
    /// pixels, sampling nearest. Scene pixels outside the marker are untouched.
    pub fn place_warped(&mut self, marker: &GrayImage, h_scene_from_marker: &Homography) -> &mut Self {
        let Some(inv) = h_scene_from_marker.inverse() else {
            log::warn!("singular marker placement ignored");
            return self;
        };
        let (mw, mh) = (marker.width as f32, marker.height as f32);
        let outline = [
            Point2::new(0.0, 0.0),
            Point2::new(0.0, mh),
            Point2::new(mw, mh),
            Point2::new(mw, 0.0),
        ]
        .map(|p| h_scene_from_marker.apply(p));

        let (mut x0, mut y0, mut x1, mut y1) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
        for p in outline {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }
        let clamp_x = |v: f32| v.clamp(0.0, self.image.width as f32) as usize;
        let clamp_y = |v: f32| v.clamp(0.0, self.image.height as f32) as usize;
        let (x0, x1) = (clamp_x(x0.floor()), clamp_x(x1.ceil() + 1.0));
        let (y0, y1) = (clamp_y(y0.floor()), clamp_y(y1.ceil() + 1.0));

        for y in y0..y1 {
            for x in x0..x1 {
                let m = inv.apply(Point2::new(x as f32, y as f32));
                let (mx, my) = (m.x.round(), m.y.round());
                if mx >= 0.0 && my >= 0.0 && mx < mw && my < mh {
                    self.image.set(x, y, marker.get(mx as usize, my as usize));
                }
            }
        }
        self
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }
}
