//! Bit-grid sampling, border validation and orientation recovery.
//!
//! A marker is a `grid_dim × grid_dim` grid whose outer ring is black. The
//! inner payload carries its own orientation key: in the canonical pose the
//! top-left payload cell is black and the other three payload corners are
//! white.

use crate::detector::RejectReason;
use gridmark_core::GrayImage;
use serde::{Deserialize, Serialize};

/// Square grid of bits, row-major. 1 is white, 0 is black.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitGrid {
    side: usize,
    bits: Vec<u8>,
}

impl BitGrid {
    pub fn new(side: usize) -> Self {
        Self {
            side,
            bits: vec![0; side * side],
        }
    }

    /// Build from rows; `None` when the rows do not form a square.
    /// Any nonzero entry is stored as 1.
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Option<Self> {
        let side = rows.len();
        if rows.iter().any(|r| r.as_ref().len() != side) {
            return None;
        }
        let bits = rows
            .iter()
            .flat_map(|r| r.as_ref().iter().map(|&b| u8::from(b != 0)))
            .collect();
        Some(Self { side, bits })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.bits[row * self.side + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, bit: u8) {
        self.bits[row * self.side + col] = u8::from(bit != 0);
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.bits.chunks(self.side.max(1)).map(<[u8]>::to_vec).collect()
    }

    /// Rotate 90° counter-clockwise `quarter_turns` times.
    pub fn rotate_ccw(&self, quarter_turns: usize) -> Self {
        let n = self.side;
        let mut cur = self.clone();
        for _ in 0..quarter_turns % 4 {
            let mut next = Self::new(n);
            for i in 0..n {
                for j in 0..n {
                    next.set(i, j, cur.get(j, n - 1 - i));
                }
            }
            cur = next;
        }
        cur
    }

    /// True when every cell of the outer ring is 0.
    pub fn border_is_black(&self) -> bool {
        let n = self.side;
        (0..n).all(|k| {
            self.get(0, k) == 0 && self.get(n - 1, k) == 0 && self.get(k, 0) == 0 && self.get(k, n - 1) == 0
        })
    }

    /// The grid without its outer ring.
    pub fn interior(&self) -> Self {
        let n = self.side.saturating_sub(2);
        let mut out = Self::new(n);
        for r in 0..n {
            for c in 0..n {
                out.set(r, c, self.get(r + 1, c + 1));
            }
        }
        out
    }

    /// Corner cells in `(TL, BL, BR, TR)` order.
    pub fn corner_signature(&self) -> [u8; 4] {
        let n = self.side - 1;
        [self.get(0, 0), self.get(n, 0), self.get(n, n), self.get(0, n)]
    }
}

/// A decoded marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Counter-clockwise rotation, in degrees, that brings the sampled
    /// payload into canonical pose: 0, 90, 180 or 270.
    pub angle: u16,
    /// Payload in canonical pose.
    pub payload: BitGrid,
}

impl Marker {
    pub fn quarter_turns(&self) -> usize {
        (self.angle / 90) as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    Accepted(Marker),
    Rejected(RejectReason),
}

/// Map a `(TL, BL, BR, TR)` payload corner signature to the rotation angle.
pub fn orientation_angle(signature: [u8; 4]) -> Option<u16> {
    match signature {
        [0, 1, 1, 1] => Some(0),
        [1, 0, 1, 1] => Some(270),
        [1, 1, 0, 1] => Some(180),
        [1, 1, 1, 0] => Some(90),
        _ => None,
    }
}

/// Sample cell centres of a binarised `S × S` patch into a bit grid.
///
/// Returns `None` when the patch has fewer pixels per side than `grid_dim`.
pub fn sample_grid(patch: &GrayImage, grid_dim: usize) -> Option<BitGrid> {
    if grid_dim == 0 || patch.width < grid_dim || patch.height < grid_dim {
        return None;
    }
    let pitch = patch.width / grid_dim;
    let start = pitch / 2;
    let mut grid = BitGrid::new(grid_dim);
    for row in 0..grid_dim {
        for col in 0..grid_dim {
            let x = (start + col * pitch).min(patch.width - 1);
            let y = (start + row * pitch).min(patch.height - 1);
            grid.set(row, col, u8::from(patch.get(x, y) != 0));
        }
    }
    Some(grid)
}

/// Validate the border of a sampled grid and recover the payload orientation.
pub fn decode_grid(grid: &BitGrid) -> Decoded {
    if grid.side() < 3 || !grid.border_is_black() {
        return Decoded::Rejected(RejectReason::BorderNotBlack);
    }
    let interior = grid.interior();
    let corners = interior.corner_signature();
    match orientation_angle(corners) {
        Some(angle) => Decoded::Accepted(Marker {
            angle,
            payload: interior.rotate_ccw((angle / 90) as usize),
        }),
        None => Decoded::Rejected(RejectReason::InvalidOrientation { corners }),
    }
}

/// Sample and decode a rectified patch.
pub fn decode(patch: &GrayImage, grid_dim: usize) -> Decoded {
    match sample_grid(patch, grid_dim) {
        Some(grid) if grid_dim >= 3 => decode_grid(&grid),
        _ => Decoded::Rejected(RejectReason::UnsampleableGrid { grid_dim }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[u8]]) -> BitGrid {
        BitGrid::from_rows(rows).expect("square")
    }

    // Paint a bit grid onto a patch, `cell` pixels per bit.
    fn patch_from(grid: &BitGrid, cell: usize) -> GrayImage {
        let side = grid.side() * cell;
        let mut img = GrayImage::filled(side, side, 0);
        for y in 0..side {
            for x in 0..side {
                img.set(x, y, grid.get(y / cell, x / cell) * 255);
            }
        }
        img
    }

    fn framed(payload: &BitGrid) -> BitGrid {
        let n = payload.side() + 2;
        let mut g = BitGrid::new(n);
        for r in 0..payload.side() {
            for c in 0..payload.side() {
                g.set(r + 1, c + 1, payload.get(r, c));
            }
        }
        g
    }

    fn canonical() -> BitGrid {
        grid(&[&[0, 1, 1, 1], &[1, 1, 0, 1], &[1, 0, 1, 1], &[1, 1, 1, 1]])
    }

    #[test]
    fn rotate_ccw_moves_top_right_to_top_left() {
        let g = grid(&[&[1, 2], &[3, 4]]);
        // from_rows stores any nonzero as 1, so check positions with a sparse grid
        let mut sparse = BitGrid::new(3);
        sparse.set(0, 2, 1);
        assert_eq!(sparse.rotate_ccw(1).get(0, 0), 1);
        assert_eq!(sparse.rotate_ccw(2).get(2, 0), 1);
        assert_eq!(sparse.rotate_ccw(3).get(2, 2), 1);
        assert_eq!(sparse.rotate_ccw(4), sparse);
        assert_eq!(g.to_rows(), vec![vec![1, 1], vec![1, 1]]);
    }

    #[test]
    fn canonical_patch_decodes_with_zero_angle() {
        let patch = patch_from(&framed(&canonical()), 20);
        let Decoded::Accepted(marker) = decode(&patch, 6) else {
            panic!("expected a marker");
        };
        assert_eq!(marker.angle, 0);
        assert_eq!(marker.payload, canonical());
    }

    #[test]
    fn every_rotation_decodes_to_the_same_payload() {
        for k in 0..4 {
            // the sampled payload is the canonical one turned clockwise k times
            let seen = canonical().rotate_ccw((4 - k) % 4);
            let patch = patch_from(&framed(&seen), 20);
            let Decoded::Accepted(marker) = decode(&patch, 6) else {
                panic!("rotation {k} rejected");
            };
            assert_eq!(marker.payload, canonical(), "rotation {k}");
            assert_eq!(marker.quarter_turns(), k);
        }
    }

    #[test]
    fn bottom_left_key_means_270() {
        let seen = grid(&[&[1, 0, 1, 1], &[1, 1, 0, 1], &[1, 1, 1, 1], &[0, 1, 1, 1]]);
        let Decoded::Accepted(marker) = decode_grid(&framed(&seen)) else {
            panic!("expected a marker");
        };
        assert_eq!(marker.angle, 270);
        // 270° counter-clockwise is one clockwise turn
        assert_eq!(marker.payload, seen.rotate_ccw(3));
        assert_eq!(marker.payload.get(0, 0), 0);
    }

    #[test]
    fn any_white_border_cell_rejects() {
        let base = framed(&canonical());
        let n = base.side();
        for r in 0..n {
            for c in 0..n {
                if r != 0 && c != 0 && r != n - 1 && c != n - 1 {
                    continue;
                }
                let mut g = base.clone();
                g.set(r, c, 1);
                assert_eq!(
                    decode_grid(&g),
                    Decoded::Rejected(RejectReason::BorderNotBlack),
                    "cell ({r},{c})"
                );
            }
        }
    }

    #[test]
    fn ambiguous_keys_are_rejected() {
        let cases: [&[&[u8]]; 3] = [
            &[&[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]],
            &[&[1, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 1]],
            &[&[0, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 1], &[1, 1, 1, 0]],
        ];
        for rows in cases {
            let payload = grid(rows);
            let sig = payload.corner_signature();
            assert_eq!(
                decode_grid(&framed(&payload)),
                Decoded::Rejected(RejectReason::InvalidOrientation { corners: sig })
            );
        }
    }

    #[test]
    fn sampling_uses_cell_centres() {
        let g = framed(&canonical());
        let patch = patch_from(&g, 20);
        assert_eq!(sample_grid(&patch, 6), Some(g));
    }

    #[test]
    fn unusable_grid_dimensions_are_rejected() {
        let patch = GrayImage::filled(120, 120, 0);
        for grid_dim in [0, 1, 2, 121] {
            assert_eq!(
                decode(&patch, grid_dim),
                Decoded::Rejected(RejectReason::UnsampleableGrid { grid_dim }),
                "grid_dim {grid_dim}"
            );
        }
        assert_eq!(sample_grid(&GrayImage::filled(4, 4, 0), 6), None);
    }
}
