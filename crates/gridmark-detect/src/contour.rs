//! Border following with full nesting hierarchy (Suzuki & Abe, 1985).
//!
//! Every nonzero pixel of the input is foreground. Outer borders and hole
//! borders are traced with 8-connectivity and every border pixel is kept.

use gridmark_core::GrayImageView;
use nalgebra::Point2;
use serde::Serialize;

/// A traced border in image coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Contour {
    pub points: Vec<Point2<i32>>,
    /// `true` for the border between a foreground region and a hole inside it.
    pub is_hole: bool,
}

/// Tree links of one contour. Top-level contours have no parent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HierarchyEntry {
    pub next: Option<usize>,
    pub prev: Option<usize>,
    pub first_child: Option<usize>,
    pub parent: Option<usize>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ContourSet {
    pub contours: Vec<Contour>,
    pub hierarchy: Vec<HierarchyEntry>,
}

impl ContourSet {
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Indices of contours that sit inside another contour and enclose at
    /// least one contour themselves.
    pub fn nested(&self) -> impl Iterator<Item = usize> + '_ {
        self.hierarchy
            .iter()
            .enumerate()
            .filter(|(_, h)| h.parent.is_some() && h.first_child.is_some())
            .map(|(i, _)| i)
    }
}

// Neighbour offsets (dx, dy), index increasing counter-clockwise on screen
// starting east.
const DIRS: [(isize, isize); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

const EAST: usize = 0;
const WEST: usize = 4;

fn direction_of(dx: isize, dy: isize) -> usize {
    match (dx, dy) {
        (1, 0) => 0,
        (1, -1) => 1,
        (0, -1) => 2,
        (-1, -1) => 3,
        (-1, 0) => 4,
        (-1, 1) => 5,
        (0, 1) => 6,
        _ => 7,
    }
}

struct Labels {
    f: Vec<i32>,
    stride: usize,
}

impl Labels {
    #[inline]
    fn step(&self, idx: usize, dir: usize) -> usize {
        let (dx, dy) = DIRS[dir];
        (idx as isize + dy * self.stride as isize + dx) as usize
    }

    #[inline]
    fn dir_between(&self, from: usize, to: usize) -> usize {
        let s = self.stride as isize;
        let d = to as isize - from as isize;
        // neighbours only, so the row offset is the rounded quotient
        let dy = (d + s / 2).div_euclid(s);
        let dx = d - dy * s;
        direction_of(dx, dy)
    }

    /// Trace one border starting at `start`; `from` points at the zero pixel
    /// that triggered the start. Returns the padded indices of border pixels.
    fn follow(&mut self, start: usize, from: usize, nbd: i32) -> Vec<usize> {
        // clockwise search for the first nonzero neighbour
        let first = (0..8)
            .map(|k| (from + 8 - k) % 8)
            .map(|d| self.step(start, d))
            .find(|&q| self.f[q] != 0);

        let Some(p1) = first else {
            self.f[start] = -nbd;
            return vec![start];
        };

        let mut points = Vec::new();
        let mut prev = p1;
        let mut cur = start;
        loop {
            points.push(cur);

            // counter-clockwise search starting just after `prev`
            let d_prev = self.dir_between(cur, prev);
            let mut east_zero = false;
            let mut next = prev;
            for k in 1..=8 {
                let d = (d_prev + k) % 8;
                let q = self.step(cur, d);
                if self.f[q] != 0 {
                    next = q;
                    break;
                }
                if d == EAST {
                    east_zero = true;
                }
            }

            if east_zero {
                self.f[cur] = -nbd;
            } else if self.f[cur] == 1 {
                self.f[cur] = nbd;
            }

            if next == start && cur == p1 {
                break;
            }
            prev = cur;
            cur = next;
        }
        points
    }
}

/// Trace all borders of `binary` and build the containment tree.
pub fn find_contours(binary: &GrayImageView<'_>) -> ContourSet {
    let stride = binary.width + 2;
    let rows = binary.height + 2;

    // one pixel of zero padding so every neighbour lookup stays in bounds
    let mut labels = Labels {
        f: vec![0; stride * rows],
        stride,
    };
    for y in 0..binary.height {
        for x in 0..binary.width {
            if binary.get(x, y) != 0 {
                labels.f[(y + 1) * stride + x + 1] = 1;
            }
        }
    }

    let mut contours: Vec<Contour> = Vec::new();
    let mut parents: Vec<Option<usize>> = Vec::new();

    // Border number 1 is the frame (a hole border); border `n >= 2` is
    // `contours[n - 2]`.
    let mut nbd: i32 = 1;
    for y in 1..rows - 1 {
        let mut lnbd: i32 = 1;
        for x in 1..stride - 1 {
            let idx = y * stride + x;
            let v = labels.f[idx];
            if v == 0 {
                continue;
            }

            let start = if v == 1 && labels.f[idx - 1] == 0 {
                Some((false, WEST))
            } else if v >= 1 && labels.f[idx + 1] == 0 {
                if v > 1 {
                    lnbd = v;
                }
                Some((true, EAST))
            } else {
                None
            };

            if let Some((is_hole, from)) = start {
                nbd += 1;

                let (prev_is_hole, prev_parent, prev_idx) = if lnbd <= 1 {
                    (true, None, None)
                } else {
                    let k = (lnbd - 2) as usize;
                    (contours[k].is_hole, parents[k], Some(k))
                };
                let parent = if is_hole == prev_is_hole {
                    prev_parent
                } else {
                    prev_idx
                };

                let traced = labels.follow(idx, from, nbd);
                let points = traced
                    .into_iter()
                    .map(|i| Point2::new((i % stride) as i32 - 1, (i / stride) as i32 - 1))
                    .collect();
                contours.push(Contour { points, is_hole });
                parents.push(parent);
            }

            let v = labels.f[idx];
            if v != 1 {
                lnbd = v.abs();
            }
        }
    }

    let hierarchy = link_hierarchy(&parents);
    log::trace!("traced {} borders", contours.len());

    ContourSet {
        contours,
        hierarchy,
    }
}

fn link_hierarchy(parents: &[Option<usize>]) -> Vec<HierarchyEntry> {
    let mut out = vec![HierarchyEntry::default(); parents.len()];
    let mut last_root: Option<usize> = None;
    let mut last_child: Vec<Option<usize>> = vec![None; parents.len()];

    for (i, &parent) in parents.iter().enumerate() {
        out[i].parent = parent;
        let prev = match parent {
            Some(p) => {
                if out[p].first_child.is_none() {
                    out[p].first_child = Some(i);
                }
                last_child[p].replace(i)
            }
            None => last_root.replace(i),
        };
        if let Some(s) = prev {
            out[s].next = Some(i);
            out[i].prev = Some(s);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridmark_core::GrayImage;

    fn image_from_rows(rows: &[&str]) -> GrayImage {
        let h = rows.len();
        let w = rows[0].len();
        let data = rows
            .iter()
            .flat_map(|r| r.bytes().map(|b| if b == b'#' { 255 } else { 0 }))
            .collect();
        GrayImage {
            width: w,
            height: h,
            data,
        }
    }

    #[test]
    fn empty_image_has_no_contours() {
        let img = GrayImage::filled(8, 8, 0);
        assert!(find_contours(&img.view()).is_empty());
    }

    #[test]
    fn isolated_pixel_is_a_single_point_border() {
        let img = image_from_rows(&["...", ".#.", "..."]);
        let set = find_contours(&img.view());
        assert_eq!(set.len(), 1);
        assert_eq!(set.contours[0].points, vec![Point2::new(1, 1)]);
        assert!(!set.contours[0].is_hole);
        assert_eq!(set.hierarchy[0], HierarchyEntry::default());
    }

    #[test]
    fn filled_square_traces_every_border_pixel() {
        let img = image_from_rows(&[".....", ".###.", ".###.", ".###.", "....."]);
        let set = find_contours(&img.view());
        assert_eq!(set.len(), 1);
        let pts = &set.contours[0].points;
        assert_eq!(pts.len(), 8);
        assert_eq!(pts[0], Point2::new(1, 1));
        assert!(!pts.contains(&Point2::new(2, 2)));
        // counter-clockwise on screen: down the left side first
        assert_eq!(pts[1], Point2::new(1, 2));
    }

    #[test]
    fn ring_yields_outer_and_hole_with_nesting() {
        let img = image_from_rows(&[
            ".......",
            ".#####.",
            ".#...#.",
            ".#...#.",
            ".#...#.",
            ".#####.",
            ".......",
        ]);
        let set = find_contours(&img.view());
        assert_eq!(set.len(), 2);
        let (outer, hole) = (&set.contours[0], &set.contours[1]);
        assert!(!outer.is_hole);
        assert!(hole.is_hole);
        assert_eq!(outer.points.len(), 16);
        // ring corners do not touch the hole through a 4-neighbour
        assert_eq!(hole.points.len(), 12);
        assert!(!hole.points.contains(&Point2::new(1, 1)));
        assert_eq!(set.hierarchy[0].first_child, Some(1));
        assert_eq!(set.hierarchy[0].parent, None);
        assert_eq!(set.hierarchy[1].parent, Some(0));
        // nothing is both nested and a parent yet
        assert_eq!(set.nested().count(), 0);
    }

    #[test]
    fn blob_inside_ring_makes_the_hole_a_nested_parent() {
        let img = image_from_rows(&[
            ".........",
            ".#######.",
            ".#.....#.",
            ".#.###.#.",
            ".#.###.#.",
            ".#.###.#.",
            ".#.....#.",
            ".#######.",
            ".........",
        ]);
        let set = find_contours(&img.view());
        assert_eq!(set.len(), 3);
        assert!(set.contours[1].is_hole);
        assert_eq!(set.hierarchy[1].parent, Some(0));
        assert_eq!(set.hierarchy[2].parent, Some(1));
        assert_eq!(set.hierarchy[1].first_child, Some(2));
        assert_eq!(set.nested().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn separate_blobs_are_siblings() {
        let img = image_from_rows(&["......", ".#..#.", "......"]);
        let set = find_contours(&img.view());
        assert_eq!(set.len(), 2);
        assert_eq!(set.hierarchy[0].next, Some(1));
        assert_eq!(set.hierarchy[1].prev, Some(0));
        assert_eq!(set.hierarchy[0].parent, None);
        assert_eq!(set.hierarchy[1].parent, None);
    }

    #[test]
    fn foreground_touching_the_edge_is_traced() {
        let img = GrayImage::filled(4, 3, 255);
        let set = find_contours(&img.view());
        assert_eq!(set.len(), 1);
        assert_eq!(set.contours[0].points.len(), 10);
        assert!(set
            .contours[0]
            .points
            .iter()
            .all(|p| p.x >= 0 && p.y >= 0 && p.x < 4 && p.y < 3));
    }
}
