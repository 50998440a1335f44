//! Polygon simplification for closed contours.

use nalgebra::Point2;

fn perpendicular_distance(p: Point2<i32>, a: Point2<i32>, b: Point2<i32>) -> f64 {
    let (px, py) = (p.x as f64, p.y as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let dx = bx - ax;
    let dy = by - ay;
    let len = dx.hypot(dy);
    if len < 1e-9 {
        return (px - ax).hypot(py - ay);
    }
    (dy * px - dx * py + bx * ay - by * ax).abs() / len
}

fn dist_sq(a: Point2<i32>, b: Point2<i32>) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}

fn farthest_from(points: &[Point2<i32>], from: usize) -> usize {
    let origin = points[from];
    let mut best = from;
    let mut best_d = 0;
    for (i, &p) in points.iter().enumerate() {
        let d = dist_sq(origin, p);
        if d > best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// Douglas-Peucker over the cyclic chain `start → end`, marking kept indices.
fn simplify_chain(points: &[Point2<i32>], start: usize, end: usize, eps: f64, keep: &mut [bool]) {
    let n = points.len();
    let span = (end + n - start) % n;
    let at = |offset: usize| (start + offset) % n;

    let mut stack = vec![(0usize, span)];
    while let Some((lo, hi)) = stack.pop() {
        if hi <= lo + 1 {
            continue;
        }
        let (a, b) = (points[at(lo)], points[at(hi)]);
        let mut max_d = 0.0;
        let mut split = lo;
        for o in lo + 1..hi {
            let d = perpendicular_distance(points[at(o)], a, b);
            if d > max_d {
                max_d = d;
                split = o;
            }
        }
        if max_d > eps {
            keep[at(split)] = true;
            stack.push((lo, split));
            stack.push((split, hi));
        }
    }
}

/// Approximate a closed contour by a polygon whose edges stay within
/// `epsilon` pixels of the original points.
///
/// The simplification starts from two mutually distant contour points, so
/// the result does not depend on where the tracer happened to begin. Vertices
/// come out in contour order.
pub fn approx_poly_closed(points: &[Point2<i32>], epsilon: f64) -> Vec<Point2<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let a = farthest_from(points, 0);
    let b = farthest_from(points, a);
    if a == b {
        return vec![points[a]];
    }

    let mut keep = vec![false; n];
    keep[a] = true;
    keep[b] = true;
    simplify_chain(points, a, b, epsilon, &mut keep);
    simplify_chain(points, b, a, epsilon, &mut keep);

    let mut poly: Vec<Point2<i32>> = (0..n)
        .map(|k| (a + k) % n)
        .filter(|&i| keep[i])
        .map(|i| points[i])
        .collect();

    // The two seed vertices are always kept; drop them (or anything else)
    // when they sit on a straight run between their neighbours.
    let mut changed = true;
    while changed && poly.len() > 3 {
        changed = false;
        let m = poly.len();
        for i in 0..m {
            let prev = poly[(i + m - 1) % m];
            let next = poly[(i + 1) % m];
            if perpendicular_distance(poly[i], prev, next) <= epsilon {
                poly.remove(i);
                changed = true;
                break;
            }
        }
    }

    poly
}

/// Shoelace sum `Σ (x_i · y_{i+1} − x_{i+1} · y_i)`, i.e. twice the signed area.
///
/// With y pointing down, a negative value means the vertices run
/// counter-clockwise on screen.
pub fn shoelace(points: &[Point2<f32>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let p = points[i];
            let q = points[(i + 1) % n];
            p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_border(x0: i32, y0: i32, side: i32) -> Vec<Point2<i32>> {
        // counter-clockwise on screen: down, right, up, left
        let mut pts = Vec::new();
        for y in y0..y0 + side {
            pts.push(Point2::new(x0, y));
        }
        for x in x0..x0 + side {
            pts.push(Point2::new(x, y0 + side));
        }
        for y in (y0 + 1..=y0 + side).rev() {
            pts.push(Point2::new(x0 + side, y));
        }
        for x in (x0 + 1..=x0 + side).rev() {
            pts.push(Point2::new(x, y0));
        }
        pts
    }

    #[test]
    fn square_reduces_to_its_corners() {
        let pts = square_border(10, 20, 30);
        let poly = approx_poly_closed(&pts, 2.5);
        assert_eq!(poly.len(), 4);
        for corner in [
            Point2::new(10, 20),
            Point2::new(10, 50),
            Point2::new(40, 50),
            Point2::new(40, 20),
        ] {
            assert!(poly.contains(&corner), "missing {corner:?} in {poly:?}");
        }
    }

    #[test]
    fn result_is_independent_of_start_point() {
        let pts = square_border(0, 0, 25);
        let mut rotated = pts.clone();
        rotated.rotate_left(7);
        let mut a = approx_poly_closed(&pts, 2.5);
        let mut b = approx_poly_closed(&rotated, 2.5);
        a.sort_by_key(|p| (p.x, p.y));
        b.sort_by_key(|p| (p.x, p.y));
        assert_eq!(a, b);
    }

    #[test]
    fn chamfered_corners_within_epsilon_are_absorbed() {
        // cut each corner by one pixel
        let pts: Vec<_> = square_border(0, 0, 20)
            .into_iter()
            .filter(|p| !matches!((p.x, p.y), (0, 0) | (0, 20) | (20, 20) | (20, 0)))
            .collect();
        assert_eq!(approx_poly_closed(&pts, 2.5).len(), 4);
    }

    #[test]
    fn triangle_keeps_three_vertices() {
        let mut pts = Vec::new();
        for i in 0..20 {
            pts.push(Point2::new(i, 0));
        }
        for i in 0..20 {
            pts.push(Point2::new(20 - i, i));
        }
        for i in 0..20 {
            pts.push(Point2::new(0, 20 - i));
        }
        assert_eq!(approx_poly_closed(&pts, 2.5).len(), 3);
    }

    #[test]
    fn tiny_inputs_pass_through() {
        let one = vec![Point2::new(3, 4)];
        assert_eq!(approx_poly_closed(&one, 2.5), one);
        let same = vec![Point2::new(1, 1); 5];
        assert_eq!(approx_poly_closed(&same, 2.5), vec![Point2::new(1, 1)]);
    }

    #[test]
    fn shoelace_sign_follows_screen_orientation() {
        let canvas = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(0.0, 10.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 0.0),
        ];
        assert_relative_eq!(shoelace(&canvas), -200.0);
        let reversed = [canvas[0], canvas[3], canvas[2], canvas[1]];
        assert_relative_eq!(shoelace(&reversed), 200.0);
    }
}
