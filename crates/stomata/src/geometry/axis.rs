//! Measurement axes on traced polygons.
//!
//! The pore length axis (AB) comes either from the model keypoints or from
//! the polygon's principal extent. The width axis (CD) and the guard-cell
//! spans are found by extending a line through the AB midpoint and
//! intersecting it with the polygon ring.

use nalgebra::{Point2, Rotation2, Vector2};
use std::f64::consts::FRAC_PI_2;

use super::keypoints::KeypointPair;
use super::polygon::Polygon;

/// The probe line is the AB segment scaled by this factor about its midpoint.
const PROBE_SCALE: f64 = 10.0;
const MERGE_EPS: f64 = 1e-9;

/// Endpoints of the polygon's extent along its dominant axis.
///
/// The dominant axis is x when the x span is strictly larger, else y. At
/// each extreme the minor coordinate is the midpoint of the first and last
/// vertex tied at that extreme. A sits at the minimum, B at the maximum.
pub fn extract_principal_axis_keypoints(polygon: &Polygon) -> KeypointPair {
    let b = polygon.bounds();
    let major_is_x = b.width() > b.height();
    let (lo, hi) = if major_is_x { (b.x1, b.x2) } else { (b.y1, b.y2) };

    let split = |v: &[f64; 2]| if major_is_x { (v[0], v[1]) } else { (v[1], v[0]) };
    let minor_at = |extreme: f64| {
        let mut tied = polygon
            .vertices()
            .iter()
            .map(split)
            .filter(|&(major, _)| major == extreme)
            .map(|(_, minor)| minor);
        let first = tied.next().unwrap_or_default();
        let last = tied.last().unwrap_or(first);
        0.5 * (first + last)
    };

    let (minor_lo, minor_hi) = (minor_at(lo), minor_at(hi));
    if major_is_x {
        KeypointPair::new([lo, minor_lo], [hi, minor_hi])
    } else {
        KeypointPair::new([minor_lo, lo], [minor_hi, hi])
    }
}

/// Width axis: the AB segment turned 90° about its midpoint and intersected
/// with the polygon ring.
///
/// Fewer than two crossings yields `None`; more than two keeps the most
/// distant pair. C is the crossing with the smaller y.
pub fn find_perpendicular_axis(polygon: &Polygon, axis: &KeypointPair) -> Option<KeypointPair> {
    let (p0, p1) = probe_line(axis, FRAC_PI_2)?;
    let (u, v) = farthest_pair(&ring_crossings(polygon, p0, p1))?;
    let (c, d) = if u.y > v.y { (v, u) } else { (u, v) };
    Some(KeypointPair::new([c.x, c.y], [d.x, d.y]))
}

/// Groove axis: the AB line itself extended and intersected with the ring,
/// ordered along the A -> B direction.
pub fn find_collinear_axis(polygon: &Polygon, axis: &KeypointPair) -> Option<KeypointPair> {
    let (p0, p1) = probe_line(axis, 0.0)?;
    let (u, v) = farthest_pair(&ring_crossings(polygon, p0, p1))?;
    let dir = p1 - p0;
    let (first, second) = if (u - p0).dot(&dir) <= (v - p0).dot(&dir) {
        (u, v)
    } else {
        (v, u)
    };
    Some(KeypointPair::new([first.x, first.y], [second.x, second.y]))
}

fn probe_line(axis: &KeypointPair, angle: f64) -> Option<(Point2<f64>, Point2<f64>)> {
    let a = Point2::new(axis.a[0], axis.a[1]);
    let b = Point2::new(axis.b[0], axis.b[1]);
    if (b - a).norm() < MERGE_EPS {
        return None;
    }
    let mid = nalgebra::center(&a, &b);
    let half = Rotation2::new(angle) * (b - mid) * PROBE_SCALE;
    Some((mid - half, mid + half))
}

/// Distinct crossings of segment `p0 -> p1` with the polygon ring.
fn ring_crossings(polygon: &Polygon, p0: Point2<f64>, p1: Point2<f64>) -> Vec<Point2<f64>> {
    let mut points: Vec<Point2<f64>> = Vec::new();
    for (q0, q1) in polygon.edges() {
        let q0 = Point2::new(q0[0], q0[1]);
        let q1 = Point2::new(q1[0], q1[1]);
        if let Some(p) = segment_intersection(p0, p1, q0, q1) {
            if !points.iter().any(|known| (known - p).norm() < MERGE_EPS) {
                points.push(p);
            }
        }
    }
    points
}

fn cross(u: &Vector2<f64>, v: &Vector2<f64>) -> f64 {
    u.x * v.y - u.y * v.x
}

fn segment_intersection(
    p0: Point2<f64>,
    p1: Point2<f64>,
    q0: Point2<f64>,
    q1: Point2<f64>,
) -> Option<Point2<f64>> {
    let r = p1 - p0;
    let s = q1 - q0;
    let denom = cross(&r, &s);
    if denom.abs() < 1e-12 {
        return None;
    }
    let w = q0 - p0;
    let t = cross(&w, &s) / denom;
    let u = cross(&w, &r) / denom;
    let range = -MERGE_EPS..=1.0 + MERGE_EPS;
    (range.contains(&t) && range.contains(&u)).then(|| p0 + r * t)
}

fn farthest_pair(points: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    if points.len() < 2 {
        return None;
    }
    let mut best = (points[0], points[1]);
    let mut best_d2 = (points[1] - points[0]).norm_squared();
    for (i, p) in points.iter().enumerate() {
        for q in &points[i + 1..] {
            let d2 = (q - p).norm_squared();
            if d2 > best_d2 {
                best = (*p, *q);
                best_d2 = d2;
            }
        }
    }
    Some(best)
}
