//! Closed polygons traced from segmentation masks.

use super::bbox::BBox;

/// Closed ring of at least three vertices; the closing edge is implicit.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<[f64; 2]>,
}

impl Polygon {
    /// Returns `None` for fewer than three vertices.
    pub fn new(vertices: Vec<[f64; 2]>) -> Option<Self> {
        (vertices.len() >= 3).then_some(Self { vertices })
    }

    /// Parse `[x0, y0, x1, y1, ...]`.
    pub fn from_flat(values: &[f64]) -> Option<Self> {
        let vertices = values.chunks_exact(2).map(|c| [c[0], c[1]]).collect();
        Self::new(vertices)
    }

    pub fn to_flat(&self) -> Vec<f64> {
        self.vertices.iter().flat_map(|v| [v[0], v[1]]).collect()
    }

    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Edges of the closed ring, including last -> first.
    pub fn edges(&self) -> impl Iterator<Item = ([f64; 2], [f64; 2])> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Shoelace area (unsigned).
    pub fn area(&self) -> f64 {
        let twice: f64 = self
            .edges()
            .map(|(p, q)| p[0] * q[1] - q[0] * p[1])
            .sum();
        0.5 * twice.abs()
    }

    pub fn bounds(&self) -> BBox {
        let mut b = BBox::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for v in &self.vertices {
            b.x1 = b.x1.min(v[0]);
            b.y1 = b.y1.min(v[1]);
            b.x2 = b.x2.max(v[0]);
            b.y2 = b.y2.max(v[1]);
        }
        b
    }

    /// Point inside the ring or on its boundary (even-odd rule).
    pub fn contains_point(&self, p: [f64; 2]) -> bool {
        if self.edges().any(|(a, b)| on_segment(p, a, b)) {
            return true;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a[1] > p[1]) != (b[1] > p[1]) {
                let x_cross = a[0] + (p[1] - a[1]) * (b[0] - a[0]) / (b[1] - a[1]);
                if p[0] < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Every vertex of `self` lies inside or on `other`.
    pub fn is_within(&self, other: &Polygon) -> bool {
        self.vertices.iter().all(|&v| other.contains_point(v))
    }
}

fn on_segment(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> bool {
    const EPS: f64 = 1e-9;
    let cross = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
    if cross.abs() > EPS {
        return false;
    }
    p[0] >= a[0].min(b[0]) - EPS
        && p[0] <= a[0].max(b[0]) + EPS
        && p[1] >= a[1].min(b[1]) - EPS
        && p[1] <= a[1].max(b[1]) + EPS
}

/// Split off the largest-area polygon; the rest keep their order.
pub fn take_largest(mut polygons: Vec<Polygon>) -> Option<(Polygon, Vec<Polygon>)> {
    let index = polygons
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.area().total_cmp(&b.area()))
        .map(|(i, _)| i)?;
    let largest = polygons.remove(index);
    Some((largest, polygons))
}

/// Serde adapter: `Option<Polygon>` as a flat coordinate list, `[]` when absent.
pub(crate) mod opt_flat {
    use super::Polygon;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Polygon>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let flat = value.as_ref().map(Polygon::to_flat).unwrap_or_default();
        serializer.collect_seq(flat)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Polygon>, D::Error> {
        let flat = Vec::<f64>::deserialize(deserializer)?;
        Ok(Polygon::from_flat(&flat))
    }
}

/// Serde adapter: `Vec<Polygon>` as a list of flat coordinate lists.
pub(crate) mod flat_list {
    use super::Polygon;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[Polygon], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(value.iter().map(Polygon::to_flat))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Polygon>, D::Error> {
        let flat = Vec::<Vec<f64>>::deserialize(deserializer)?;
        Ok(flat.iter().filter_map(|p| Polygon::from_flat(p)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square(x0: f64, y0: f64, side: f64) -> Polygon {
        Polygon::new(vec![
            [x0, y0],
            [x0 + side, y0],
            [x0 + side, y0 + side],
            [x0, y0 + side],
        ])
        .unwrap()
    }

    #[test]
    fn rejects_degenerate_rings() {
        assert!(Polygon::new(vec![[0.0, 0.0], [1.0, 1.0]]).is_none());
        assert!(Polygon::from_flat(&[]).is_none());
    }

    #[test]
    fn shoelace_area_ignores_orientation() {
        let sq = square(0.0, 0.0, 4.0);
        assert_abs_diff_eq!(sq.area(), 16.0, epsilon = 1e-12);
        let mut reversed = sq.vertices().to_vec();
        reversed.reverse();
        assert_abs_diff_eq!(Polygon::new(reversed).unwrap().area(), 16.0, epsilon = 1e-12);
    }

    #[test]
    fn containment_counts_boundary() {
        let sq = square(0.0, 0.0, 4.0);
        assert!(sq.contains_point([2.0, 2.0]));
        assert!(sq.contains_point([0.0, 1.0]));
        assert!(!sq.contains_point([5.0, 1.0]));
        assert!(square(1.0, 1.0, 2.0).is_within(&sq));
        assert!(!square(3.0, 3.0, 2.0).is_within(&sq));
    }

    #[test]
    fn take_largest_splits_off_biggest() {
        let (largest, rest) =
            take_largest(vec![square(0.0, 0.0, 1.0), square(0.0, 0.0, 5.0), square(0.0, 0.0, 2.0)])
                .unwrap();
        assert_abs_diff_eq!(largest.area(), 25.0, epsilon = 1e-12);
        assert_eq!(rest.len(), 2);
        assert!(take_largest(Vec::new()).is_none());
    }
}
