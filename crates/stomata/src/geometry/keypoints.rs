//! Keypoint pairs describing measurement axes.

/// Wire form of an absent keypoint pair.
pub const MISSING_PAIR: [f64; 6] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0];

/// Two endpoints of a measured segment (pore AB / CD, guard-cell spans).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeypointPair {
    pub a: [f64; 2],
    pub b: [f64; 2],
}

impl KeypointPair {
    pub fn new(a: [f64; 2], b: [f64; 2]) -> Self {
        Self { a, b }
    }

    /// Euclidean distance between the endpoints.
    pub fn length(&self) -> f64 {
        let dx = self.b[0] - self.a[0];
        let dy = self.b[1] - self.a[1];
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self) -> [f64; 2] {
        [
            0.5 * (self.a[0] + self.b[0]),
            0.5 * (self.a[1] + self.b[1]),
        ]
    }

    /// `[x1, y1, 1, x2, y2, 1]`.
    pub fn to_flat(&self) -> [f64; 6] {
        [self.a[0], self.a[1], 1.0, self.b[0], self.b[1], 1.0]
    }

    /// Parse the flat form; the missing-pair sentinel and short slices yield `None`.
    pub fn from_flat(values: &[f64]) -> Option<Self> {
        if values.len() < 6 || values[..6] == MISSING_PAIR {
            return None;
        }
        Some(Self::new([values[0], values[1]], [values[3], values[4]]))
    }
}

pub fn l2_dist(pair: &KeypointPair) -> f64 {
    pair.length()
}

/// Length of an optional axis; absent axes measure 0.
pub fn axis_length(pair: Option<&KeypointPair>) -> f64 {
    pair.map_or(0.0, KeypointPair::length)
}

pub fn midpoint(pair: &KeypointPair) -> [f64; 2] {
    pair.midpoint()
}

/// Serde adapter: `Option<KeypointPair>` as a flat six-value array.
pub(crate) mod opt_pair {
    use super::{KeypointPair, MISSING_PAIR};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<KeypointPair>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let flat = value.as_ref().map_or(MISSING_PAIR, KeypointPair::to_flat);
        serializer.collect_seq(flat)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<KeypointPair>, D::Error> {
        let flat = Vec::<f64>::deserialize(deserializer)?;
        Ok(KeypointPair::from_flat(&flat))
    }
}

/// Serde adapter: two joined segments as `[[..6..], [..6..]]`, absent as the
/// missing-pair sentinel repeated.
pub(crate) mod opt_segments {
    use super::{KeypointPair, MISSING_PAIR};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<[KeypointPair; 2]>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let flat = match value {
            Some([first, second]) => [first.to_flat(), second.to_flat()],
            None => [MISSING_PAIR, MISSING_PAIR],
        };
        serializer.collect_seq(flat)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<[KeypointPair; 2]>, D::Error> {
        let flat = Vec::<Vec<f64>>::deserialize(deserializer)?;
        let mut pairs = flat.iter().map(|v| KeypointPair::from_flat(v));
        match (pairs.next().flatten(), pairs.next().flatten()) {
            (Some(first), Some(second)) => Ok(Some([first, second])),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn length_and_midpoint() {
        let pair = KeypointPair::new([0.0, 0.0], [3.0, 4.0]);
        assert_abs_diff_eq!(l2_dist(&pair), 5.0, epsilon = 1e-12);
        assert_eq!(midpoint(&pair), [1.5, 2.0]);
        assert_eq!(axis_length(None), 0.0);
    }

    #[test]
    fn sentinel_parses_as_missing() {
        assert_eq!(KeypointPair::from_flat(&MISSING_PAIR), None);
        assert_eq!(KeypointPair::from_flat(&[1.0, 2.0]), None);
        let pair = KeypointPair::from_flat(&[1.0, 2.0, 1.0, 3.0, 4.0, 1.0]).unwrap();
        assert_eq!(pair, KeypointPair::new([1.0, 2.0], [3.0, 4.0]));
    }
}
