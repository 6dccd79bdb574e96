//! Pore length / width axes with a bounded fallback from model keypoints
//! to the polygon's principal axis.

use crate::geometry::{
    axis_length, extract_principal_axis_keypoints, find_perpendicular_axis, KeypointPair, Polygon,
};

use super::config::AssembleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisSource {
    Model,
    Polygon,
}

/// Measured pore axes; `length >= width` after [`PoreAxes::normalized`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PoreAxes {
    pub ab: Option<KeypointPair>,
    pub cd: Option<KeypointPair>,
    pub length: f64,
    pub width: f64,
}

impl PoreAxes {
    fn new(ab: Option<KeypointPair>, cd: Option<KeypointPair>) -> Self {
        Self {
            ab,
            cd,
            length: axis_length(ab.as_ref()),
            width: axis_length(cd.as_ref()),
        }
    }

    pub fn width_over_length(&self) -> f64 {
        if self.length > 0.0 {
            self.width / self.length
        } else {
            0.0
        }
    }

    /// Swap the axes when the width axis is the longer one.
    fn normalized(self) -> Self {
        if self.width > self.length {
            Self {
                ab: self.cd,
                cd: self.ab,
                length: self.width,
                width: self.length,
            }
        } else {
            self
        }
    }
}

/// Closed pores keep the model axis and have no width.
pub(crate) fn closed_pore_axes(model_axis: Option<KeypointPair>) -> PoreAxes {
    PoreAxes::new(model_axis, None)
}

/// Axes of an open pore.
///
/// Starts from the model keypoints unless they are shorter than
/// `min_pore_length_px` and a polygon is available. A missing width axis or
/// an implausibly round pore triggers a retry with the next axis source,
/// up to `max_axis_attempts`.
pub(crate) fn open_pore_axes(
    model_axis: Option<KeypointPair>,
    polygon: Option<&Polygon>,
    config: &AssembleConfig,
) -> PoreAxes {
    let polygon_axis = polygon.map(extract_principal_axis_keypoints);

    let mut source = AxisSource::Model;
    if axis_length(model_axis.as_ref()) < config.min_pore_length_px && polygon_axis.is_some() {
        source = AxisSource::Polygon;
    }

    let mut attempt = 0;
    loop {
        attempt += 1;
        let ab = match source {
            AxisSource::Model => model_axis,
            AxisSource::Polygon => polygon_axis,
        };
        let cd = match (polygon, ab.as_ref()) {
            (Some(poly), Some(ab)) => find_perpendicular_axis(poly, ab),
            _ => None,
        };
        let axes = PoreAxes::new(ab, cd);

        let plausible =
            axes.cd.is_some() && axes.width_over_length() <= config.max_width_over_length;
        let next = match source {
            AxisSource::Model if polygon_axis.is_some() => Some(AxisSource::Polygon),
            _ => None,
        };
        match next {
            Some(next) if !plausible && attempt < config.max_axis_attempts => {
                tracing::debug!(
                    "Pore axis attempt {} implausible, retrying with polygon axis",
                    attempt
                );
                source = next;
            }
            _ => return axes.normalized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rect(x1: f64, y1: f64, x2: f64, y2: f64) -> Polygon {
        Polygon::new(vec![[x1, y1], [x2, y1], [x2, y2], [x1, y2]]).unwrap()
    }

    #[test]
    fn closed_pore_has_no_width() {
        let axes = closed_pore_axes(Some(KeypointPair::new([0.0, 0.0], [10.0, 0.0])));
        assert!(axes.cd.is_none());
        assert_eq!(axes.width, 0.0);
        assert_abs_diff_eq!(axes.length, 10.0);
    }

    #[test]
    fn good_model_axis_is_kept() {
        let poly = rect(10.0, 18.0, 50.0, 22.0);
        let model = KeypointPair::new([12.0, 20.0], [48.0, 20.0]);
        let axes = open_pore_axes(Some(model), Some(&poly), &AssembleConfig::default());
        assert_eq!(axes.ab, Some(model));
        assert_abs_diff_eq!(axes.width, 4.0, epsilon = 1e-9);
        assert!(axes.length >= axes.width);
    }

    #[test]
    fn short_model_axis_falls_back_to_polygon() {
        let poly = rect(10.0, 18.0, 50.0, 22.0);
        let model = KeypointPair::new([30.0, 20.0], [32.0, 20.0]);
        let axes = open_pore_axes(Some(model), Some(&poly), &AssembleConfig::default());
        assert_abs_diff_eq!(axes.length, 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(axes.width, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn model_axis_across_the_pore_is_retried() {
        // Model axis runs across the narrow side: CD comes out long, ratio > 0.85.
        let poly = rect(10.0, 18.0, 50.0, 22.0);
        let model = KeypointPair::new([30.0, 12.0], [30.0, 28.0]);
        let axes = open_pore_axes(Some(model), Some(&poly), &AssembleConfig::default());
        assert_abs_diff_eq!(axes.length, 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(axes.width, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn model_axis_missing_the_pore_is_retried() {
        // Perpendicular through x=120 never crosses the pore outline.
        let poly = rect(10.0, 18.0, 50.0, 22.0);
        let model = KeypointPair::new([100.0, 100.0], [140.0, 100.0]);
        let axes = open_pore_axes(Some(model), Some(&poly), &AssembleConfig::default());
        assert_eq!(axes.ab, Some(KeypointPair::new([10.0, 20.0], [50.0, 20.0])));
        assert!(axes.cd.is_some());
        assert_abs_diff_eq!(axes.length, 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(axes.width, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn longer_width_axis_is_swapped_into_length() {
        let poly = rect(10.0, 18.0, 50.0, 22.0);
        let model = KeypointPair::new([30.0, 12.0], [30.0, 28.0]);
        let config = AssembleConfig {
            max_axis_attempts: 1,
            ..AssembleConfig::default()
        };
        let axes = open_pore_axes(Some(model), Some(&poly), &config);
        assert_eq!(axes.cd, Some(model));
        let ab = axes.ab.unwrap();
        assert_abs_diff_eq!(ab.a[1], 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ab.b[1], 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(axes.length, 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(axes.width, 16.0, epsilon = 1e-9);
        assert!(axes.length >= axes.width);
    }

    #[test]
    fn missing_polygon_leaves_width_zero() {
        let model = KeypointPair::new([0.0, 0.0], [10.0, 0.0]);
        let axes = open_pore_axes(Some(model), None, &AssembleConfig::default());
        assert!(axes.cd.is_none());
        assert_eq!(axes.width, 0.0);
    }
}
