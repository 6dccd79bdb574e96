//! Pixel to micron conversion.

use crate::geometry::ImageSize;

/// Factors at or below this are treated as "no calibration".
pub const MIN_CALIBRATION: f64 = 1e-4;

/// Which kind of quantity a value measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Length,
    Area,
}

/// Camera calibration in pixels per micron.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Calibration {
    px_per_um: f64,
}

impl Calibration {
    pub fn new(px_per_um: f64) -> Self {
        Self { px_per_um }
    }

    pub fn uncalibrated() -> Self {
        Self::default()
    }

    pub fn px_per_um(&self) -> f64 {
        self.px_per_um
    }

    pub fn is_calibrated(&self) -> bool {
        self.px_per_um > MIN_CALIBRATION
    }

    /// Pixels to microns; unchanged when uncalibrated.
    pub fn length(&self, px: f64) -> f64 {
        if self.is_calibrated() {
            px / self.px_per_um
        } else {
            px
        }
    }

    /// Square pixels to square microns; unchanged when uncalibrated.
    pub fn area(&self, px2: f64) -> f64 {
        if self.is_calibrated() {
            px2 / (self.px_per_um * self.px_per_um)
        } else {
            px2
        }
    }

    pub fn convert(&self, value: f64, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Length => self.length(value),
            MetricKind::Area => self.area(value),
        }
    }

    pub fn unit(&self, kind: MetricKind) -> &'static str {
        match (kind, self.is_calibrated()) {
            (MetricKind::Length, true) => "\u{3bc}m",
            (MetricKind::Length, false) => "px",
            (MetricKind::Area, true) => "\u{3bc}m\u{b2}",
            (MetricKind::Area, false) => "px\u{b2}",
        }
    }

    /// Unit of image areas and densities: mm² when calibrated.
    pub fn image_area_unit(&self) -> &'static str {
        if self.is_calibrated() {
            "mm\u{b2}"
        } else {
            "px\u{b2}"
        }
    }

    /// Image area in mm² (px² when uncalibrated).
    pub fn image_area(&self, size: ImageSize) -> f64 {
        let mut height = self.length(size.height as f64);
        let mut width = self.length(size.width as f64);
        if self.is_calibrated() {
            height /= 1000.0;
            width /= 1000.0;
        }
        height * width
    }
}

/// Value with two decimals and the unit implied by `calibration`.
pub fn format_summary_metric(value: f64, kind: MetricKind, calibration: &Calibration) -> String {
    format!("{:.2} {}", value, calibration.unit(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_calibration_keeps_pixels() {
        let cal = Calibration::new(0.0);
        assert!(!cal.is_calibrated());
        assert_eq!(cal.length(42.0), 42.0);
        assert_eq!(format_summary_metric(12.346, MetricKind::Length, &cal), "12.35 px");
        assert_eq!(format_summary_metric(7.0, MetricKind::Area, &cal), "7.00 px\u{b2}");
    }

    #[test]
    fn calibrated_units_are_microns() {
        let cal = Calibration::new(4.0);
        assert_relative_eq!(cal.length(10.0), 2.5);
        assert_relative_eq!(cal.area(32.0), 2.0);
        assert_eq!(format_summary_metric(2.5, MetricKind::Length, &cal), "2.50 \u{3bc}m");
    }

    #[test]
    fn image_area_is_in_square_millimetres() {
        let cal = Calibration::new(2.0);
        // 2000 x 4000 px -> 1 x 2 mm.
        assert_relative_eq!(cal.image_area(ImageSize::new(2000, 4000)), 2.0);
        assert_relative_eq!(
            Calibration::uncalibrated().image_area(ImageSize::new(10, 20)),
            200.0
        );
    }
}
