//! Stomatal density, g_max and sample summaries.

use std::fmt;

use crate::detector::RemovalReason;
use crate::record::{ImageRecord, StomaRecord};
use crate::stats::mean;

use super::calibration::{format_summary_metric, Calibration, MetricKind};
use super::species::{Morphology, PlantSpecies};

/// Diffusivity of water vapour in air (m²/s).
pub const DIFFUSIVITY_OF_WATER_IN_AIR: f64 = 0.0282;
/// Molar volume of air (m³/mol).
pub const MOLAR_VOLUME_OF_AIR: f64 = 0.02241;
/// Densities over image areas at or below this are unavailable.
pub const MIN_IMAGE_AREA: f64 = 0.001;

/// Post-hoc filters applied before summaries and exports.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct UserFilter {
    pub min_confidence: f32,
    /// Shorter pores (pixels) are treated as immature stomata.
    pub min_pore_length_px: f64,
}

impl UserFilter {
    pub fn accepts(&self, stoma: &StomaRecord) -> bool {
        stoma.confidence >= self.min_confidence && stoma.pore_length >= self.min_pore_length_px
    }

    pub fn apply<'a>(&self, stomata: &'a [StomaRecord]) -> Vec<&'a StomaRecord> {
        stomata.iter().filter(|s| self.accepts(s)).collect()
    }
}

/// Everything the aggregation step needs besides the records.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub calibration: Calibration,
    pub morphology: Morphology,
    pub user_filter: UserFilter,
    /// Fixed field-of-view area (mm²) used instead of the image size.
    pub image_area_mm2: Option<f64>,
    /// Count near-edge complexes removed by the spatial filter in densities.
    pub count_edge_rejections: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            calibration: Calibration::uncalibrated(),
            morphology: Morphology::Dicot,
            user_filter: UserFilter::default(),
            image_area_mm2: None,
            count_edge_rejections: false,
        }
    }
}

impl AnalysisOptions {
    /// Reference calibration and morphology of a species.
    pub fn for_species(species: PlantSpecies) -> Self {
        Self {
            calibration: species.calibration(),
            morphology: species.morphology(),
            ..Self::default()
        }
    }

    pub fn image_area(&self, record: &ImageRecord) -> f64 {
        self.image_area_mm2
            .unwrap_or_else(|| self.calibration.image_area(record.image_size))
    }

    /// Stomata counted towards density: filtered valid, all invalid, and
    /// optionally edge rejections.
    pub fn counted_stomata(&self, record: &ImageRecord) -> usize {
        let valid = self.user_filter.apply(&record.detections).len();
        let edge = if self.count_edge_rejections {
            record.rejected_complexes(RemovalReason::NearEdge)
        } else {
            0
        };
        valid + record.invalid_detections.len() + edge
    }
}

/// Stomata per unit area; `None` when the area is too small to be meaningful.
pub fn stomatal_density(n_stomata: usize, image_area: f64) -> Option<f64> {
    (image_area > MIN_IMAGE_AREA).then(|| n_stomata as f64 / image_area)
}

/// Maximum open pore area from physical pore and groove lengths.
///
/// Monocot pores open as an ellipse spanning the groove; dicot pores as a
/// circle of the pore length.
pub fn max_pore_area(morphology: Morphology, pore_length: f64, groove_length: f64) -> f64 {
    use std::f64::consts::PI;
    match morphology {
        Morphology::Monocot => PI * (groove_length / 2.0) * (pore_length / 2.0),
        Morphology::Dicot => PI * (pore_length / 2.0).powi(2),
    }
}

/// Anatomical maximum stomatal conductance (mol m⁻² s⁻¹).
pub fn g_max(density: f64, a_max: f64, pore_depth: f64) -> f64 {
    if density <= 0.0 || a_max <= 0.0 {
        return 0.0;
    }
    let diffusion = DIFFUSIVITY_OF_WATER_IN_AIR / MOLAR_VOLUME_OF_AIR;
    let end_correction = (a_max * std::f64::consts::PI / 4.0).sqrt();
    diffusion * (a_max * density) / (pore_depth + end_correction) / 1000.0
}

/// Mean physical dimensions over a set of stomata.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct MeanDimensions {
    pub pore_length: f64,
    pub pore_width: f64,
    pub pore_area: f64,
    pub guard_cell_width: f64,
    pub groove_length: f64,
}

impl MeanDimensions {
    pub fn from_stomata(stomata: &[&StomaRecord], calibration: &Calibration) -> Self {
        let avg = |f: fn(&StomaRecord) -> f64, kind: MetricKind| {
            let values: Vec<f64> = stomata.iter().map(|s| f(s)).collect();
            calibration.convert(mean(&values).unwrap_or(0.0), kind)
        };
        Self {
            pore_length: avg(|s| s.pore_length, MetricKind::Length),
            pore_width: avg(|s| s.pore_width, MetricKind::Length),
            pore_area: avg(|s| s.pore_area, MetricKind::Area),
            guard_cell_width: avg(|s| s.guard_cell_width, MetricKind::Length),
            groove_length: avg(|s| s.groove_length, MetricKind::Length),
        }
    }

    /// `g_max` at `density` using these mean dimensions.
    pub fn g_max(&self, morphology: Morphology, density: f64) -> f64 {
        let a_max = max_pore_area(morphology, self.pore_length, self.groove_length);
        g_max(density, a_max, self.guard_cell_width / 2.0)
    }
}

/// Density row for one image.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ImageSummary {
    pub image_name: String,
    pub n_stomata: usize,
    pub density: Option<f64>,
    pub g_max: Option<f64>,
}

impl ImageSummary {
    pub fn from_record(record: &ImageRecord, options: &AnalysisOptions) -> Self {
        let n_stomata = options.counted_stomata(record);
        let density = stomatal_density(n_stomata, options.image_area(record));
        let accepted = options.user_filter.apply(&record.detections);
        let dims = MeanDimensions::from_stomata(&accepted, &options.calibration);
        Self {
            image_name: record.image_name.clone(),
            n_stomata,
            density,
            g_max: density.map(|d| dims.g_max(options.morphology, d)),
        }
    }
}

/// Sample-level statistics over every image of a batch.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SampleSummary {
    pub n_stomata: usize,
    pub means: MeanDimensions,
    /// Pooled count over pooled image area.
    pub density: Option<f64>,
    pub g_max: Option<f64>,
    pub calibration: Calibration,
}

impl SampleSummary {
    pub fn from_records(records: &[ImageRecord], options: &AnalysisOptions) -> Self {
        let accepted: Vec<&StomaRecord> = records
            .iter()
            .flat_map(|r| options.user_filter.apply(&r.detections))
            .collect();
        let n_stomata: usize = records.iter().map(|r| options.counted_stomata(r)).sum();
        let area: f64 = records.iter().map(|r| options.image_area(r)).sum();
        let density = stomatal_density(n_stomata, area);
        let means = MeanDimensions::from_stomata(&accepted, &options.calibration);
        Self {
            n_stomata,
            means,
            density,
            g_max: density.map(|d| means.g_max(options.morphology, d)),
            calibration: options.calibration,
        }
    }
}

impl fmt::Display for SampleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cal = &self.calibration;
        writeln!(f, "Stomata Count: {}", self.n_stomata)?;
        writeln!(
            f,
            "Average Pore Length: {}",
            format_summary_metric(self.means.pore_length, MetricKind::Length, cal)
        )?;
        writeln!(
            f,
            "Average Pore Width: {}",
            format_summary_metric(self.means.pore_width, MetricKind::Length, cal)
        )?;
        writeln!(
            f,
            "Average Pore Area: {}",
            format_summary_metric(self.means.pore_area, MetricKind::Area, cal)
        )?;
        match self.density {
            Some(d) if d > 0.0 => writeln!(
                f,
                "Stomatal Density: {:.2} stomata/{}",
                d,
                cal.image_area_unit()
            )?,
            _ => writeln!(f, "Stomatal Density: N/A")?,
        }
        match self.g_max {
            Some(g) if g > 0.0 => write!(f, "Estimated g max: {:.2} mol/m\u{b2}s", g),
            _ => write!(f, "Estimated g max: N/A"),
        }
    }
}
