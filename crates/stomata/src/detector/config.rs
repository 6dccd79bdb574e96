use std::path::Path;

use crate::error::{Result, StomataError};

/// Thresholds for the per-image spatial filter.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpatialFilterConfig {
    /// Two complexes overlapping with IoU above this compete; the less
    /// confident one is removed.
    pub iou_threshold: f64,
    /// A box side closer than this to the image border counts as near-edge.
    pub edge_distance_px: f64,
    /// Near-edge complexes smaller than this fraction of the mean box area
    /// are removed.
    pub edge_size_fraction: f64,
    /// Complexes smaller than this fraction of the mean box area are removed.
    pub min_size_fraction: f64,
    /// Minimum fraction of a subsidiary cell box covered by a complex box.
    pub subsidiary_overlap: f64,
}

impl Default for SpatialFilterConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.2,
            edge_distance_px: 20.0,
            edge_size_fraction: 0.85,
            min_size_fraction: 0.3,
            subsidiary_overlap: 0.5,
        }
    }
}

/// Controls for turning one complex into a measurement record.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AssembleConfig {
    /// Model axes shorter than this (pixels) are replaced by the polygon axis.
    pub min_pore_length_px: f64,
    /// Records with pore width/length above this are discarded.
    pub max_width_over_length: f64,
    /// Upper bound on axis attempts per pore.
    pub max_axis_attempts: usize,
    /// Minimum fraction of a subsidiary cell box covered by the complex box.
    pub subsidiary_overlap: f64,
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            min_pore_length_px: 5.0,
            max_width_over_length: 0.85,
            max_axis_attempts: 3,
            subsidiary_overlap: 0.5,
        }
    }
}

/// Batch-level IQR outlier rejection.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PopulationFilterConfig {
    pub enable: bool,
    /// Bounds are `median ± iqr_multiplier * IQR`.
    pub iqr_multiplier: f64,
    pub edge_distance_px: f64,
    /// Near-edge boxes are only rejected below this fraction of the mean
    /// size of non-edge boxes in the same image.
    pub edge_size_fraction: f64,
}

impl Default for PopulationFilterConfig {
    fn default() -> Self {
        Self {
            enable: true,
            iqr_multiplier: 2.0,
            edge_distance_px: 20.0,
            edge_size_fraction: 0.5,
        }
    }
}

/// Top-level measurement configuration.
///
/// Every section defaults independently, so a JSON file only needs the
/// fields it overrides.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    pub spatial_filter: SpatialFilterConfig,
    pub assemble: AssembleConfig,
    pub population_filter: PopulationFilterConfig,
}

impl MeasureConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| StomataError::io(path, e))?;
        serde_json::from_str(&data).map_err(|e| StomataError::json(path, e))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
