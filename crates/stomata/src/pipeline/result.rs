use crate::detector::RemovedDetection;
use crate::record::ImageRecord;

use super::population_filter::PopulationFilterStats;

/// Measurement of a single image before population filtering.
#[derive(Debug, Clone)]
pub struct ImageMeasurement {
    pub record: ImageRecord,
    /// Detections removed by the spatial filter, with their masks.
    pub removed: Vec<RemovedDetection>,
}

/// An input that could not be measured; the batch continued without it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchFailure {
    pub source: String,
    pub error: String,
}

/// Result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub records: Vec<ImageRecord>,
    pub failures: Vec<BatchFailure>,
    /// Set when the run stopped early; population filtering is skipped then.
    pub cancelled: bool,
    pub population: PopulationFilterStats,
}

impl BatchOutput {
    pub fn stoma_count(&self) -> usize {
        self.records.iter().map(ImageRecord::stoma_count).sum()
    }
}
