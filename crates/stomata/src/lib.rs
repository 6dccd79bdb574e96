//! stomata: measurement pipeline for plant stomata from instance
//! segmentation output.
//!
//! An external model detects stomatal complexes, pores and subsidiary cells
//! in microscope images. This crate turns its raw per-instance output into
//! biological measurements. The stages are:
//!
//! 1. **Spatial filter** – overlap duplicates, small near-edge complexes,
//!    very small complexes, orphaned pores and subsidiary cells.
//! 2. **Assembly** – guard-cell and pore polygons from masks, pore length /
//!    width axes, guard-cell spans, one [`StomaRecord`] per complex.
//! 3. **Population filter** – batch-level IQR bounds on pore length and box
//!    size.
//! 4. **Aggregation** – unit conversion, stomatal density and `g_max`.
//!
//! # Public API
//! - [`StomataAnalyzer`] as the primary entry point
//! - [`MeasureConfig`] for threshold tuning
//! - [`DetectionEngine`] for plugging in a segmentation backend
//! - record, summary and export types

mod api;
pub mod biology;
mod detection;
pub mod detector;
mod error;
pub mod geometry;
pub mod io;
mod mask;
pub mod pipeline;
mod record;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::StomataAnalyzer;
pub use biology::{
    format_summary_metric, AnalysisOptions, Calibration, ImageSummary, MetricKind, Morphology,
    PlantSpecies, SampleSummary, UserFilter,
};
pub use detection::{
    is_stomata_complex, is_stomatal_pore, is_subsidiary_cell, DetectionEngine, ImageDetections,
    Keypoint, RawDetection, StructureKind,
};
pub use detector::{
    AssembleConfig, MeasureConfig, PopulationFilterConfig, RemovalReason, SpatialFilterConfig,
};
pub use error::{Result, StomataError};
pub use geometry::{BBox, ImageSize, KeypointPair, Polygon};
pub use mask::{CocoRle, Mask};
pub use pipeline::{BatchContext, BatchOutput, BatchProgress, CancelToken, ImageMeasurement};
pub use record::{GuardCellPolygon, ImageRecord, RejectedDetection, StomaClass, StomaRecord};
