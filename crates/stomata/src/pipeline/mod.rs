//! Batch measurement pipeline.
//!
//! This module is the "glue" layer that wires the per-image stages together
//! and owns the batch-level state:
//! spatial filter -> assembly (per image) -> population filter (per batch).
//!
//! Per-image primitives live in `crate::detector`. The pipeline layer
//! focuses on call order, the batch accumulator and failure isolation.
//!
//! Entry points:
//! - `measure_image`: one image's detections into an `ImageRecord`
//! - `detect_and_measure`: decode an image, run a `DetectionEngine`, measure
//! - `run_batch`: many images with cancellation, progress and outlier filtering

mod batch;
mod context;
mod population_filter;
mod result;
mod run;

pub use batch::{run_batch, BatchProgress, CancelToken};
pub use context::BatchContext;
pub use population_filter::{
    filter_population_outliers, filter_record, Bounds, PopulationBounds, PopulationFilterStats,
};
pub use result::{BatchFailure, BatchOutput, ImageMeasurement};
pub use run::{detect_and_measure, detect_image, measure_image};
