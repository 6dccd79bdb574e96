//! Per-image measurement primitives (spatial filtering, assembly, axes)
//! independent of batch orchestration.
//!
//! The `pipeline` module owns the call order across images. This module
//! provides the per-image building blocks and shared configuration types.

pub(crate) mod assemble;
pub(crate) mod dedup;
pub(crate) mod pore_axis;
pub(crate) mod spatial_filter;

pub(crate) mod config;

pub use assemble::{assemble_records, assemble_stoma};
pub use config::{AssembleConfig, MeasureConfig, PopulationFilterConfig, SpatialFilterConfig};
pub use dedup::resolve_overlaps;
pub use spatial_filter::{
    filter_invalid_detections, RemovalReason, RemovedDetection, SpatialFilterOutput,
};
