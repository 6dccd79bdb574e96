//! Unit conversion and biological aggregates (density, g_max).

mod calibration;
mod species;
mod summary;

pub use calibration::{format_summary_metric, Calibration, MetricKind, MIN_CALIBRATION};
pub use species::{Morphology, PlantSpecies};
pub use summary::{
    g_max, max_pore_area, stomatal_density, AnalysisOptions, ImageSummary, MeanDimensions,
    SampleSummary, UserFilter, DIFFUSIVITY_OF_WATER_IN_AIR, MIN_IMAGE_AREA, MOLAR_VOLUME_OF_AIR,
};
