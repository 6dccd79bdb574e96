//! High-level measurement API.
//!
//! [`StomataAnalyzer`] is the primary entry point. It wraps a
//! [`MeasureConfig`] and provides convenience methods for measuring one
//! image, a folder of detection dumps, or images run through a
//! [`DetectionEngine`].

use std::path::{Path, PathBuf};

use crate::detection::{DetectionEngine, ImageDetections};
use crate::detector::MeasureConfig;
use crate::error::Result;
use crate::io::detection_dump_inputs;
use crate::pipeline::{
    self, BatchContext, BatchOutput, BatchProgress, CancelToken, ImageMeasurement,
};

/// Primary measurement interface.
///
/// Encapsulates the measurement configuration. Create once, measure many
/// batches; each batch gets a fresh [`BatchContext`].
///
/// # Examples
///
/// ```no_run
/// use stomata::{AnalysisOptions, SampleSummary, StomataAnalyzer};
/// use std::path::Path;
///
/// let analyzer = StomataAnalyzer::new();
/// let batch = analyzer.measure_dump_dir(Path::new("dumps"), None, |_| {}).unwrap();
/// let summary = SampleSummary::from_records(&batch.records, &AnalysisOptions::default());
/// println!("{summary}");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StomataAnalyzer {
    config: MeasureConfig,
}

impl StomataAnalyzer {
    /// Create an analyzer with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with full config control.
    pub fn with_config(config: MeasureConfig) -> Self {
        Self { config }
    }

    /// Load a (possibly partial) JSON config and create an analyzer.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self::with_config(MeasureConfig::from_json_file(path)?))
    }

    /// Access the current configuration.
    pub fn config(&self) -> &MeasureConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut MeasureConfig {
        &mut self.config
    }

    /// Measure one image's detections, accumulating into `ctx`.
    ///
    /// Population filtering needs the whole batch and is not applied here.
    pub fn measure(&self, input: ImageDetections, ctx: &mut BatchContext) -> ImageMeasurement {
        pipeline::measure_image(input, &self.config, ctx)
    }

    /// Run a batch over arbitrary inputs.
    pub fn measure_batch<I>(
        &self,
        inputs: I,
        cancel: Option<&CancelToken>,
        on_progress: impl FnMut(&BatchProgress<'_>),
    ) -> BatchOutput
    where
        I: IntoIterator<Item = (String, Result<ImageDetections>)>,
    {
        let mut ctx = BatchContext::new();
        pipeline::run_batch(inputs, &self.config, &mut ctx, cancel, on_progress)
    }

    /// Run a batch over every detection dump in `dir`.
    pub fn measure_dump_dir(
        &self,
        dir: &Path,
        cancel: Option<&CancelToken>,
        on_progress: impl FnMut(&BatchProgress<'_>),
    ) -> Result<BatchOutput> {
        let inputs = detection_dump_inputs(dir)?;
        Ok(self.measure_batch(inputs, cancel, on_progress))
    }

    /// Run `engine` over image files and measure the batch.
    pub fn detect_and_measure_images<E: DetectionEngine + ?Sized>(
        &self,
        engine: &mut E,
        images: &[PathBuf],
        cancel: Option<&CancelToken>,
        on_progress: impl FnMut(&BatchProgress<'_>),
    ) -> BatchOutput {
        let inputs = images
            .iter()
            .map(|path| (path.display().to_string(), pipeline::detect_image(engine, path)));
        self.measure_batch(inputs, cancel, on_progress)
    }
}
