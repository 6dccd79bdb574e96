//! Sequential batch runs with cancellation and progress reporting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::detection::ImageDetections;
use crate::detector::MeasureConfig;
use crate::error::Result;

use super::context::BatchContext;
use super::population_filter::filter_population_outliers;
use super::result::{BatchFailure, BatchOutput};
use super::run::measure_image;

/// Shared flag checked between images.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress after each processed input.
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress<'a> {
    pub processed: usize,
    pub total: Option<usize>,
    pub source: &'a str,
}

/// Measure a batch of images, then run the population filter over it.
///
/// `inputs` yields `(source name, detections)`; it is pulled lazily so a
/// cancelled run never loads the next image. Failed inputs are logged and
/// skipped. `ctx` is reset before the first image.
pub fn run_batch<I>(
    inputs: I,
    config: &MeasureConfig,
    ctx: &mut BatchContext,
    cancel: Option<&CancelToken>,
    mut on_progress: impl FnMut(&BatchProgress<'_>),
) -> BatchOutput
where
    I: IntoIterator<Item = (String, Result<ImageDetections>)>,
{
    ctx.reset();
    let mut inputs = inputs.into_iter();
    let total = inputs.size_hint().1;
    let mut out = BatchOutput::default();
    let mut processed = 0;

    loop {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            tracing::warn!("Batch cancelled after {} inputs", processed);
            out.cancelled = true;
            break;
        }
        let Some((source, input)) = inputs.next() else {
            break;
        };
        match input {
            Ok(detections) => out.records.push(measure_image(detections, config, ctx).record),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", source, e);
                out.failures.push(BatchFailure {
                    source: source.clone(),
                    error: e.to_string(),
                });
            }
        }
        processed += 1;
        on_progress(&BatchProgress {
            processed,
            total,
            source: &source,
        });
    }

    if !out.cancelled {
        out.population = filter_population_outliers(&mut out.records, ctx, &config.population_filter);
    }
    tracing::info!(
        "Batch finished: {} images measured, {} failed, {} stomata",
        out.records.len(),
        out.failures.len(),
        out.stoma_count()
    );
    out
}
