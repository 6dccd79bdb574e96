//! Per-image orchestration: spatial filter -> assembly.

use std::path::Path;

use crate::detection::{DetectionEngine, ImageDetections};
use crate::detector::{assemble_records, filter_invalid_detections, MeasureConfig};
use crate::error::{Result, StomataError};
use crate::geometry::ImageSize;
use crate::record::{ImageRecord, RejectedDetection};

use super::context::BatchContext;
use super::result::ImageMeasurement;

/// Filter and assemble one image's detections.
pub fn measure_image(
    input: ImageDetections,
    config: &MeasureConfig,
    ctx: &mut BatchContext,
) -> ImageMeasurement {
    let ImageDetections {
        image_name,
        image_size,
        detections,
    } = input;
    let n_raw = detections.len();

    let filtered = filter_invalid_detections(detections, image_size, &config.spatial_filter);
    let stomata = assemble_records(&filtered, &image_name, &config.assemble, ctx);

    tracing::info!(
        "{}: {} raw detections, {} removed by spatial filter, {} stomata measured",
        image_name,
        n_raw,
        filtered.removed.len(),
        stomata.len()
    );

    let mut record = ImageRecord::new(image_name, image_size);
    record.detections = stomata;
    record.rejected = filtered
        .removed
        .iter()
        .map(|r| RejectedDetection {
            bbox: r.detection.bbox,
            class_id: r.detection.class_id,
            confidence: r.detection.confidence,
            reason: r.reason,
        })
        .collect();

    ImageMeasurement {
        record,
        removed: filtered.removed,
    }
}

/// Decode an image and run the engine on it.
pub fn detect_image<E: DetectionEngine + ?Sized>(
    engine: &mut E,
    image_path: &Path,
) -> Result<ImageDetections> {
    let image = image::open(image_path).map_err(|source| StomataError::Image {
        path: image_path.to_path_buf(),
        source,
    })?;
    let detections = engine.detect(&image)?;
    let image_name = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ImageDetections {
        image_name,
        image_size: ImageSize::new(image.height(), image.width()),
        detections,
    })
}

/// Detect and measure a single image file.
pub fn detect_and_measure<E: DetectionEngine + ?Sized>(
    engine: &mut E,
    image_path: &Path,
    config: &MeasureConfig,
    ctx: &mut BatchContext,
) -> Result<ImageMeasurement> {
    let input = detect_image(engine, image_path)?;
    Ok(measure_image(input, config, ctx))
}
