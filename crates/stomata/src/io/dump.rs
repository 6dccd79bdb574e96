//! Detection dump JSON: raw engine output for one image.
//!
//! Masks are stored as uncompressed COCO RLE so a dump can be produced by
//! any segmentation runtime and replayed through the pipeline.

use std::path::Path;

use crate::detection::{ImageDetections, Keypoint, RawDetection};
use crate::error::{Result, StomataError};
use crate::geometry::{BBox, ImageSize};
use crate::mask::{CocoRle, Mask};

use super::records::{file_stem, json_files};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DumpInstance {
    pub bbox: BBox,
    pub class_id: i64,
    pub score: f32,
    #[serde(default)]
    pub keypoints: Vec<Keypoint>,
    pub mask: CocoRle,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DetectionDump {
    /// Defaults to the file stem when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    pub image_size: ImageSize,
    pub instances: Vec<DumpInstance>,
}

impl DetectionDump {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| StomataError::io(path, e))?;
        serde_json::from_str(&data).map_err(|e| StomataError::json(path, e))
    }

    pub fn write_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json).map_err(|e| StomataError::io(path, e))
    }

    pub fn from_image_detections(input: &ImageDetections) -> Self {
        Self {
            image_name: Some(input.image_name.clone()),
            image_size: input.image_size,
            instances: input
                .detections
                .iter()
                .map(|d| DumpInstance {
                    bbox: d.bbox,
                    class_id: d.class_id,
                    score: d.confidence,
                    keypoints: d.keypoints.clone(),
                    mask: d.mask.to_rle(),
                })
                .collect(),
        }
    }

    /// Decode masks; every mask must match the image size.
    pub fn into_image_detections(self, fallback_name: &str) -> Result<ImageDetections> {
        let image_size = self.image_size;
        let detections = self
            .instances
            .into_iter()
            .map(|inst| {
                let mask = Mask::from_rle_sized(&inst.mask, image_size)?;
                Ok(RawDetection {
                    bbox: inst.bbox,
                    mask,
                    keypoints: inst.keypoints,
                    class_id: inst.class_id,
                    confidence: inst.score,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ImageDetections {
            image_name: self.image_name.unwrap_or_else(|| fallback_name.to_string()),
            image_size,
            detections,
        })
    }
}

pub fn load_detection_dump(path: &Path) -> Result<ImageDetections> {
    DetectionDump::from_json_file(path)?
        .into_image_detections(&file_stem(path))
        .map_err(|e| match e {
            StomataError::InvalidMask(reason) => StomataError::InvalidDump {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
}

/// Lazily load every dump in `dir` as batch input `(source, detections)`.
pub fn detection_dump_inputs(
    dir: &Path,
) -> Result<impl ExactSizeIterator<Item = (String, Result<ImageDetections>)>> {
    let files = json_files(dir)?;
    tracing::info!("Found {} detection dumps in {}", files.len(), dir.display());
    Ok(files.into_iter().map(|path| {
        let source = path.display().to_string();
        (source, load_detection_dump(&path))
    }))
}
