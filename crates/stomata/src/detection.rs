//! Raw per-instance model output and its semantic roles.

use image::DynamicImage;

use crate::error::Result;
use crate::geometry::{BBox, ImageSize, KeypointPair};
use crate::mask::Mask;

/// Semantic role of a detected instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureKind {
    ClosedStoma,
    OpenStoma,
    Pore,
    SubsidiaryCell,
    Unrecognized(i64),
}

impl StructureKind {
    pub fn from_class_id(class_id: i64) -> Self {
        match class_id {
            0 => Self::ClosedStoma,
            1 => Self::OpenStoma,
            2 => Self::Pore,
            3 => Self::SubsidiaryCell,
            other => Self::Unrecognized(other),
        }
    }

    pub fn class_id(self) -> i64 {
        match self {
            Self::ClosedStoma => 0,
            Self::OpenStoma => 1,
            Self::Pore => 2,
            Self::SubsidiaryCell => 3,
            Self::Unrecognized(id) => id,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ClosedStoma => "Closed Stomata",
            Self::OpenStoma => "Open Stomata",
            Self::Pore => "Stomatal Pore",
            Self::SubsidiaryCell => "Subsidiary Cell",
            Self::Unrecognized(_) => "Unrecognized",
        }
    }

    pub fn is_stomata_complex(self) -> bool {
        matches!(self, Self::ClosedStoma | Self::OpenStoma)
    }

    pub fn is_stomatal_pore(self) -> bool {
        matches!(self, Self::Pore)
    }

    pub fn is_subsidiary_cell(self) -> bool {
        matches!(self, Self::SubsidiaryCell)
    }
}

/// Model keypoint with visibility.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub visibility: f64,
}

impl From<[f64; 3]> for Keypoint {
    fn from([x, y, visibility]: [f64; 3]) -> Self {
        Self { x, y, visibility }
    }
}

impl From<Keypoint> for [f64; 3] {
    fn from(k: Keypoint) -> Self {
        [k.x, k.y, k.visibility]
    }
}

/// One candidate instance as emitted by the detection engine.
#[derive(Debug, Clone)]
pub struct RawDetection {
    pub bbox: BBox,
    pub mask: Mask,
    /// The first two keypoints form the model's pore length axis.
    pub keypoints: Vec<Keypoint>,
    pub class_id: i64,
    pub confidence: f32,
}

impl RawDetection {
    pub fn kind(&self) -> StructureKind {
        StructureKind::from_class_id(self.class_id)
    }

    pub fn is_stomata_complex(&self) -> bool {
        self.kind().is_stomata_complex()
    }

    pub fn is_stomatal_pore(&self) -> bool {
        self.kind().is_stomatal_pore()
    }

    pub fn is_subsidiary_cell(&self) -> bool {
        self.kind().is_subsidiary_cell()
    }

    /// Pore length axis predicted by the model, if two keypoints are present.
    pub fn model_axis(&self) -> Option<KeypointPair> {
        match self.keypoints.as_slice() {
            [a, b, ..] => Some(KeypointPair::new([a.x, a.y], [b.x, b.y])),
            _ => None,
        }
    }
}

pub fn is_stomata_complex(detection: &RawDetection) -> bool {
    detection.is_stomata_complex()
}

pub fn is_stomatal_pore(detection: &RawDetection) -> bool {
    detection.is_stomatal_pore()
}

pub fn is_subsidiary_cell(detection: &RawDetection) -> bool {
    detection.is_subsidiary_cell()
}

/// All raw detections of one image.
#[derive(Debug, Clone)]
pub struct ImageDetections {
    pub image_name: String,
    pub image_size: ImageSize,
    pub detections: Vec<RawDetection>,
}

/// Instance-segmentation backend producing raw detections for one image.
pub trait DetectionEngine {
    fn detect(&mut self, image: &DynamicImage) -> Result<Vec<RawDetection>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_ids_map_to_roles() {
        assert!(StructureKind::from_class_id(0).is_stomata_complex());
        assert!(StructureKind::from_class_id(1).is_stomata_complex());
        assert!(StructureKind::from_class_id(2).is_stomatal_pore());
        assert!(StructureKind::from_class_id(3).is_subsidiary_cell());
        let odd = StructureKind::from_class_id(7);
        assert_eq!(odd, StructureKind::Unrecognized(7));
        assert!(!odd.is_stomata_complex() && !odd.is_stomatal_pore() && !odd.is_subsidiary_cell());
        assert_eq!(odd.class_id(), 7);
    }

    #[test]
    fn model_axis_needs_two_keypoints() {
        let mut det = RawDetection {
            bbox: BBox::new(0.0, 0.0, 4.0, 4.0),
            mask: Mask::empty(ImageSize::new(5, 5)),
            keypoints: vec![[1.0, 2.0, 1.0].into()],
            class_id: 1,
            confidence: 0.9,
        };
        assert!(det.model_axis().is_none());
        det.keypoints.push([3.0, 2.0, 1.0].into());
        assert_eq!(
            det.model_axis(),
            Some(KeypointPair::new([1.0, 2.0], [3.0, 2.0]))
        );
    }
}
