//! Measurement records and their per-image JSON form.

use crate::detector::RemovalReason;
use crate::geometry::keypoints::{opt_pair, opt_segments};
use crate::geometry::polygon::{flat_list, opt_flat};
use crate::geometry::{BBox, ImageSize, KeypointPair, Polygon};

/// Class of a measured complex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum StomaClass {
    Closed,
    Open,
}

impl StomaClass {
    pub fn name(self) -> &'static str {
        match self {
            Self::Closed => "Closed Stomata",
            Self::Open => "Open Stomata",
        }
    }
}

impl TryFrom<u8> for StomaClass {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Closed),
            1 => Ok(Self::Open),
            other => Err(format!("category_id {other} is not a stomata complex")),
        }
    }
}

impl From<StomaClass> for u8 {
    fn from(class: StomaClass) -> Self {
        match class {
            StomaClass::Closed => 0,
            StomaClass::Open => 1,
        }
    }
}

/// Guard-cell outline: the largest mask component and an optional hole.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GuardCellPolygon {
    #[serde(with = "opt_flat")]
    pub exterior: Option<Polygon>,
    #[serde(with = "opt_flat")]
    pub interior: Option<Polygon>,
}

/// One measured stomatal complex. All lengths and areas are in pixels.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StomaRecord {
    pub stoma_id: u64,
    pub image_name: String,
    pub bbox: BBox,
    pub category_id: StomaClass,
    pub confidence: f32,

    pub guard_cell_polygon: GuardCellPolygon,
    pub guard_cell_area: f64,
    /// `[outer C -> pore C, pore D -> outer D]`.
    #[serde(with = "opt_segments")]
    pub guard_cell_width_keypoints: Option<[KeypointPair; 2]>,
    /// `[outer A -> pore A, pore B -> outer B]`.
    #[serde(with = "opt_segments")]
    pub guard_cell_groove_keypoints: Option<[KeypointPair; 2]>,
    #[serde(default)]
    pub guard_cell_width: f64,
    #[serde(default)]
    pub groove_length: f64,

    #[serde(with = "opt_flat")]
    pub pore_polygon: Option<Polygon>,
    pub pore_area: f64,
    #[serde(rename = "AB_keypoints", with = "opt_pair")]
    pub ab_keypoints: Option<KeypointPair>,
    #[serde(rename = "CD_keypoints", with = "opt_pair")]
    pub cd_keypoints: Option<KeypointPair>,
    pub pore_length: f64,
    pub pore_width: f64,
    pub width_over_length: f64,

    #[serde(with = "flat_list")]
    pub subsidiary_cell_polygons: Vec<Polygon>,
    pub subsidiary_cell_area: f64,
}

/// Compact trace of a detection the spatial filter removed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RejectedDetection {
    pub bbox: BBox,
    pub class_id: i64,
    pub confidence: f32,
    pub reason: RemovalReason,
}

/// All records of one image.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageRecord {
    /// Taken from the file stem; not part of the JSON body.
    #[serde(skip)]
    pub image_name: String,
    pub detections: Vec<StomaRecord>,
    pub invalid_detections: Vec<StomaRecord>,
    pub image_size: ImageSize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedDetection>,
}

impl ImageRecord {
    pub fn new(image_name: impl Into<String>, image_size: ImageSize) -> Self {
        Self {
            image_name: image_name.into(),
            detections: Vec::new(),
            invalid_detections: Vec::new(),
            image_size,
            rejected: Vec::new(),
        }
    }

    /// Valid plus invalidated complexes.
    pub fn stoma_count(&self) -> usize {
        self.detections.len() + self.invalid_detections.len()
    }

    /// Spatially rejected complexes recorded with `reason`.
    pub fn rejected_complexes(&self, reason: RemovalReason) -> usize {
        self.rejected
            .iter()
            .filter(|r| r.reason == reason && (r.class_id == 0 || r.class_id == 1))
            .count()
    }

    /// Move every valid detection matching `reject` to `invalid_detections`.
    /// Returns how many moved.
    pub fn invalidate_where(&mut self, mut reject: impl FnMut(&StomaRecord) -> bool) -> usize {
        let (rejected, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.detections).into_iter().partition(|r| reject(r));
        self.detections = kept;
        let moved = rejected.len();
        self.invalid_detections.extend(rejected);
        moved
    }
}
