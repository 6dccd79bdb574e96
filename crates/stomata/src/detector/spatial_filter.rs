//! Per-image spatial filtering of raw detections.
//!
//! Passes run in order, each over the survivors of the previous one:
//! unrecognized classes, overlap duplicates, small near-edge complexes,
//! very small complexes, then pores and subsidiary cells that no longer
//! belong to a surviving complex.

use crate::detection::RawDetection;
use crate::geometry::{BBox, ImageSize};

use super::config::SpatialFilterConfig;
use super::dedup::overlap_keep_mask;

/// Why the spatial filter removed a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    Unrecognized,
    Overlap,
    NearEdge,
    TooSmall,
    Orphan,
}

#[derive(Debug, Clone)]
pub struct RemovedDetection {
    pub detection: RawDetection,
    pub reason: RemovalReason,
}

/// Retained detections plus every removal with its reason.
#[derive(Debug, Clone, Default)]
pub struct SpatialFilterOutput {
    pub retained: Vec<RawDetection>,
    pub removed: Vec<RemovedDetection>,
}

impl SpatialFilterOutput {
    pub fn complexes(&self) -> impl Iterator<Item = &RawDetection> {
        self.retained.iter().filter(|d| d.is_stomata_complex())
    }

    pub fn pores(&self) -> impl Iterator<Item = &RawDetection> {
        self.retained.iter().filter(|d| d.is_stomatal_pore())
    }

    pub fn subsidiary_cells(&self) -> impl Iterator<Item = &RawDetection> {
        self.retained.iter().filter(|d| d.is_subsidiary_cell())
    }

    pub fn count_removed(&self, reason: RemovalReason) -> usize {
        self.removed.iter().filter(|r| r.reason == reason).count()
    }

    fn reject_where(&mut self, reason: RemovalReason, reject: impl FnMut(&RawDetection) -> bool) {
        let mask: Vec<bool> = self.retained.iter().map(reject).collect();
        self.reject_mask(reason, &mask);
    }

    fn reject_mask(&mut self, reason: RemovalReason, reject: &[bool]) {
        let (rejected, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.retained)
            .into_iter()
            .zip(reject.iter().copied())
            .partition(|(_, r)| *r);
        self.retained = kept.into_iter().map(|(d, _)| d).collect();
        self.removed.extend(
            rejected
                .into_iter()
                .map(|(detection, _)| RemovedDetection { detection, reason }),
        );
    }
}

fn mean_complex_area(detections: &[RawDetection]) -> Option<f64> {
    let areas: Vec<f64> = detections
        .iter()
        .filter(|d| d.is_stomata_complex())
        .map(|d| d.bbox.area())
        .collect();
    crate::stats::mean(&areas)
}

/// Run all spatial passes over one image's detections.
pub fn filter_invalid_detections(
    detections: Vec<RawDetection>,
    image_size: ImageSize,
    config: &SpatialFilterConfig,
) -> SpatialFilterOutput {
    let mut out = SpatialFilterOutput {
        retained: detections,
        removed: Vec::new(),
    };

    out.reject_where(RemovalReason::Unrecognized, |d| {
        let unknown = matches!(d.kind(), crate::detection::StructureKind::Unrecognized(_));
        if unknown {
            tracing::warn!("Ignoring detection with unrecognized class id {}", d.class_id);
        }
        unknown
    });

    let losers: Vec<bool> = overlap_keep_mask(&out.retained, config.iou_threshold)
        .into_iter()
        .map(|keep| !keep)
        .collect();
    out.reject_mask(RemovalReason::Overlap, &losers);

    if let Some(mean_area) = mean_complex_area(&out.retained) {
        let cutoff = config.edge_size_fraction * mean_area;
        out.reject_where(RemovalReason::NearEdge, |d| {
            d.is_stomata_complex()
                && d.bbox.is_near_edge(image_size, config.edge_distance_px)
                && d.bbox.area() < cutoff
        });
    }

    if let Some(mean_area) = mean_complex_area(&out.retained) {
        let cutoff = config.min_size_fraction * mean_area;
        out.reject_where(RemovalReason::TooSmall, |d| {
            d.is_stomata_complex() && d.bbox.area() < cutoff
        });
    }

    let complex_boxes: Vec<BBox> = out.complexes().map(|d| d.bbox).collect();
    out.reject_where(RemovalReason::Orphan, |d| {
        if d.is_stomatal_pore() {
            !complex_boxes.iter().any(|b| d.bbox.is_within(b))
        } else if d.is_subsidiary_cell() {
            !complex_boxes
                .iter()
                .any(|b| d.bbox.is_mostly_within(b, config.subsidiary_overlap))
        } else {
            false
        }
    });

    tracing::debug!(
        "Spatial filter: {} retained, removed {} overlap / {} near-edge / {} small / {} orphan",
        out.retained.len(),
        out.count_removed(RemovalReason::Overlap),
        out.count_removed(RemovalReason::NearEdge),
        out.count_removed(RemovalReason::TooSmall),
        out.count_removed(RemovalReason::Orphan),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::box_detection;

    fn size() -> ImageSize {
        ImageSize::new(400, 400)
    }

    #[test]
    fn small_near_edge_complex_is_removed() {
        let dets = vec![
            box_detection(1, BBox::new(100.0, 100.0, 200.0, 200.0), 0.9),
            box_detection(1, BBox::new(250.0, 100.0, 350.0, 200.0), 0.9),
            // 40x100 = 40% of the 10_000 px mean, touching the left border.
            box_detection(0, BBox::new(5.0, 250.0, 45.0, 350.0), 0.9),
        ];
        let out = filter_invalid_detections(dets, size(), &SpatialFilterConfig::default());
        assert_eq!(out.retained.len(), 2);
        assert_eq!(out.count_removed(RemovalReason::NearEdge), 1);
        assert_eq!(out.removed[0].detection.bbox.x1, 5.0);
    }

    #[test]
    fn large_near_edge_complex_survives() {
        let dets = vec![
            box_detection(1, BBox::new(100.0, 100.0, 200.0, 200.0), 0.9),
            box_detection(0, BBox::new(5.0, 250.0, 105.0, 350.0), 0.9),
        ];
        let out = filter_invalid_detections(dets, size(), &SpatialFilterConfig::default());
        assert_eq!(out.retained.len(), 2);
    }

    #[test]
    fn tiny_complex_is_removed_anywhere() {
        let dets = vec![
            box_detection(1, BBox::new(100.0, 100.0, 200.0, 200.0), 0.9),
            box_detection(1, BBox::new(250.0, 100.0, 350.0, 200.0), 0.9),
            box_detection(1, BBox::new(200.0, 250.0, 220.0, 270.0), 0.9),
        ];
        let out = filter_invalid_detections(dets, size(), &SpatialFilterConfig::default());
        assert_eq!(out.retained.len(), 2);
        assert_eq!(out.count_removed(RemovalReason::TooSmall), 1);
    }

    #[test]
    fn orphans_follow_removed_complexes() {
        let dets = vec![
            box_detection(1, BBox::new(100.0, 100.0, 200.0, 200.0), 0.9),
            box_detection(1, BBox::new(110.0, 100.0, 210.0, 200.0), 0.5),
            // Inside the surviving complex.
            box_detection(2, BBox::new(130.0, 140.0, 170.0, 160.0), 0.8),
            // Only inside the losing complex.
            box_detection(2, BBox::new(190.0, 140.0, 208.0, 160.0), 0.8),
            // Mostly inside the surviving complex.
            box_detection(3, BBox::new(90.0, 120.0, 130.0, 180.0), 0.8),
            // Mostly outside.
            box_detection(3, BBox::new(180.0, 120.0, 240.0, 180.0), 0.8),
            box_detection(9, BBox::new(0.0, 0.0, 10.0, 10.0), 0.8),
        ];
        let out = filter_invalid_detections(dets, size(), &SpatialFilterConfig::default());
        assert_eq!(out.complexes().count(), 1);
        assert_eq!(out.pores().count(), 1);
        assert_eq!(out.subsidiary_cells().count(), 1);
        assert_eq!(out.count_removed(RemovalReason::Overlap), 1);
        assert_eq!(out.count_removed(RemovalReason::Orphan), 2);
        assert_eq!(out.count_removed(RemovalReason::Unrecognized), 1);
    }
}
