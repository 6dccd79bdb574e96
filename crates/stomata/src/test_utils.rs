//! Shared builders for synthetic detections in unit tests.

use crate::detection::{Keypoint, RawDetection};
use crate::geometry::{BBox, ImageSize};
use crate::mask::Mask;

/// Filled axis-aligned ellipse; pixel `(x, y)` is set when
/// `((x - cx) / a)^2 + ((y - cy) / b)^2 <= 1` after rotating by `-angle`.
pub(crate) fn ellipse_mask(size: ImageSize, center: [f64; 2], semi_axes: [f64; 2], angle: f64) -> Mask {
    let (s, c) = angle.sin_cos();
    Mask::from_fn(size, |x, y| {
        let dx = x as f64 - center[0];
        let dy = y as f64 - center[1];
        let u = c * dx + s * dy;
        let v = -s * dx + c * dy;
        (u / semi_axes[0]).powi(2) + (v / semi_axes[1]).powi(2) <= 1.0
    })
}

/// Outer ellipse minus a concentric inner ellipse.
pub(crate) fn ring_mask(size: ImageSize, center: [f64; 2], outer: [f64; 2], inner: [f64; 2]) -> Mask {
    let outer_mask = ellipse_mask(size, center, outer, 0.0);
    let inner_mask = ellipse_mask(size, center, inner, 0.0);
    Mask::from_fn(size, |x, y| outer_mask.is_set(x, y) && !inner_mask.is_set(x, y))
}

fn extent_box(center: [f64; 2], semi_axes: [f64; 2]) -> BBox {
    BBox::new(
        center[0] - semi_axes[0],
        center[1] - semi_axes[1],
        center[0] + semi_axes[0],
        center[1] + semi_axes[1],
    )
}

/// Detection whose mask fills its box, for box-only filter tests.
pub(crate) fn box_detection(class_id: i64, bbox: BBox, confidence: f32) -> RawDetection {
    let size = ImageSize::new(bbox.y2.ceil() as u32 + 1, bbox.x2.ceil() as u32 + 1);
    let mask = Mask::from_fn(size, |x, y| {
        let (x, y) = (x as f64, y as f64);
        x >= bbox.x1 && x <= bbox.x2 && y >= bbox.y1 && y <= bbox.y2
    });
    RawDetection {
        bbox,
        mask,
        keypoints: Vec::new(),
        class_id,
        confidence,
    }
}

/// Horizontal open stoma: a guard-cell ring (class 1) plus its pore (class 2).
/// Model keypoints sit at the pore tips.
pub(crate) fn open_stoma(
    size: ImageSize,
    center: [f64; 2],
    outer: [f64; 2],
    pore: [f64; 2],
    confidence: f32,
) -> Vec<RawDetection> {
    let tips = vec![
        Keypoint::from([center[0] - pore[0], center[1], 1.0]),
        Keypoint::from([center[0] + pore[0], center[1], 1.0]),
    ];
    vec![
        RawDetection {
            bbox: extent_box(center, outer),
            mask: ring_mask(size, center, outer, pore),
            keypoints: tips,
            class_id: 1,
            confidence,
        },
        RawDetection {
            bbox: extent_box(center, pore),
            mask: ellipse_mask(size, center, pore, 0.0),
            keypoints: Vec::new(),
            class_id: 2,
            confidence,
        },
    ]
}

/// Filled horizontal closed stoma with keypoints along 60% of its major axis.
pub(crate) fn closed_stoma(
    size: ImageSize,
    center: [f64; 2],
    semi_axes: [f64; 2],
    confidence: f32,
) -> RawDetection {
    let half = 0.6 * semi_axes[0];
    RawDetection {
        bbox: extent_box(center, semi_axes),
        mask: ellipse_mask(size, center, semi_axes, 0.0),
        keypoints: vec![
            Keypoint::from([center[0] - half, center[1], 1.0]),
            Keypoint::from([center[0] + half, center[1], 1.0]),
        ],
        class_id: 0,
        confidence,
    }
}

pub(crate) fn subsidiary_cell(
    size: ImageSize,
    center: [f64; 2],
    semi_axes: [f64; 2],
    confidence: f32,
) -> RawDetection {
    RawDetection {
        bbox: extent_box(center, semi_axes),
        mask: ellipse_mask(size, center, semi_axes, 0.0),
        keypoints: Vec::new(),
        class_id: 3,
        confidence,
    }
}

/// Minimal closed-stoma record with the given pore length and box.
pub(crate) fn stoma_record(stoma_id: u64, pore_length: f64, bbox: BBox) -> crate::record::StomaRecord {
    crate::record::StomaRecord {
        stoma_id,
        image_name: "leaf".into(),
        bbox,
        category_id: crate::record::StomaClass::Closed,
        confidence: 0.9,
        guard_cell_polygon: Default::default(),
        guard_cell_area: 100.0,
        guard_cell_width_keypoints: None,
        guard_cell_groove_keypoints: None,
        guard_cell_width: 0.0,
        groove_length: 0.0,
        pore_polygon: None,
        pore_area: 0.0,
        ab_keypoints: None,
        cd_keypoints: None,
        pore_length,
        pore_width: 0.0,
        width_over_length: 0.0,
        subsidiary_cell_polygons: Vec::new(),
        subsidiary_cell_area: 0.0,
    }
}
