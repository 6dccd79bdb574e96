//! Pure geometry: boxes, polygons, keypoint pairs and the axis constructions.

mod axis;
mod bbox;
pub(crate) mod keypoints;
pub(crate) mod polygon;

pub use axis::{extract_principal_axis_keypoints, find_collinear_axis, find_perpendicular_axis};
pub use bbox::{bbox_iou, is_bbox_a_in_bbox_b, is_bbox_a_mostly_in_bbox_b, BBox, ImageSize};
pub use keypoints::{axis_length, l2_dist, midpoint, KeypointPair, MISSING_PAIR};
pub use polygon::{take_largest, Polygon};
