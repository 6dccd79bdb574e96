//! Axis-aligned boxes and the overlap tests used by the spatial filter.
//!
//! Overlap ratios follow the inclusive pixel-count convention: a box
//! spanning `x1..=x2` covers `x2 - x1 + 1` columns.

/// Image dimensions, serialized as `[height, width]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct ImageSize {
    pub height: u32,
    pub width: u32,
}

impl ImageSize {
    pub fn new(height: u32, width: u32) -> Self {
        Self { height, width }
    }
}

impl From<[u32; 2]> for ImageSize {
    fn from([height, width]: [u32; 2]) -> Self {
        Self { height, width }
    }
}

impl From<ImageSize> for [u32; 2] {
    fn from(size: ImageSize) -> Self {
        [size.height, size.width]
    }
}

/// Box `(x1, y1, x2, y2)` in absolute pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl From<[f64; 4]> for BBox {
    fn from([x1, y1, x2, y2]: [f64; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

impl BBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    /// Geometric area `|w| * |h|`.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Area under the inclusive pixel convention.
    pub fn pixel_area(&self) -> f64 {
        (self.x2 - self.x1 + 1.0) * (self.y2 - self.y1 + 1.0)
    }

    /// Inclusive pixel area of the overlap, 0 when the boxes are disjoint.
    pub fn intersection_pixel_area(&self, other: &BBox) -> f64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);
        if x2 < x1 || y2 < y1 {
            return 0.0;
        }
        (x2 - x1 + 1.0) * (y2 - y1 + 1.0)
    }

    pub fn iou(&self, other: &BBox) -> f64 {
        let inter = self.intersection_pixel_area(other);
        if inter <= 0.0 {
            return 0.0;
        }
        let union = self.pixel_area() + other.pixel_area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        inter / union
    }

    /// Full containment; a box is within itself.
    pub fn is_within(&self, other: &BBox) -> bool {
        self.x1 >= other.x1 && self.y1 >= other.y1 && self.x2 <= other.x2 && self.y2 <= other.y2
    }

    /// Fraction of `self` covered by `other` exceeds `threshold`.
    pub fn is_mostly_within(&self, other: &BBox, threshold: f64) -> bool {
        let area = self.pixel_area();
        if area <= 0.0 {
            return false;
        }
        self.intersection_pixel_area(other) / area > threshold
    }

    /// True when any side lies within `distance` pixels of the image border.
    pub fn is_near_edge(&self, image_size: ImageSize, distance: f64) -> bool {
        let width = image_size.width as f64;
        let height = image_size.height as f64;
        self.x1 < distance
            || self.y1 < distance
            || self.x2 > width - distance
            || self.y2 > height - distance
    }
}

pub fn bbox_iou(a: &BBox, b: &BBox) -> f64 {
    a.iou(b)
}

pub fn is_bbox_a_in_bbox_b(a: &BBox, b: &BBox) -> bool {
    a.is_within(b)
}

pub fn is_bbox_a_mostly_in_bbox_b(a: &BBox, b: &BBox, threshold: f64) -> bool {
    a.is_mostly_within(b, threshold)
}
