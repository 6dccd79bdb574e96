//! Binary instance masks and their polygon outlines.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, Contour};

use crate::error::{Result, StomataError};
use crate::geometry::{ImageSize, Polygon};

/// Uncompressed COCO run-length encoding.
///
/// Runs alternate background / foreground starting with background and
/// walk the image column by column.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CocoRle {
    /// `[height, width]`.
    pub size: [u32; 2],
    pub counts: Vec<u32>,
}

/// Image-sized binary mask; any non-zero pixel is foreground.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    pixels: GrayImage,
}

impl Mask {
    pub fn from_gray(pixels: GrayImage) -> Self {
        Self { pixels }
    }

    pub fn empty(size: ImageSize) -> Self {
        Self {
            pixels: GrayImage::new(size.width, size.height),
        }
    }

    pub fn from_fn(size: ImageSize, mut inside: impl FnMut(u32, u32) -> bool) -> Self {
        let pixels = GrayImage::from_fn(size.width, size.height, |x, y| {
            Luma([if inside(x, y) { 255 } else { 0 }])
        });
        Self { pixels }
    }

    pub fn from_rle(rle: &CocoRle) -> Result<Self> {
        let [height, width] = rle.size;
        let total = height as u64 * width as u64;
        let covered: u64 = rle.counts.iter().map(|&c| c as u64).sum();
        if covered != total {
            return Err(StomataError::InvalidMask(format!(
                "RLE covers {covered} pixels, expected {total} for {height}x{width}"
            )));
        }

        let mut pixels = GrayImage::new(width, height);
        let mut index: u64 = 0;
        for (run, &count) in rle.counts.iter().enumerate() {
            if run % 2 == 1 {
                for k in index..index + count as u64 {
                    let x = (k / height as u64) as u32;
                    let y = (k % height as u64) as u32;
                    pixels.put_pixel(x, y, Luma([255]));
                }
            }
            index += count as u64;
        }
        Ok(Self { pixels })
    }

    /// Decode `rle` only if it is declared at `expected` size, so a
    /// mismatched header never allocates.
    pub fn from_rle_sized(rle: &CocoRle, expected: ImageSize) -> Result<Self> {
        let declared = ImageSize::from(rle.size);
        if declared != expected {
            return Err(StomataError::InvalidMask(format!(
                "mask size {:?} does not match image size {:?}",
                declared, expected
            )));
        }
        Self::from_rle(rle)
    }

    pub fn to_rle(&self) -> CocoRle {
        let (width, height) = self.pixels.dimensions();
        let mut counts = Vec::new();
        let mut current = false;
        let mut run = 0u32;
        for x in 0..width {
            for y in 0..height {
                let on = self.is_set(x, y);
                if on != current {
                    counts.push(run);
                    run = 0;
                    current = on;
                }
                run += 1;
            }
        }
        counts.push(run);
        CocoRle {
            size: [height, width],
            counts,
        }
    }

    pub fn size(&self) -> ImageSize {
        let (width, height) = self.pixels.dimensions();
        ImageSize::new(height, width)
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.pixels.get_pixel(x, y)[0] != 0
    }

    /// Foreground pixel count.
    pub fn area(&self) -> u64 {
        self.pixels.pixels().filter(|p| p[0] != 0).count() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.pixels().all(|p| p[0] == 0)
    }

    /// Outer and hole borders of every component, vertices at pixel centres.
    /// Borders with fewer than three points are dropped.
    pub fn polygons(&self) -> Vec<Polygon> {
        let contours: Vec<Contour<u32>> = find_contours(&self.pixels);
        contours
            .into_iter()
            .filter(|contour| contour.points.len() >= 3)
            .filter_map(|contour| {
                let vertices = contour
                    .points
                    .iter()
                    .map(|p| [p.x as f64 + 0.5, p.y as f64 + 0.5])
                    .collect();
                Polygon::new(vertices)
            })
            .collect()
    }
}
