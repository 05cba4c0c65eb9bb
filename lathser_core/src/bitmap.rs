/*!
Grayscale bitmaps and the foreground classification used by tracing and engraving.
*/

use crate::error::{LaserError, Result};
use crate::protocol::INTENSITY_THRESHOLD;

/// A binary classification over an integer pixel grid.
///
/// Coordinates outside `width` x `height` read as background.
pub trait Silhouette {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn is_foreground(&self, x: usize, y: usize) -> bool;
}

/// Owned 8-bit intensity image in row-major order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Create a bitmap from raw row-major intensities
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        let expected = width.checked_mul(height).ok_or_else(|| {
            LaserError::degenerate(format!("bitmap size {}x{} overflows", width, height))
        })?;
        if pixels.len() != expected {
            return Err(LaserError::degenerate(format!(
                "bitmap {}x{} needs {} pixels, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// All-background bitmap
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    /// Build a bitmap by evaluating `f(x, y)` for every pixel
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// True when the bitmap has no pixels at all
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Intensity at `(x, y)`, or 0 outside the image
    pub fn intensity(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.pixels[y * self.width + x]
    }

    /// Intensities of one row
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.width;
        &self.pixels[start..start + self.width]
    }
}

impl Silhouette for Bitmap {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn is_foreground(&self, x: usize, y: usize) -> bool {
        self.intensity(x, y) > INTENSITY_THRESHOLD
    }
}
