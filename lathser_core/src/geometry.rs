/*!
2D geometry kernel: vectors, scale-and-translate transforms and bounding boxes.

These are plain value types shared by the tracer, the simplifier and the
document model. Only normalization, inversion and frame mapping can fail,
and they fail with [`LaserError::DegenerateGeometry`].
*/

use crate::error::{LaserError, Result};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A 2D vector of `f64` coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

/// Points and vectors share one representation
pub type Point2 = Vector2;

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction.
    ///
    /// Fails for a zero-length vector; callers must not rely on a NaN result.
    pub fn normalized(self) -> Result<Vector2> {
        let length = self.length();
        if length == 0.0 || !length.is_finite() {
            return Err(LaserError::degenerate(format!(
                "cannot normalize vector ({}, {}) of length {}",
                self.x, self.y, length
            )));
        }
        Ok(self / length)
    }

    /// Rotated 90 degrees counter-clockwise
    pub fn reciprocal(self) -> Vector2 {
        Vector2::new(-self.y, self.x)
    }

    /// Component-wise minimum
    pub fn min(self, other: Vector2) -> Vector2 {
        Vector2::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum
    pub fn max(self, other: Vector2) -> Vector2 {
        Vector2::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Angle in radians from the positive X axis
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn flip_x(self) -> Vector2 {
        Vector2::new(-self.x, self.y)
    }

    pub fn flip_y(self) -> Vector2 {
        Vector2::new(self.x, -self.y)
    }

    /// Euclidean distance between two points
    pub fn distance(self, other: Point2) -> f64 {
        (self - other).length()
    }
}

// Points are used as lookup keys, so equal values must hash equally.
// `-0.0 == 0.0`, hence the sign of zero is folded before hashing.
impl Eq for Vector2 {}

impl Hash for Vector2 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        fn canonical_bits(v: f64) -> u64 {
            if v == 0.0 {
                0.0f64.to_bits()
            } else {
                v.to_bits()
            }
        }
        canonical_bits(self.x).hash(state);
        canonical_bits(self.y).hash(state);
    }
}

impl Add for Vector2 {
    type Output = Vector2;

    fn add(self, other: Vector2) -> Vector2 {
        Vector2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, other: Vector2) -> Vector2 {
        Vector2::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for Vector2 {
    type Output = Vector2;

    fn neg(self) -> Vector2 {
        Vector2::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Vector2;

    fn mul(self, factor: f64) -> Vector2 {
        Vector2::new(self.x * factor, self.y * factor)
    }
}

impl Div<f64> for Vector2 {
    type Output = Vector2;

    fn div(self, divisor: f64) -> Vector2 {
        Vector2::new(self.x / divisor, self.y / divisor)
    }
}

/// Uniform scale followed by a translation:
/// `(x, y) -> (x * scale + offset_x, y * scale + offset_y)`.
///
/// Used to move between raster pixel space, model space and device units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Transform {
    pub fn new(scale: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    /// The no-op transform
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    /// Map a point through the transform
    pub fn apply(&self, p: Point2) -> Point2 {
        Vector2::new(
            p.x * self.scale + self.offset_x,
            p.y * self.scale + self.offset_y,
        )
    }

    /// The inverse mapping: `x = x' / scale - offset / scale`
    pub fn invert(&self) -> Result<Transform> {
        if self.scale == 0.0 || !self.scale.is_finite() {
            return Err(LaserError::degenerate(format!(
                "cannot invert transform with scale {}",
                self.scale
            )));
        }
        Ok(Transform::new(
            1.0 / self.scale,
            -self.offset_x / self.scale,
            -self.offset_y / self.scale,
        ))
    }

    /// Scale the output of this transform by `factor`
    pub fn scaled(&self, factor: f64) -> Transform {
        Transform::new(
            self.scale * factor,
            self.offset_x * factor,
            self.offset_y * factor,
        )
    }

    /// Translate the output of this transform by `(dx, dy)`
    pub fn translated(&self, dx: f64, dy: f64) -> Transform {
        Transform::new(self.scale, self.offset_x + dx, self.offset_y + dy)
    }

    /// Apply `self` first, then `next`
    pub fn then(&self, next: &Transform) -> Transform {
        self.scaled(next.scale)
            .translated(next.offset_x, next.offset_y)
    }

    /// Fit `bbox` into a `width` x `height` frame, centered, without
    /// distorting its aspect ratio.
    pub fn make_map(bbox: &BoundingBox, width: f64, height: f64) -> Result<Transform> {
        let size = bbox.size();
        if bbox.is_empty() || size.x <= 0.0 || size.y <= 0.0 {
            return Err(LaserError::degenerate(format!(
                "cannot map bounding box of size {}x{}",
                size.x, size.y
            )));
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(LaserError::degenerate(format!(
                "cannot map into frame of size {}x{}",
                width, height
            )));
        }

        let scale = if size.x / size.y < width / height {
            // Left/right margins, height is the limiting axis
            height / size.y
        } else {
            width / size.x
        };

        let offset = Vector2::new(width, height) / 2.0 - bbox.center() * scale;
        Ok(Transform::new(scale, offset.x, offset.y))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Running min/max of a point set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox {
    /// Create an empty bounding box
    pub fn new() -> Self {
        Self {
            min: Vector2::new(f64::MAX, f64::MAX),
            max: Vector2::new(-f64::MAX, -f64::MAX),
        }
    }

    /// Bounding box of all points in the iterator
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2>) -> Self {
        let mut bbox = Self::new();
        for p in points {
            bbox.add_point(*p);
        }
        bbox
    }

    pub fn add_point(&mut self, p: Point2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Grow the box by `margin` on every side
    pub fn add_margin(&mut self, margin: f64) {
        self.min.x -= margin;
        self.min.y -= margin;
        self.max.x += margin;
        self.max.y += margin;
    }

    /// True until a point has been added
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn size(&self) -> Vector2 {
        self.max - self.min
    }

    pub fn center(&self) -> Point2 {
        self.min + self.size() / 2.0
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}
