//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic or projected bounding box.
///
/// For geographic CRS (EPSG:4326, EPSG:4269), coordinates are in degrees.
/// For projected CRS (EPSG:3857), coordinates are in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box containing both points, regardless of their order.
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            min_x: a.0.min(b.0),
            min_y: a.1.min(b.1),
            max_x: a.0.max(b.0),
            max_y: a.1.max(b.1),
        }
    }

    /// Grow the box so it contains `(x, y)`. NaN coordinates are ignored.
    pub fn include(&mut self, x: f64, y: f64) {
        if x.is_nan() || y.is_nan() {
            return;
        }
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// An inverted box that any `include` call will replace.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// True until at least one point has been included.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_orders_axes() {
        let bbox = BoundingBox::from_corners((10.0, -5.0), (2.0, 7.5));
        assert_eq!(bbox.min_x, 2.0);
        assert_eq!(bbox.min_y, -5.0);
        assert_eq!(bbox.max_x, 10.0);
        assert_eq!(bbox.max_y, 7.5);
    }

    #[test]
    fn test_include_ignores_nan() {
        let mut bbox = BoundingBox::empty();
        assert!(bbox.is_empty());

        bbox.include(1.0, 2.0);
        bbox.include(f64::NAN, 50.0);
        bbox.include(-3.0, 4.0);

        assert!(!bbox.is_empty());
        assert_eq!(bbox, BoundingBox::new(-3.0, 2.0, 1.0, 4.0));
    }
}
