//! Raster extent and pixel/geographic position types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of a product raster, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RasterDimension {
    pub width: usize,
    pub height: usize,
}

impl RasterDimension {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// A raster with no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for RasterDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A position in image space. `(0.0, 0.0)` is the upper-left corner of the
/// first pixel and `(0.5, 0.5)` is its center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPos {
    pub x: f64,
    pub y: f64,
}

impl PixelPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Center of the pixel at column `x`, row `y`.
    pub fn center(x: usize, y: usize) -> Self {
        Self {
            x: x as f64 + 0.5,
            y: y as f64 + 0.5,
        }
    }
}

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPos {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPos {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Position carrying NaN on both axes, written where a pixel has no location.
    pub fn invalid() -> Self {
        Self {
            lat: f64::NAN,
            lon: f64::NAN,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}
