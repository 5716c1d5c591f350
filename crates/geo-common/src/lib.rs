//! Common value types shared across the geocoding workspace.

pub mod bbox;
pub mod crs;
pub mod raster;

pub use bbox::BoundingBox;
pub use crs::{Crs, CrsCode};
pub use raster::{GeoPos, PixelPos, RasterDimension};
