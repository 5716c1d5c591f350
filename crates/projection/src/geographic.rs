//! Conversion between map coordinates of a supported CRS and geographic
//! positions.

use geo_common::{CrsCode, GeoPos};

use crate::mercator;

/// Convert map coordinates `(x, y)` in `code` to a geographic position.
///
/// Geographic codes are already lon/lat, so the conversion is the identity.
/// Datum shifts between geographic codes are not applied.
pub fn to_geographic(code: CrsCode, x: f64, y: f64) -> Option<GeoPos> {
    match code {
        CrsCode::Epsg4326 | CrsCode::Epsg4269 => {
            if x.is_finite() && y.is_finite() {
                Some(GeoPos::new(y, x))
            } else {
                None
            }
        }
        CrsCode::Epsg3857 => mercator::inverse(x, y).map(|(lon, lat)| GeoPos::new(lat, lon)),
    }
}

/// Convert a geographic position to map coordinates in `code`.
pub fn from_geographic(code: CrsCode, pos: GeoPos) -> Option<(f64, f64)> {
    match code {
        CrsCode::Epsg4326 | CrsCode::Epsg4269 => {
            if pos.is_valid() {
                Some((pos.lon, pos.lat))
            } else {
                None
            }
        }
        CrsCode::Epsg3857 => mercator::forward(pos.lon, pos.lat),
    }
}
