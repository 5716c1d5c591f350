//! Spherical Web Mercator (EPSG:3857).

use std::f64::consts::PI;

/// Sphere radius used by EPSG:3857 (the WGS84 semi-major axis).
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude beyond which Web Mercator is undefined in practice.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Project lon/lat degrees to Web Mercator meters.
///
/// Returns `None` outside the valid latitude band.
pub fn forward(lon: f64, lat: f64) -> Option<(f64, f64)> {
    if !lon.is_finite() || !lat.is_finite() || lat.abs() > MAX_LATITUDE {
        return None;
    }
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    Some((x, y))
}

/// Unproject Web Mercator meters to lon/lat degrees.
pub fn inverse(x: f64, y: f64) -> Option<(f64, f64)> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    Some((lon, lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let (x, y) = forward(0.0, 0.0).unwrap();
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_roundtrip() {
        let (x, y) = forward(-95.0, 35.0).unwrap();
        let (lon, lat) = inverse(x, y).unwrap();
        assert!((lon + 95.0).abs() < 1e-9);
        assert!((lat - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_polar_rejected() {
        assert!(forward(0.0, 89.0).is_none());
    }
}
