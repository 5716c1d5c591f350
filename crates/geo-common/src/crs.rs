//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known CRS codes a geocoding can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// NAD83 Geographic
    Epsg4269,
    /// Web Mercator (meters)
    Epsg3857,
}

impl CrsCode {
    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg4269 => "EPSG:4269",
            CrsCode::Epsg3857 => "EPSG:3857",
        };
        write!(f, "{}", code)
    }
}

/// A CRS definition: the identifying code plus descriptive metadata.
///
/// Two definitions describe the same reference system when their codes
/// match; the name is informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    pub code: CrsCode,
    pub name: String,
}

impl Crs {
    pub fn new(code: CrsCode) -> Self {
        let name = match code {
            CrsCode::Epsg4326 => "WGS 84",
            CrsCode::Epsg4269 => "NAD83",
            CrsCode::Epsg3857 => "WGS 84 / Pseudo-Mercator",
        };
        Self {
            code,
            name: name.to_string(),
        }
    }

    /// Geographic WGS84, the only datum for which lightweight 1-D
    /// coordinate axes are written.
    pub fn wgs84() -> Self {
        Self::new(CrsCode::Epsg4326)
    }

    /// Compare reference systems, ignoring names and other metadata.
    pub fn equals_ignoring_metadata(&self, other: &Crs) -> bool {
        self.code == other.code
    }

    pub fn is_geographic(&self) -> bool {
        self.code.is_geographic()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_name() {
        let mut renamed = Crs::wgs84();
        renamed.name = "WGS 1984".to_string();
        assert!(renamed.equals_ignoring_metadata(&Crs::wgs84()));
        assert!(!Crs::new(CrsCode::Epsg4269).equals_ignoring_metadata(&Crs::wgs84()));
    }

    #[test]
    fn test_geographic_codes() {
        assert!(CrsCode::Epsg4326.is_geographic());
        assert!(CrsCode::Epsg4269.is_geographic());
        assert!(!CrsCode::Epsg3857.is_geographic());
    }
}
