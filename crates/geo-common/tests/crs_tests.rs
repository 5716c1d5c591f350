//! Tests for CRS identification and comparison.

use geo_common::{Crs, CrsCode};

// ============================================================================
// Display
// ============================================================================

#[test]
fn test_display_names_code_and_datum() {
    assert_eq!(CrsCode::Epsg3857.to_string(), "EPSG:3857");
    assert_eq!(Crs::wgs84().to_string(), "EPSG:4326 (WGS 84)");
}

// ============================================================================
// Comparison
// ============================================================================

#[test]
fn test_wgs84_is_geographic() {
    let crs = Crs::wgs84();
    assert!(crs.is_geographic());
}

#[test]
fn test_mercator_is_not_wgs84() {
    let mercator = Crs::new(CrsCode::Epsg3857);
    assert!(!mercator.equals_ignoring_metadata(&Crs::wgs84()));
    assert!(!mercator.is_geographic());
}
