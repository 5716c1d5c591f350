//! Affine geocoding from CF/COARDS coordinate variables.
//!
//! Two mutually exclusive branches:
//!
//! - **Bounds**: both axes declare `valid_min`/`valid_max`. Pixel sizes are
//!   the declared extent divided by the raster size, anchored at the centre
//!   of the bottom-left pixel, and rows are always stored south to north.
//! - **Samples**: pixel sizes come from the step between the first two stored
//!   samples of each axis; the sign of the latitude step decides orientation.

use geo_common::{Crs, RasterDimension};
use tracing::{debug, warn};

use crate::attributes::{names, AttributeMap, AttributeView};
use crate::convention::ResolvedCoordinates;
use crate::error::MetadataError;
use crate::geocoding::AffineGeocoding;
use crate::orientation::Orientation;
use crate::source::{CoordinateSampleReader, MetadataSource};

/// Offset from a pixel corner to the position its coordinate value refers
/// to, for NetCDF coordinate axes.
pub const NETCDF_PIXEL_CENTER: f64 = 0.5;

/// Parameters of the affine mapping before validation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisParameters {
    easting: f64,
    northing: f64,
    pixel_size_x: f64,
    pixel_size_y: f64,
    reference_x: f64,
    reference_y: f64,
    orientation: Orientation,
}

/// Build an affine WGS84 geocoding from resolved coordinate variables.
///
/// Returns `None` when either pixel size is not strictly positive or when
/// the coordinate samples cannot be read.
pub fn build_affine_geocoding<S: MetadataSource + ?Sized>(
    source: &S,
    coordinates: &ResolvedCoordinates,
    dimension: RasterDimension,
) -> Option<(AffineGeocoding, Orientation)> {
    let lon_attrs = source.attributes(&coordinates.lon).unwrap_or_default();
    let lat_attrs = source.attributes(&coordinates.lat).unwrap_or_default();

    let params = match bounds_parameters(&lon_attrs, &lat_attrs, dimension) {
        Some(params) => params,
        None => match sample_parameters(source, coordinates) {
            Ok(params) => params,
            Err(e) => {
                warn!(
                    lon = %coordinates.lon,
                    lat = %coordinates.lat,
                    error = %e,
                    "Failed to read coordinate samples"
                );
                return None;
            }
        },
    };

    if !(params.pixel_size_x > 0.0 && params.pixel_size_y > 0.0) {
        debug!(
            pixel_size_x = params.pixel_size_x,
            pixel_size_y = params.pixel_size_y,
            "Rejecting affine geocoding with non-positive pixel size"
        );
        return None;
    }

    let geocoding = AffineGeocoding::from_reference_pixel(
        Crs::wgs84(),
        dimension,
        params.easting,
        params.northing,
        params.pixel_size_x,
        params.pixel_size_y,
        params.reference_x,
        params.reference_y,
        params.orientation,
    )?;

    debug!(
        convention = %coordinates.convention,
        pixel_size_x = params.pixel_size_x,
        pixel_size_y = params.pixel_size_y,
        orientation = %params.orientation,
        "Built affine geocoding"
    );
    Some((geocoding, params.orientation))
}

fn bounds_parameters(
    lon: &AttributeMap,
    lat: &AttributeMap,
    dimension: RasterDimension,
) -> Option<AxisParameters> {
    let lon_min = lon.numeric(names::VALID_MIN)?;
    let lon_max = lon.numeric(names::VALID_MAX)?;
    let lat_min = lat.numeric(names::VALID_MIN)?;
    let lat_max = lat.numeric(names::VALID_MAX)?;

    Some(AxisParameters {
        easting: lon_min,
        northing: lat_min,
        pixel_size_x: (lon_max - lon_min) / dimension.width as f64,
        pixel_size_y: (lat_max - lat_min) / dimension.height as f64,
        reference_x: NETCDF_PIXEL_CENTER,
        reference_y: dimension.height as f64 - NETCDF_PIXEL_CENTER,
        orientation: Orientation::Flipped,
    })
}

fn sample_parameters<S: MetadataSource + ?Sized>(
    source: &S,
    coordinates: &ResolvedCoordinates,
) -> Result<AxisParameters, MetadataError> {
    let reader = CoordinateSampleReader::new(source);
    let (lon0, lon1) = reader.leading_pair(&coordinates.lon)?;
    let (lat0, lat1) = reader.leading_pair(&coordinates.lat)?;

    let lat_step = lat1 - lat0;
    let orientation = Orientation::from_latitude_step(lat_step);
    let (pixel_size_y, northing) = match orientation {
        Orientation::Natural => (-lat_step, lat0),
        Orientation::Flipped => (lat_step, reader.last(&coordinates.lat)?),
    };

    Ok(AxisParameters {
        easting: lon0,
        northing,
        pixel_size_x: lon1 - lon0,
        pixel_size_y,
        reference_x: NETCDF_PIXEL_CENTER,
        reference_y: NETCDF_PIXEL_CENTER,
        orientation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention::Convention;
    use crate::memory::MemoryMetadata;
    use geo_common::PixelPos;

    fn cf() -> ResolvedCoordinates {
        ResolvedCoordinates {
            convention: Convention::Cf,
            lon: "lon".to_string(),
            lat: "lat".to_string(),
        }
    }

    fn sampled(lon: Vec<f64>, lat: Vec<f64>) -> (MemoryMetadata, RasterDimension) {
        let dimension = RasterDimension::new(lon.len(), lat.len());
        let mut source = MemoryMetadata::new();
        source.add_axis("lon", lon);
        source.add_axis("lat", lat);
        (source, dimension)
    }

    fn bounded(lon: (f64, f64), lat: (f64, f64), dimension: RasterDimension) -> MemoryMetadata {
        let mut source = MemoryMetadata::new();
        source.add_axis_header(
            "lon",
            dimension.width,
            AttributeMap::new()
                .with(names::VALID_MIN, lon.0)
                .with(names::VALID_MAX, lon.1),
        );
        source.add_axis_header(
            "lat",
            dimension.height,
            AttributeMap::new()
                .with(names::VALID_MIN, lat.0)
                .with(names::VALID_MAX, lat.1),
        );
        source
    }

    #[test]
    fn test_decreasing_latitude_is_natural() {
        let (source, dim) = sampled(vec![0.0, 0.5, 1.0], vec![10.0, 9.5, 9.0, 8.5]);
        let (g, orientation) = build_affine_geocoding(&source, &cf(), dim).unwrap();
        assert_eq!(orientation, Orientation::Natural);
        assert_eq!(g.northing(), 10.0);
        assert_eq!(g.pixel_size_y(), 0.5);
        assert_eq!(g.reference_pixel(), PixelPos::new(0.5, 0.5));
    }

    #[test]
    fn test_increasing_latitude_is_flipped() {
        let (source, dim) = sampled(vec![0.0, 0.5, 1.0], vec![9.5, 10.0, 10.5, 11.0]);
        let (g, orientation) = build_affine_geocoding(&source, &cf(), dim).unwrap();
        assert_eq!(orientation, Orientation::Flipped);
        assert_eq!(g.orientation(), Orientation::Flipped);
        assert_eq!(g.northing(), 11.0);
        assert_eq!(g.pixel_size_y(), 0.5);
    }

    #[test]
    fn test_bounds_branch_pixel_sizes() {
        let dim = RasterDimension::new(100, 50);
        let source = bounded((0.0, 10.0), (0.0, 50.0), dim);
        let (g, orientation) = build_affine_geocoding(&source, &cf(), dim).unwrap();
        assert_eq!(g.pixel_size_x(), 0.1);
        assert_eq!(g.pixel_size_y(), 1.0);
        assert_eq!(orientation, Orientation::Flipped);
        assert_eq!(g.reference_pixel(), PixelPos::new(0.5, 49.5));
        assert_eq!((g.easting(), g.northing()), (0.0, 0.0));
    }

    #[test]
    fn test_bounds_take_precedence_over_samples() {
        let (mut source, dim) = sampled(vec![0.0, 1.0], vec![5.0, 4.0]);
        source.set_attribute("lon", names::VALID_MIN, 0.0);
        source.set_attribute("lon", names::VALID_MAX, 4.0);
        source.set_attribute("lat", names::VALID_MIN, 0.0);
        source.set_attribute("lat", names::VALID_MAX, 8.0);
        let (g, orientation) = build_affine_geocoding(&source, &cf(), dim).unwrap();
        assert_eq!(g.pixel_size_x(), 2.0);
        assert_eq!(g.pixel_size_y(), 4.0);
        assert_eq!(orientation, Orientation::Flipped);
    }

    #[test]
    fn test_partial_bounds_use_samples() {
        let (mut source, dim) = sampled(vec![0.0, 1.0], vec![5.0, 4.0]);
        source.set_attribute("lon", names::VALID_MIN, 0.0);
        source.set_attribute("lon", names::VALID_MAX, 4.0);
        let (g, orientation) = build_affine_geocoding(&source, &cf(), dim).unwrap();
        assert_eq!(g.pixel_size_x(), 1.0);
        assert_eq!(orientation, Orientation::Natural);
    }

    #[test]
    fn test_degenerate_inputs_rejected() {
        let dim = RasterDimension::new(10, 10);
        // equal bounds
        assert!(build_affine_geocoding(&bounded((1.0, 1.0), (0.0, 5.0), dim), &cf(), dim).is_none());
        // inverted bounds
        assert!(build_affine_geocoding(&bounded((0.0, 5.0), (5.0, 0.0), dim), &cf(), dim).is_none());

        // equal consecutive samples
        let (source, dim) = sampled(vec![1.0, 1.0], vec![5.0, 4.0]);
        assert!(build_affine_geocoding(&source, &cf(), dim).is_none());
        let (source, dim) = sampled(vec![0.0, 1.0], vec![5.0, 5.0]);
        assert!(build_affine_geocoding(&source, &cf(), dim).is_none());

        // decreasing longitude
        let (source, dim) = sampled(vec![1.0, 0.0], vec![5.0, 4.0]);
        assert!(build_affine_geocoding(&source, &cf(), dim).is_none());
    }

    #[test]
    fn test_unreadable_samples_rejected() {
        let mut source = MemoryMetadata::new();
        source.add_axis_header("lon", 4, AttributeMap::new());
        source.add_axis_header("lat", 3, AttributeMap::new());
        assert!(build_affine_geocoding(&source, &cf(), RasterDimension::new(4, 3)).is_none());
    }
}
