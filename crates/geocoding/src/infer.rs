//! Geocoding inference for a product read from CF/COARDS metadata.

use serde::Serialize;
use tracing::debug;

use crate::affine::build_affine_geocoding;
use crate::config::GeocodingConfig;
use crate::convention::{resolve_convention, Convention};
use crate::geocoding::Geocoding;
use crate::orientation::Orientation;
use crate::pixel_grid::build_pixel_geocoding;
use crate::product::RasterModel;
use crate::source::MetadataSource;

/// Result of inference: the geocoding together with the row orientation the
/// reader decided on, for any later output step to reuse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferredGeocoding {
    pub geocoding: Geocoding,
    pub orientation: Orientation,
    /// Convention of the coordinate variables; `None` for a pixel grid.
    pub convention: Option<Convention>,
}

/// Infer the geocoding of `raster` from `source`.
///
/// Tries the coordinate variable conventions first and falls back to a
/// dense geocoding from latitude/longitude bands. `None` means the product
/// has no recognisable geocoding.
pub fn infer_geocoding<S, R>(
    source: &S,
    raster: &R,
    config: &GeocodingConfig,
) -> Option<InferredGeocoding>
where
    S: MetadataSource + ?Sized,
    R: RasterModel + ?Sized,
{
    let dimension = raster.dimension();

    if let Some(coordinates) = resolve_convention(source, dimension) {
        if let Some((geocoding, orientation)) =
            build_affine_geocoding(source, &coordinates, dimension)
        {
            return Some(InferredGeocoding {
                geocoding: geocoding.into(),
                orientation,
                convention: Some(coordinates.convention),
            });
        }
    }

    debug!(dimension = %dimension, "Falling back to pixel geocoding");
    let (geocoding, orientation) = build_pixel_geocoding(source, raster, config)?;
    Some(InferredGeocoding {
        geocoding: geocoding.into(),
        orientation,
        convention: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryMetadata;
    use crate::product::{Band, Product};
    use geo_common::RasterDimension;

    #[test]
    fn test_cf_axes_give_affine() {
        let mut source = MemoryMetadata::new();
        source.add_axis("lon", vec![4.0, 4.5]);
        source.add_axis("lat", vec![48.0, 49.0, 50.0]);
        let product = Product::new("p", RasterDimension::new(2, 3));

        let inferred = infer_geocoding(&source, &product, &GeocodingConfig::default()).unwrap();
        assert!(matches!(inferred.geocoding, Geocoding::Affine(_)));
        assert_eq!(inferred.orientation, Orientation::Flipped);
        assert_eq!(inferred.convention, Some(Convention::Cf));
    }

    #[test]
    fn test_two_dimensional_lat_lon_fall_back_to_pixel_grid() {
        let lat = vec![50.0, 50.0, 49.0, 49.0];
        let lon = vec![4.0, 5.0, 4.0, 5.0];
        let mut source = MemoryMetadata::new();
        source.add_variable("lat", vec![2, 2], Default::default(), lat.clone());
        source.add_variable("lon", vec![2, 2], Default::default(), lon.clone());

        let mut product = Product::new("p", RasterDimension::new(2, 2));
        let to_f32 = |v: Vec<f64>| v.into_iter().map(|x| x as f32).collect::<Vec<_>>();
        product.add_band(Band::new("lat", to_f32(lat))).unwrap();
        product.add_band(Band::new("lon", to_f32(lon))).unwrap();

        let inferred = infer_geocoding(&source, &product, &GeocodingConfig::default()).unwrap();
        assert!(matches!(inferred.geocoding, Geocoding::PixelGrid(_)));
        assert_eq!(inferred.convention, None);
    }

    #[test]
    fn test_nothing_recognised() {
        let source = MemoryMetadata::new();
        let product = Product::new("p", RasterDimension::new(2, 2));
        assert!(infer_geocoding(&source, &product, &GeocodingConfig::default()).is_none());
    }
}
