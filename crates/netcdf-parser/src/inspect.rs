//! Geocoding inspection of one input, as reported by `inspect-geocoding`.
//!
//! Inputs whose metadata describe no recognisable geocoding produce an
//! [`Inspection`] without one rather than an error. Only unreadable input
//! fails.

use std::path::Path;

use geo_common::{BoundingBox, RasterDimension};
use geocoding::vendor_header::image_bounds;
use geocoding::{
    build_vendor_geocoding, infer_geocoding, plan_geocoding_output, DeclarationPlan,
    GeocodingConfig, HeaderMap, InferredGeocoding, MetadataSource, Product, RasterModel,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cdl::CdlDocument;
use crate::error::{NetCdfError, NetCdfResult};

/// Name used when a vendor header carries no product id.
pub const DEFAULT_VGT_NAME: &str = "vgt";

/// What inference found for one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub product: String,
    pub dimension: RasterDimension,
    pub inferred: Option<InferredGeocoding>,
}

impl Inspection {
    fn unresolved(product: &str, dimension: RasterDimension) -> Self {
        warn!(product, dimension = %dimension, "No geocoding could be inferred");
        Self {
            product: product.to_string(),
            dimension,
            inferred: None,
        }
    }

    pub fn geographic_bounds(&self) -> Option<BoundingBox> {
        self.inferred
            .as_ref()
            .and_then(|i| i.geocoding.geographic_bounds())
    }

    /// Output fields the geocoding would be written as.
    pub fn output_plan(&self) -> Option<DeclarationPlan> {
        self.inferred
            .as_ref()
            .map(|i| plan_geocoding_output(&i.geocoding, self.dimension))
    }
}

/// Inspect a parsed CDL document.
pub fn inspect_document(doc: &CdlDocument, config: &GeocodingConfig) -> NetCdfResult<Inspection> {
    inspect_source(doc, doc.product_name(), doc.to_product(), config)
}

/// Inspect a NetCDF file opened through libnetcdf.
#[cfg(feature = "native")]
pub fn inspect_native(
    source: &crate::native::NativeSource,
    config: &GeocodingConfig,
) -> NetCdfResult<Inspection> {
    inspect_source(source, source.name(), source.to_product(), config)
}

/// Infer from `source` for `product`. A source without any raster extent
/// is reported with an empty dimension and no geocoding.
fn inspect_source<S: MetadataSource + ?Sized>(
    source: &S,
    name: &str,
    product: NetCdfResult<Product>,
    config: &GeocodingConfig,
) -> NetCdfResult<Inspection> {
    let product = match product {
        Ok(product) => product,
        Err(NetCdfError::MissingData(what)) => {
            debug!(product = name, missing = %what, "No raster extent");
            return Ok(Inspection::unresolved(name, RasterDimension::new(0, 0)));
        }
        Err(e) => return Err(e),
    };

    let dimension = product.dimension();
    match infer_geocoding(source, &product, config) {
        Some(inferred) => Ok(Inspection {
            product: product.name().to_string(),
            dimension,
            inferred: Some(inferred),
        }),
        None => Ok(Inspection::unresolved(product.name(), dimension)),
    }
}

/// Inspect a SPOT VGT log-volume header. An unsupported meridian, datum or
/// unit yields no geocoding, sized from the header's image bounds when
/// those parse.
pub fn inspect_vgt_header(header: &HeaderMap) -> Inspection {
    let name = header.product_id().unwrap_or(DEFAULT_VGT_NAME);

    match build_vendor_geocoding(header) {
        Some(geocoding) => Inspection {
            product: name.to_string(),
            dimension: geocoding.dimension(),
            inferred: Some(InferredGeocoding {
                orientation: geocoding.orientation(),
                geocoding: geocoding.into(),
                convention: None,
            }),
        },
        None => {
            let dimension = image_bounds(header)
                .map(|b| b.dimension())
                .unwrap_or(RasterDimension::new(0, 0));
            Inspection::unresolved(name, dimension)
        }
    }
}

/// Read and parse a vendor header file.
pub fn read_vgt_header<P: AsRef<Path>>(path: P) -> NetCdfResult<HeaderMap> {
    let text = std::fs::read_to_string(path.as_ref())?;
    Ok(HeaderMap::parse(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\
PRODUCT_ID          V2KRNS10__20060721E
MERIDIAN_ORIGIN     0
MAP_PROJ_RESOLUTION 0.5
GEO_UPPER_LEFT_LAT  50.0
GEO_UPPER_LEFT_LONG 4.0
IMAGE_UPPER_LEFT_COL  1
IMAGE_UPPER_LEFT_ROW  1
IMAGE_LOWER_RIGHT_COL 4
IMAGE_LOWER_RIGHT_ROW 3
";

    #[test]
    fn test_vgt_header_geocoded() {
        let inspection = inspect_vgt_header(&HeaderMap::parse(HEADER));
        assert_eq!(inspection.product, "V2KRNS10__20060721E");
        assert_eq!(inspection.dimension, RasterDimension::new(4, 3));
        assert!(inspection.inferred.is_some());
        assert!(inspection.output_plan().is_some());
    }

    #[test]
    fn test_vgt_header_without_name_or_bounds() {
        let inspection = inspect_vgt_header(&HeaderMap::parse("MERIDIAN_ORIGIN 180\n"));
        assert_eq!(inspection.product, DEFAULT_VGT_NAME);
        assert_eq!(inspection.dimension, RasterDimension::new(0, 0));
        assert_eq!(inspection.inferred, None);
        assert_eq!(inspection.geographic_bounds(), None);
    }
}
