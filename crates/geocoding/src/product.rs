//! The raster product model consumed and updated by inference.

use geo_common::RasterDimension;
use serde::Serialize;
use tracing::info;

use crate::config::GeocodingConfig;
use crate::error::{GeocodingError, Result};
use crate::geocoding::Geocoding;
use crate::infer::{infer_geocoding, InferredGeocoding};
use crate::orientation::Orientation;
use crate::source::MetadataSource;

/// Read access to a raster product: its extent and named bands.
pub trait RasterModel {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    fn dimension(&self) -> RasterDimension {
        RasterDimension::new(self.width(), self.height())
    }

    /// Band called `name`, if present.
    fn band(&self, name: &str) -> Option<&Band>;

    /// The attached geocoding, if any.
    fn geocoding(&self) -> Option<&Geocoding>;
}

/// A named raster band holding geophysical values in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Band {
    name: String,
    #[serde(skip)]
    data: Vec<f32>,
    valid_pixel_expression: Option<String>,
}

impl Band {
    pub fn new(name: impl Into<String>, data: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            data,
            valid_pixel_expression: None,
        }
    }

    pub fn with_valid_pixel_expression(mut self, expression: impl Into<String>) -> Self {
        self.valid_pixel_expression = Some(expression.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Expression selecting the pixels whose values are meaningful.
    pub fn valid_pixel_expression(&self) -> Option<&str> {
        self.valid_pixel_expression.as_deref()
    }
}

/// An in-memory raster product.
///
/// A geocoding is attached at most once and never replaced. A product for
/// which inference finds nothing keeps no geocoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    name: String,
    dimension: RasterDimension,
    bands: Vec<Band>,
    geocoding: Option<Geocoding>,
    orientation: Option<Orientation>,
}

impl Product {
    pub fn new(name: impl Into<String>, dimension: RasterDimension) -> Self {
        Self {
            name: name.into(),
            dimension,
            bands: Vec::new(),
            geocoding: None,
            orientation: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Add a band. Its data must cover the whole raster.
    pub fn add_band(&mut self, band: Band) -> Result<()> {
        if band.data.len() != self.dimension.len() {
            return Err(GeocodingError::DimensionMismatch {
                expected: format!("{} values", self.dimension.len()),
                actual: format!("{} values in band '{}'", band.data.len(), band.name),
            });
        }
        self.bands.retain(|b| b.name != band.name);
        self.bands.push(band);
        Ok(())
    }

    /// Attach `geocoding` with the row orientation decided for it.
    pub fn set_geocoding(&mut self, geocoding: Geocoding, orientation: Orientation) -> Result<()> {
        if self.geocoding.is_some() {
            return Err(GeocodingError::GeocodingAlreadyAttached);
        }
        if geocoding.dimension() != self.dimension {
            return Err(GeocodingError::DimensionMismatch {
                expected: self.dimension.to_string(),
                actual: geocoding.dimension().to_string(),
            });
        }
        self.geocoding = Some(geocoding);
        self.orientation = Some(orientation);
        Ok(())
    }

    /// Infer a geocoding from `source` and attach it.
    ///
    /// Returns the inference result, or `None` if no convention applied; the
    /// latter leaves the product without a geocoding and is not an error.
    pub fn read_geocoding<S: MetadataSource + ?Sized>(
        &mut self,
        source: &S,
        config: &GeocodingConfig,
    ) -> Result<Option<InferredGeocoding>> {
        if self.geocoding.is_some() {
            return Err(GeocodingError::GeocodingAlreadyAttached);
        }
        let Some(inferred) = infer_geocoding(source, self, config) else {
            info!(product = %self.name, "No geocoding found");
            return Ok(None);
        };
        self.set_geocoding(inferred.geocoding.clone(), inferred.orientation)?;
        info!(
            product = %self.name,
            convention = ?inferred.convention,
            orientation = %inferred.orientation,
            "Attached geocoding"
        );
        Ok(Some(inferred))
    }

    /// Row orientation decided when the geocoding was attached.
    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }
}

impl RasterModel for Product {
    fn width(&self) -> usize {
        self.dimension.width
    }

    fn height(&self) -> usize {
        self.dimension.height
    }

    fn band(&self, name: &str) -> Option<&Band> {
        self.bands.iter().find(|b| b.name == name)
    }

    fn geocoding(&self) -> Option<&Geocoding> {
        self.geocoding.as_ref()
    }
}
