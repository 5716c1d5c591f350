//! Coordinate output for a known geocoding.
//!
//! A geographic WGS84 affine geocoding is declared as two 1-D axes carrying
//! their valid range. Every other geocoding is declared as full 2-D latitude
//! and longitude fields next to Cartesian `y`/`x` axes, and populated by
//! sampling pixel centres row by row.

use geo_common::{BoundingBox, GeoPos, PixelPos, RasterDimension};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::attributes::{names, AttributeMap};
use crate::config::GeocodingConfig;
use crate::error::{GeocodingError, Result};
use crate::geocoding::{AffineGeocoding, Geocoding};
use crate::orientation::Orientation;
use crate::storage::{FieldDeclaration, FieldDimension, FieldKind, StorageWriter};

/// The fields to declare for a geocoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum DeclarationPlan {
    /// 1-D `lat(lat)` and `lon(lon)` axes with valid ranges. Nothing is
    /// sampled.
    CoordinateAxes {
        lat: FieldDeclaration,
        lon: FieldDeclaration,
    },
    /// 2-D `lat(y, x)` and `lon(y, x)` fields populated by sampling, plus
    /// declared-only `y` and `x` axes.
    LatLonGrids {
        y: FieldDeclaration,
        x: FieldDeclaration,
        lat: FieldDeclaration,
        lon: FieldDeclaration,
    },
}

impl DeclarationPlan {
    /// Fields in declaration order.
    pub fn fields(&self) -> Vec<&FieldDeclaration> {
        match self {
            DeclarationPlan::CoordinateAxes { lat, lon } => vec![lat, lon],
            DeclarationPlan::LatLonGrids { y, x, lat, lon } => vec![y, x, lat, lon],
        }
    }

    pub fn lat(&self) -> &FieldDeclaration {
        match self {
            DeclarationPlan::CoordinateAxes { lat, .. }
            | DeclarationPlan::LatLonGrids { lat, .. } => lat,
        }
    }

    pub fn lon(&self) -> &FieldDeclaration {
        match self {
            DeclarationPlan::CoordinateAxes { lon, .. }
            | DeclarationPlan::LatLonGrids { lon, .. } => lon,
        }
    }

    /// True if the fields must be populated row by row.
    pub fn needs_sampling(&self) -> bool {
        matches!(self, DeclarationPlan::LatLonGrids { .. })
    }

    /// Row order recorded for written products: south to north.
    pub fn output_orientation(&self) -> Orientation {
        Orientation::Flipped
    }
}

/// Choose the declaration strategy for `geocoding`.
pub fn plan_geocoding_output(geocoding: &Geocoding, dimension: RasterDimension) -> DeclarationPlan {
    let plan = match geocoding {
        Geocoding::Affine(affine) if affine.is_geographic_wgs84() => coordinate_axes(affine, dimension),
        _ => None,
    }
    .unwrap_or_else(|| lat_lon_grids(dimension));

    let strategy = if plan.needs_sampling() {
        "lat_lon_grids"
    } else {
        "coordinate_axes"
    };
    debug!(
        strategy,
        dimension = %dimension,
        "Planned geocoding output"
    );
    plan
}

fn coordinate_axes(geocoding: &AffineGeocoding, dimension: RasterDimension) -> Option<DeclarationPlan> {
    let RasterDimension { width, height } = dimension;
    let ul = geocoding.pixel_to_geo(PixelPos::new(0.5, 0.5))?;
    let br = geocoding.pixel_to_geo(PixelPos::new(width as f64 - 0.5, height as f64 - 0.5))?;
    let bounds = BoundingBox::from_corners((ul.lon, ul.lat), (br.lon, br.lat));

    let lat = FieldDeclaration::new(
        names::LAT,
        FieldKind::Float32,
        vec![FieldDimension::new(names::LAT, height)],
    )
    .with_attributes(
        latitude_attributes()
            .with(names::VALID_MIN, bounds.min_y)
            .with(names::VALID_MAX, bounds.max_y),
    );
    let lon = FieldDeclaration::new(
        names::LON,
        FieldKind::Float32,
        vec![FieldDimension::new(names::LON, width)],
    )
    .with_attributes(
        longitude_attributes()
            .with(names::VALID_MIN, bounds.min_x)
            .with(names::VALID_MAX, bounds.max_x),
    );
    Some(DeclarationPlan::CoordinateAxes { lat, lon })
}

fn lat_lon_grids(dimension: RasterDimension) -> DeclarationPlan {
    let y_dim = FieldDimension::new(names::Y, dimension.height);
    let x_dim = FieldDimension::new(names::X, dimension.width);
    let grid = vec![y_dim.clone(), x_dim.clone()];

    DeclarationPlan::LatLonGrids {
        y: FieldDeclaration::new(names::Y, FieldKind::Float32, vec![y_dim]).with_attributes(
            AttributeMap::new()
                .with(names::AXIS, "y")
                .with(names::LONG_NAME, "y-coordinate in Cartesian system")
                .with(names::UNITS, "m"),
        ),
        x: FieldDeclaration::new(names::X, FieldKind::Float32, vec![x_dim]).with_attributes(
            AttributeMap::new()
                .with(names::AXIS, "x")
                .with(names::LONG_NAME, "x-coordinate in Cartesian system")
                .with(names::UNITS, "m"),
        ),
        lat: FieldDeclaration::new(names::LAT, FieldKind::Float32, grid.clone())
            .with_attributes(latitude_attributes()),
        lon: FieldDeclaration::new(names::LON, FieldKind::Float32, grid)
            .with_attributes(longitude_attributes()),
    }
}

fn latitude_attributes() -> AttributeMap {
    AttributeMap::new()
        .with(names::UNITS, "degrees_north")
        .with(names::LONG_NAME, "latitude coordinate")
        .with(names::STANDARD_NAME, "latitude")
}

fn longitude_attributes() -> AttributeMap {
    AttributeMap::new()
        .with(names::UNITS, "degrees_east")
        .with(names::LONG_NAME, "longitude coordinate")
        .with(names::STANDARD_NAME, "longitude")
}

/// One sampled raster row and where it lands in storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledRow {
    pub physical_row: usize,
    pub lat: Vec<f32>,
    pub lon: Vec<f32>,
}

/// Declares and populates coordinate fields for one geocoding.
pub struct GeocodingWriter<'a> {
    geocoding: &'a Geocoding,
    dimension: RasterDimension,
    orientation: Orientation,
    plan: DeclarationPlan,
    config: GeocodingConfig,
}

impl<'a> GeocodingWriter<'a> {
    /// `orientation` decides where each raster row is stored; pass the
    /// plan's [`DeclarationPlan::output_orientation`] for a new product, or
    /// the orientation inference returned when rewriting a read product.
    pub fn new(
        geocoding: &'a Geocoding,
        dimension: RasterDimension,
        orientation: Orientation,
        config: GeocodingConfig,
    ) -> Result<Self> {
        let config = config.validated()?;
        if geocoding.dimension() != dimension {
            return Err(GeocodingError::DimensionMismatch {
                expected: geocoding.dimension().to_string(),
                actual: dimension.to_string(),
            });
        }
        Ok(Self {
            geocoding,
            dimension,
            orientation,
            plan: plan_geocoding_output(geocoding, dimension),
            config,
        })
    }

    pub fn plan(&self) -> &DeclarationPlan {
        &self.plan
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Declare every planned field.
    pub fn declare<W: StorageWriter + ?Sized>(&self, storage: &mut W) -> Result<()> {
        for field in self.plan.fields() {
            storage
                .declare_field(field)
                .map_err(GeocodingError::declaration_failed)?;
        }
        Ok(())
    }

    /// Sample raster row `y` at pixel centres. Positions the geocoding
    /// cannot resolve are NaN. Rows outside the raster are rejected.
    pub fn sample_row(&self, y: usize) -> Result<SampledRow> {
        let height = self.dimension.height;
        let physical_row = self
            .orientation
            .physical_row(y, height)
            .ok_or(GeocodingError::RowOutOfRange { row: y, height })?;
        let width = self.dimension.width;
        let mut lat = Vec::with_capacity(width);
        let mut lon = Vec::with_capacity(width);
        for x in 0..width {
            let pos = self
                .geocoding
                .pixel_to_geo(PixelPos::center(x, y))
                .unwrap_or_else(GeoPos::invalid);
            lat.push(pos.lat as f32);
            lon.push(pos.lon as f32);
        }
        Ok(SampledRow {
            physical_row,
            lat,
            lon,
        })
    }

    /// Populate the planned 2-D fields. A no-op for 1-D axis plans.
    ///
    /// Rows are sampled in batches, in parallel when configured, and each
    /// row is written once at its physical index. The first storage fault
    /// aborts the write.
    pub fn write<W: StorageWriter + ?Sized>(&self, storage: &mut W) -> Result<()> {
        if !self.plan.needs_sampling() {
            return Ok(());
        }
        let height = self.dimension.height;
        let lat_name = &self.plan.lat().name;
        let lon_name = &self.plan.lon().name;

        info!(
            dimension = %self.dimension,
            orientation = %self.orientation,
            parallel = self.config.parallel_sampling,
            "Writing geocoding rows"
        );

        let mut start = 0;
        while start < height {
            let end = (start + self.config.rows_per_batch).min(height);
            let rows: Vec<SampledRow> = if self.config.parallel_sampling {
                (start..end)
                    .into_par_iter()
                    .map(|y| self.sample_row(y))
                    .collect::<Result<_>>()?
            } else {
                (start..end)
                    .map(|y| self.sample_row(y))
                    .collect::<Result<_>>()?
            };

            for row in rows {
                storage
                    .write_row(lat_name, [row.physical_row, 0], &row.lat)
                    .map_err(GeocodingError::out_of_range)?;
                storage
                    .write_row(lon_name, [row.physical_row, 0], &row.lon)
                    .map_err(GeocodingError::out_of_range)?;
            }
            start = end;
        }

        info!(rows = height, "Finished writing geocoding rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeView;
    use crate::error::StorageError;
    use crate::storage::MemoryStorage;
    use geo_common::{Crs, CrsCode};

    fn affine(crs: Crs, dimension: RasterDimension) -> Geocoding {
        AffineGeocoding::from_reference_pixel(
            crs,
            dimension,
            4.0,
            50.0,
            0.5,
            1.0,
            0.5,
            0.5,
            Orientation::Natural,
        )
        .unwrap()
        .into()
    }

    #[test]
    fn test_wgs84_affine_declares_axes() {
        let dim = RasterDimension::new(4, 3);
        let plan = plan_geocoding_output(&affine(Crs::wgs84(), dim), dim);
        assert!(!plan.needs_sampling());
        assert_eq!(plan.lat().shape(), vec![3]);
        assert_eq!(plan.lon().shape(), vec![4]);
        assert_eq!(plan.lat().attributes.numeric(names::VALID_MAX), Some(50.0));
        assert_eq!(plan.lat().attributes.numeric(names::VALID_MIN), Some(48.0));
        assert_eq!(plan.lon().attributes.numeric(names::VALID_MIN), Some(4.0));
        assert_eq!(plan.lon().attributes.numeric(names::VALID_MAX), Some(5.5));
        assert_eq!(plan.lat().attributes.string(names::UNITS), Some("degrees_north"));
    }

    #[test]
    fn test_other_crs_declares_grids() {
        let dim = RasterDimension::new(4, 3);
        let plan = plan_geocoding_output(&affine(Crs::new(CrsCode::Epsg4269), dim), dim);
        assert!(plan.needs_sampling());
        let declared: Vec<&str> = plan.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(declared, vec!["y", "x", "lat", "lon"]);
        assert_eq!(plan.lat().shape(), vec![3, 4]);
        assert!(!plan.lat().attributes.contains(names::VALID_MIN));
        assert_eq!(plan.output_orientation(), Orientation::Flipped);
    }

    #[test]
    fn test_axes_plan_writes_nothing() {
        let dim = RasterDimension::new(4, 3);
        let geocoding = affine(Crs::wgs84(), dim);
        let writer =
            GeocodingWriter::new(&geocoding, dim, Orientation::Flipped, GeocodingConfig::default())
                .unwrap();
        let mut storage = MemoryStorage::new();
        writer.declare(&mut storage).unwrap();
        writer.write(&mut storage).unwrap();
        assert_eq!(storage.field_names(), &["lat".to_string(), "lon".to_string()]);
        assert!(storage.writes().is_empty());
    }

    #[test]
    fn test_sample_row_natural() {
        let dim = RasterDimension::new(4, 3);
        let geocoding = affine(Crs::new(CrsCode::Epsg4269), dim);
        let writer =
            GeocodingWriter::new(&geocoding, dim, Orientation::Natural, GeocodingConfig::default())
                .unwrap();
        let row = writer.sample_row(1).unwrap();
        assert_eq!(row.physical_row, 1);
        assert_eq!(row.lat, vec![49.0; 4]);
        assert_eq!(row.lon, vec![4.0, 4.5, 5.0, 5.5]);
    }

    #[test]
    fn test_sample_row_past_last_row() {
        let dim = RasterDimension::new(4, 3);
        let geocoding = affine(Crs::new(CrsCode::Epsg4269), dim);
        let writer =
            GeocodingWriter::new(&geocoding, dim, Orientation::Flipped, GeocodingConfig::default())
                .unwrap();
        assert!(writer.sample_row(2).is_ok());
        assert!(matches!(
            writer.sample_row(3),
            Err(GeocodingError::RowOutOfRange { row: 3, height: 3 })
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let geocoding = affine(Crs::wgs84(), RasterDimension::new(4, 3));
        assert!(matches!(
            GeocodingWriter::new(
                &geocoding,
                RasterDimension::new(3, 4),
                Orientation::Natural,
                GeocodingConfig::default()
            ),
            Err(GeocodingError::DimensionMismatch { .. })
        ));
    }

    struct FailingStorage;

    impl StorageWriter for FailingStorage {
        fn declare_field(&mut self, _field: &FieldDeclaration) -> std::result::Result<(), StorageError> {
            Ok(())
        }

        fn write_row(
            &mut self,
            name: &str,
            origin: [usize; 2],
            _data: &[f32],
        ) -> std::result::Result<(), StorageError> {
            Err(StorageError::RowOutOfRange {
                field: name.to_string(),
                row: origin[0],
                rows: 0,
            })
        }
    }

    #[test]
    fn test_storage_fault_wrapped() {
        let dim = RasterDimension::new(2, 2);
        let geocoding = affine(Crs::new(CrsCode::Epsg4269), dim);
        let writer =
            GeocodingWriter::new(&geocoding, dim, Orientation::Natural, GeocodingConfig::default())
                .unwrap();
        let err = writer.write(&mut FailingStorage).unwrap_err();
        match err {
            GeocodingError::Storage { message, source } => {
                assert_eq!(message, "Data not in the expected range");
                assert!(matches!(source, StorageError::RowOutOfRange { .. }));
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
