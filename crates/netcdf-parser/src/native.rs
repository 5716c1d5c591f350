//! Direct NetCDF access through libnetcdf, behind the `native` feature.
//!
//! [`NativeSource`] reads coordinate metadata without spawning `ncdump`, and
//! [`NativeWriter`] writes declared coordinate fields into a new file.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Once;

use geo_common::RasterDimension;
use geocoding::storage::row_offset;
use geocoding::{
    axis_dimension, names, AttributeMap, AttributeValue, AttributeView, Band, FieldDeclaration,
    FieldKind, MetadataError, MetadataSource, Product, StorageError, StorageWriter,
};
use tracing::{debug, info};

use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// libhdf5 prints diagnostics for lookups the caller handles itself, such as
/// probing for optional attributes. Safe to call more than once.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 with a null handler only disables automatic
        // error printing.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// A NetCDF file opened for metadata reads.
pub struct NativeSource {
    file: netcdf::File,
    name: String,
}

impl NativeSource {
    pub fn open<P: AsRef<Path>>(path: P) -> NetCdfResult<Self> {
        silence_hdf5_errors();
        let path = path.as_ref();
        let file = netcdf::open(path)
            .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "product".to_string());
        info!(path = %path.display(), "Opened NetCDF file");
        Ok(Self { file, name })
    }

    /// File stem the product is named after.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Largest trailing 2-D extent among the file's variables, else the
    /// extent of the CF or COARDS 1-D axes.
    pub fn raster_dimension(&self) -> Option<RasterDimension> {
        self.file
            .variables()
            .filter_map(|v| match self.shape(&v.name())?.as_slice() {
                [.., height, width] => Some(RasterDimension::new(*width, *height)),
                _ => None,
            })
            .filter(|d| !d.is_empty())
            .fold(None, |best: Option<RasterDimension>, d| match best {
                Some(b) if b.len() >= d.len() => Some(b),
                _ => Some(d),
            })
            .or_else(|| axis_dimension(self))
    }

    /// Product whose bands are the 2-D variables of the raster extent.
    pub fn to_product(&self) -> NetCdfResult<Product> {
        let dimension = self
            .raster_dimension()
            .ok_or_else(|| NetCdfError::MissingData("variable with two dimensions".to_string()))?;
        let mut product = Product::new(&self.name, dimension);

        for var in self.file.variables() {
            let name = var.name();
            if self.shape(&name) != Some(vec![dimension.height, dimension.width]) {
                continue;
            }
            let data: Vec<f32> = var.get_values(..).map_err(|e| {
                NetCdfError::InvalidFormat(format!("Failed to read {}: {}", name, e))
            })?;
            let mut band = Band::new(&name, data);
            if let Some(expr) = read_attributes(&var).string(names::VALID_PIXEL_EXPRESSION) {
                band = band.with_valid_pixel_expression(expr);
            }
            product
                .add_band(band)
                .map_err(|e| NetCdfError::InvalidFormat(e.to_string()))?;
        }
        Ok(product)
    }
}

impl MetadataSource for NativeSource {
    fn has_variable(&self, name: &str) -> bool {
        self.file.variable(name).is_some()
    }

    fn shape(&self, name: &str) -> Option<Vec<usize>> {
        let var = self.file.variable(name)?;
        Some(var.dimensions().iter().map(|d| d.len()).collect())
    }

    fn attributes(&self, name: &str) -> Option<AttributeMap> {
        self.file.variable(name).map(|var| read_attributes(&var))
    }

    fn read_samples(&self, name: &str, count: usize) -> Result<Vec<f64>, MetadataError> {
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| MetadataError::UnknownVariable(name.to_string()))?;
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let available: usize = shape.iter().product();
        if available < count {
            return Err(MetadataError::ShortRead {
                variable: name.to_string(),
                requested: count,
                available,
            });
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        // Read only the leading rows that hold the first `count` values.
        let read = if shape.is_empty() {
            var.get_values(..)
        } else {
            var.get_values(sample_extents(&shape, count))
        };
        let mut values: Vec<f64> = read
            .map_err(|e| MetadataError::Backend(format!("Failed to read {}: {}", name, e)))?;
        values.truncate(count);
        Ok(values)
    }
}

/// Hyperslab covering the first `count` values of a variable in storage order.
fn sample_extents(shape: &[usize], count: usize) -> Vec<std::ops::Range<usize>> {
    let inner = shape.get(1..).unwrap_or(&[]);
    let row_len = inner.iter().product::<usize>().max(1);
    std::iter::once(0..count.div_ceil(row_len))
        .chain(inner.iter().map(|len| 0..*len))
        .collect()
}

/// A new NetCDF file receiving declared coordinate fields.
pub struct NativeWriter {
    file: netcdf::FileMut,
    fields: HashMap<String, FieldDeclaration>,
}

impl NativeWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> NetCdfResult<Self> {
        silence_hdf5_errors();
        let file = netcdf::create(path.as_ref())
            .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to create NetCDF: {}", e)))?;
        Ok(Self {
            file,
            fields: HashMap::new(),
        })
    }

    /// Flush and close the file.
    pub fn close(self) {
        drop(self.file);
    }
}

impl StorageWriter for NativeWriter {
    fn declare_field(&mut self, field: &FieldDeclaration) -> Result<(), StorageError> {
        if self.fields.contains_key(&field.name) {
            return Err(StorageError::DuplicateField(field.name.clone()));
        }

        for dim in &field.dimensions {
            match self.file.dimension(&dim.name).map(|d| d.len()) {
                Some(len) if len != dim.len => {
                    return Err(StorageError::ShapeMismatch {
                        field: field.name.clone(),
                        expected: len,
                        actual: dim.len,
                    });
                }
                Some(_) => {}
                None => {
                    self.file
                        .add_dimension(&dim.name, dim.len)
                        .map_err(backend)?;
                }
            }
        }

        let dims: Vec<&str> = field.dimensions.iter().map(|d| d.name.as_str()).collect();
        let mut var = match field.kind {
            FieldKind::Float32 => self.file.add_variable::<f32>(&field.name, &dims),
        }
        .map_err(backend)?;

        for (name, value) in field.attributes.iter() {
            match value {
                AttributeValue::Number(v) => var.put_attribute(name, *v),
                AttributeValue::Numbers(v) => var.put_attribute(name, v.clone()),
                AttributeValue::Text(s) => var.put_attribute(name, s.as_str()),
            }
            .map_err(backend)?;
        }

        debug!(field = %field.name, "Declared NetCDF variable");
        self.fields.insert(field.name.clone(), field.clone());
        Ok(())
    }

    fn write_row(
        &mut self,
        name: &str,
        origin: [usize; 2],
        data: &[f32],
    ) -> Result<(), StorageError> {
        let field = self
            .fields
            .get(name)
            .ok_or_else(|| StorageError::UnknownField(name.to_string()))?;
        row_offset(field, origin, data.len())?;
        let rank = field.dimensions.len();

        let mut var = self
            .file
            .variable_mut(name)
            .ok_or_else(|| StorageError::UnknownField(name.to_string()))?;
        let [row, col] = origin;
        let cols = col..col + data.len();

        if rank == 1 {
            var.put_values(data, [cols])
        } else {
            var.put_values(data, [row..row + 1, cols])
        }
        .map_err(backend)
    }
}

fn backend(e: netcdf::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

fn read_attributes(var: &netcdf::Variable) -> AttributeMap {
    let mut map = AttributeMap::new();
    for attr in var.attributes() {
        let Ok(raw) = attr.value() else {
            continue;
        };
        if let Some(value) = convert_attribute(raw) {
            map.insert(attr.name(), value);
        }
    }
    map
}

fn convert_attribute(value: netcdf::AttributeValue) -> Option<AttributeValue> {
    use netcdf::AttributeValue as Nc;

    match value {
        Nc::Str(s) => Some(AttributeValue::Text(s)),
        Nc::Strs(s) => Some(AttributeValue::Text(s.join(", "))),
        Nc::Doubles(v) => Some(AttributeValue::Numbers(v)),
        Nc::Floats(v) => Some(AttributeValue::Numbers(v.into_iter().map(f64::from).collect())),
        Nc::Ints(v) => Some(AttributeValue::Numbers(v.into_iter().map(f64::from).collect())),
        Nc::Shorts(v) => Some(AttributeValue::Numbers(v.into_iter().map(f64::from).collect())),
        other => f64::try_from(other).ok().map(AttributeValue::Number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocoding::FieldDimension;

    #[test]
    fn test_write_then_read_axis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("axis.nc");

        let mut writer = NativeWriter::create(&path).unwrap();
        let field = FieldDeclaration::new(
            "lat",
            FieldKind::Float32,
            vec![FieldDimension::new("lat", 3)],
        )
        .with_attributes(AttributeMap::new().with("units", "degrees_north"));
        writer.declare_field(&field).unwrap();
        writer.write_row("lat", [0, 0], &[50.0, 49.0, 48.0]).unwrap();
        writer.close();

        let source = NativeSource::open(&path).unwrap();
        assert_eq!(source.shape("lat"), Some(vec![3]));
        assert_eq!(
            source.attributes("lat").unwrap().string("units"),
            Some("degrees_north")
        );
        assert_eq!(source.read_samples("lat", 2).unwrap(), vec![50.0, 49.0]);
        assert!(matches!(
            source.read_samples("lat", 4),
            Err(MetadataError::ShortRead { .. })
        ));
    }

    #[test]
    fn test_sample_extents_cover_leading_rows_only() {
        assert_eq!(sample_extents(&[1000], 2), vec![0..2]);
        assert_eq!(sample_extents(&[500, 4], 2), vec![0..1, 0..4]);
        assert_eq!(sample_extents(&[500, 4], 5), vec![0..2, 0..4]);
        assert_eq!(sample_extents(&[10, 3, 4], 13), vec![0..2, 0..3, 0..4]);
    }

    #[test]
    fn test_read_samples_from_large_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.nc");

        let rows = 200;
        let grid = vec![FieldDimension::new("y", rows), FieldDimension::new("x", 3)];
        let mut writer = NativeWriter::create(&path).unwrap();
        writer
            .declare_field(&FieldDeclaration::new("lat", FieldKind::Float32, grid))
            .unwrap();
        for y in 0..rows {
            let v = y as f32;
            writer.write_row("lat", [y, 0], &[v, v + 0.5, v + 0.25]).unwrap();
        }
        writer.close();

        let source = NativeSource::open(&path).unwrap();
        assert_eq!(
            source.read_samples("lat", 4).unwrap(),
            vec![0.0, 0.5, 0.25, 1.0]
        );
        assert!(matches!(
            source.read_samples("lat", rows * 3 + 1),
            Err(MetadataError::ShortRead { available: 600, .. })
        ));
    }
}
