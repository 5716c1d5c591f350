//! The metadata source consumed by the read path, and the sample reader
//! used to derive axis steps from stored coordinate values.

use crate::attributes::AttributeMap;
use crate::error::MetadataError;

/// Name-keyed access to a product's variables: their shapes, attributes and
/// leading data values.
///
/// Implemented over parsed CDL text, native NetCDF files and in-memory
/// fixtures.
pub trait MetadataSource {
    /// True if a variable called `name` exists.
    fn has_variable(&self, name: &str) -> bool;

    /// Dimension lengths of `name`, slowest-varying first.
    fn shape(&self, name: &str) -> Option<Vec<usize>>;

    /// All attributes of `name`.
    fn attributes(&self, name: &str) -> Option<AttributeMap>;

    /// The first `count` values of `name` in storage order.
    fn read_samples(&self, name: &str, count: usize) -> Result<Vec<f64>, MetadataError>;
}

impl<T: MetadataSource + ?Sized> MetadataSource for &T {
    fn has_variable(&self, name: &str) -> bool {
        (**self).has_variable(name)
    }

    fn shape(&self, name: &str) -> Option<Vec<usize>> {
        (**self).shape(name)
    }

    fn attributes(&self, name: &str) -> Option<AttributeMap> {
        (**self).attributes(name)
    }

    fn read_samples(&self, name: &str, count: usize) -> Result<Vec<f64>, MetadataError> {
        (**self).read_samples(name, count)
    }
}

/// Reads stored coordinate samples of a variable.
pub struct CoordinateSampleReader<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: MetadataSource + ?Sized> CoordinateSampleReader<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// The first two stored samples of `name`.
    pub fn leading_pair(&self, name: &str) -> Result<(f64, f64), MetadataError> {
        let samples = self.source.read_samples(name, 2)?;
        match samples.as_slice() {
            [first, second, ..] => Ok((*first, *second)),
            _ => Err(MetadataError::ShortRead {
                variable: name.to_string(),
                requested: 2,
                available: samples.len(),
            }),
        }
    }

    /// Difference between the second and the first stored sample, sign kept.
    pub fn step(&self, name: &str) -> Result<f64, MetadataError> {
        let (first, second) = self.leading_pair(name)?;
        Ok(second - first)
    }

    /// The last stored sample of `name`.
    pub fn last(&self, name: &str) -> Result<f64, MetadataError> {
        let len: usize = self
            .source
            .shape(name)
            .ok_or_else(|| MetadataError::UnknownVariable(name.to_string()))?
            .iter()
            .product();
        let samples = self.source.read_samples(name, len)?;
        samples.last().copied().ok_or_else(|| MetadataError::ShortRead {
            variable: name.to_string(),
            requested: len,
            available: 0,
        })
    }
}
