//! In-memory metadata source, used by tests and by callers that assemble
//! metadata from a non-file origin.

use std::collections::HashMap;

use crate::attributes::{AttributeMap, AttributeValue};
use crate::error::MetadataError;
use crate::source::MetadataSource;

#[derive(Debug, Clone, Default)]
struct MemoryVariable {
    shape: Vec<usize>,
    attributes: AttributeMap,
    data: Vec<f64>,
}

/// Variables with shapes, attributes and data held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadata {
    variables: HashMap<String, MemoryVariable>,
}

impl MemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable. `data` may be shorter than the shape (or empty) to
    /// model header-only metadata.
    pub fn add_variable(
        &mut self,
        name: &str,
        shape: Vec<usize>,
        attributes: AttributeMap,
        data: Vec<f64>,
    ) {
        self.variables.insert(
            name.to_string(),
            MemoryVariable {
                shape,
                attributes,
                data,
            },
        );
    }

    /// Add a 1-D coordinate axis whose length is the number of samples.
    pub fn add_axis(&mut self, name: &str, samples: Vec<f64>) {
        self.add_variable(name, vec![samples.len()], AttributeMap::new(), samples);
    }

    /// Add a 1-D axis of `len` elements that carries attributes but no data.
    pub fn add_axis_header(&mut self, name: &str, len: usize, attributes: AttributeMap) {
        self.add_variable(name, vec![len], attributes, Vec::new());
    }

    /// Set one attribute on an existing variable. Unknown variables are ignored.
    pub fn set_attribute(&mut self, variable: &str, name: &str, value: impl Into<AttributeValue>) {
        if let Some(var) = self.variables.get_mut(variable) {
            var.attributes.insert(name, value);
        }
    }
}

impl MetadataSource for MemoryMetadata {
    fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    fn shape(&self, name: &str) -> Option<Vec<usize>> {
        self.variables.get(name).map(|v| v.shape.clone())
    }

    fn attributes(&self, name: &str) -> Option<AttributeMap> {
        self.variables.get(name).map(|v| v.attributes.clone())
    }

    fn read_samples(&self, name: &str, count: usize) -> Result<Vec<f64>, MetadataError> {
        let var = self
            .variables
            .get(name)
            .ok_or_else(|| MetadataError::UnknownVariable(name.to_string()))?;
        if var.data.len() < count {
            return Err(MetadataError::ShortRead {
                variable: name.to_string(),
                requested: count,
                available: var.data.len(),
            });
        }
        Ok(var.data[..count].to_vec())
    }
}
