//! Typed, read-only access to named metadata fields.
//!
//! An [`AttributeView`] answers "what is field X" with `None` when the field
//! is missing or has the wrong type; it never substitutes a default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute and variable names shared by the CF/COARDS readers and writer.
pub mod names {
    /// CF longitude variable / band
    pub const LON: &str = "lon";
    /// CF latitude variable / band
    pub const LAT: &str = "lat";
    /// COARDS longitude variable / band
    pub const LONGITUDE: &str = "longitude";
    /// COARDS latitude variable / band
    pub const LATITUDE: &str = "latitude";
    /// Cartesian x axis declared next to dense lat/lon fields
    pub const X: &str = "x";
    /// Cartesian y axis declared next to dense lat/lon fields
    pub const Y: &str = "y";

    pub const VALID_MIN: &str = "valid_min";
    pub const VALID_MAX: &str = "valid_max";
    pub const UNITS: &str = "units";
    pub const LONG_NAME: &str = "long_name";
    pub const STANDARD_NAME: &str = "standard_name";
    pub const AXIS: &str = "axis";
    pub const VALID_PIXEL_EXPRESSION: &str = "valid_pixel_expression";
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Numbers(Vec<f64>),
    Text(String),
}

impl AttributeValue {
    /// Scalar numeric value; a one-element list counts as a scalar.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(v) => Some(*v),
            AttributeValue::Numbers(values) if values.len() == 1 => Some(values[0]),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Number(v)
    }
}

impl From<Vec<f64>> for AttributeValue {
    fn from(v: Vec<f64>) -> Self {
        AttributeValue::Numbers(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

/// Read-only typed lookup of named fields.
pub trait AttributeView {
    /// Numeric value of `name`, or `None` if absent or not numeric.
    fn numeric(&self, name: &str) -> Option<f64>;

    /// String value of `name`, or `None` if absent or not a string.
    fn string(&self, name: &str) -> Option<&str>;

    /// True if `name` is present with any type.
    fn contains(&self, name: &str) -> bool;
}

/// Attributes of one variable, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap {
    entries: BTreeMap<String, AttributeValue>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<AttributeValue>) {
        self.entries.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AttributeView for AttributeMap {
    fn numeric(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttributeValue::as_f64)
    }

    fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttributeValue::as_str)
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
