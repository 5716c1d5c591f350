//! The storage collaborator the coordinate writer emits through.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeMap;
use crate::error::StorageError;

/// Element type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Float32,
}

impl FieldKind {
    /// CDL type keyword.
    pub fn cdl_name(&self) -> &'static str {
        match self {
            FieldKind::Float32 => "float",
        }
    }
}

/// A named dimension of a declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDimension {
    pub name: String,
    pub len: usize,
}

impl FieldDimension {
    pub fn new(name: &str, len: usize) -> Self {
        Self {
            name: name.to_string(),
            len,
        }
    }
}

/// Declaration of one output field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    pub kind: FieldKind,
    /// Slowest-varying first.
    pub dimensions: Vec<FieldDimension>,
    pub attributes: AttributeMap,
}

impl FieldDeclaration {
    pub fn new(name: &str, kind: FieldKind, dimensions: Vec<FieldDimension>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            dimensions,
            attributes: AttributeMap::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: AttributeMap) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.len).collect()
    }

    /// Number of rows and values per row. A 1-D field is a single row.
    pub fn rows_and_columns(&self) -> (usize, usize) {
        match self.dimensions.as_slice() {
            [] => (1, 1),
            [only] => (1, only.len),
            [.., rows, cols] => (rows.len, cols.len),
        }
    }
}

/// Field declaration and row-wise output.
pub trait StorageWriter {
    fn declare_field(&mut self, field: &FieldDeclaration) -> Result<(), StorageError>;

    /// Write `data` into `name` starting at `origin` = `[row, column]`.
    fn write_row(&mut self, name: &str, origin: [usize; 2], data: &[f32])
        -> Result<(), StorageError>;
}

impl<W: StorageWriter + ?Sized> StorageWriter for &mut W {
    fn declare_field(&mut self, field: &FieldDeclaration) -> Result<(), StorageError> {
        (**self).declare_field(field)
    }

    fn write_row(
        &mut self,
        name: &str,
        origin: [usize; 2],
        data: &[f32],
    ) -> Result<(), StorageError> {
        (**self).write_row(name, origin, data)
    }
}

/// Check a row write against a declaration and return the flat offset.
pub fn row_offset(
    field: &FieldDeclaration,
    origin: [usize; 2],
    len: usize,
) -> Result<usize, StorageError> {
    let (rows, cols) = field.rows_and_columns();
    let [row, col] = origin;
    if row >= rows {
        return Err(StorageError::RowOutOfRange {
            field: field.name.clone(),
            row,
            rows,
        });
    }
    if col + len > cols {
        return Err(StorageError::ShapeMismatch {
            field: field.name.clone(),
            expected: cols.saturating_sub(col),
            actual: len,
        });
    }
    Ok(row * cols + col)
}

#[derive(Debug, Clone)]
struct MemoryField {
    declaration: FieldDeclaration,
    data: Vec<f32>,
}

/// Storage that keeps declared fields in memory and records the order of
/// row writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    fields: HashMap<String, MemoryField>,
    order: Vec<String>,
    writes: Vec<(String, usize)>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declaration(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.get(name).map(|f| &f.declaration)
    }

    /// Declared field names in declaration order.
    pub fn field_names(&self) -> &[String] {
        &self.order
    }

    /// Field values, NaN where never written.
    pub fn data(&self, name: &str) -> Option<&[f32]> {
        self.fields.get(name).map(|f| f.data.as_slice())
    }

    pub fn row(&self, name: &str, row: usize) -> Option<&[f32]> {
        let field = self.fields.get(name)?;
        let (rows, cols) = field.declaration.rows_and_columns();
        (row < rows).then(|| &field.data[row * cols..(row + 1) * cols])
    }

    /// `(field, row)` of every write, in the order received.
    pub fn writes(&self) -> &[(String, usize)] {
        &self.writes
    }
}

impl StorageWriter for MemoryStorage {
    fn declare_field(&mut self, field: &FieldDeclaration) -> Result<(), StorageError> {
        if self.fields.contains_key(&field.name) {
            return Err(StorageError::DuplicateField(field.name.clone()));
        }
        let len = field.shape().iter().product();
        self.fields.insert(
            field.name.clone(),
            MemoryField {
                declaration: field.clone(),
                data: vec![f32::NAN; len],
            },
        );
        self.order.push(field.name.clone());
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
            .get_mut(name)
            .ok_or_else(|| StorageError::UnknownField(name.to_string()))?;
        let offset = row_offset(&field.declaration, origin, data.len())?;
        field.data[offset..offset + data.len()].copy_from_slice(data);
        self.writes.push((name.to_string(), origin[0]));
        Ok(())
    }
}
