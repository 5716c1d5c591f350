//! A [`StorageWriter`] that collects declared fields in memory and renders
//! them as CDL text, ready for `ncgen`.

use std::collections::HashMap;
use std::path::Path;

use geocoding::storage::row_offset;
use geocoding::{AttributeMap, AttributeValue, FieldDeclaration, StorageError, StorageWriter};
use tracing::{debug, info};

use crate::error::NetCdfResult;

#[derive(Debug, Clone)]
struct CdlField {
    declaration: FieldDeclaration,
    data: Vec<f32>,
    written: bool,
}

/// In-memory CDL output.
///
/// Dimensions are shared by name across fields; redeclaring one with a
/// different length is rejected. Unwritten cells render as fill values.
#[derive(Debug, Clone, Default)]
pub struct CdlWriter {
    name: String,
    dimensions: Vec<(String, usize)>,
    fields: Vec<CdlField>,
    index: HashMap<String, usize>,
    global_attributes: AttributeMap,
}

impl CdlWriter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_global_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.global_attributes.insert(name, value);
        self
    }

    pub fn dimensions(&self) -> &[(String, usize)] {
        &self.dimensions
    }

    /// Current values of a declared field.
    pub fn data(&self, name: &str) -> Option<&[f32]> {
        self.index.get(name).map(|&i| self.fields[i].data.as_slice())
    }

    /// Render the collected fields as CDL. Only fields with at least one
    /// written row appear in the `data:` section.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("netcdf {} {{\n", self.name));

        if !self.dimensions.is_empty() {
            out.push_str("dimensions:\n");
            for (name, len) in &self.dimensions {
                out.push_str(&format!("\t{} = {} ;\n", name, len));
            }
        }

        if !self.fields.is_empty() || !self.global_attributes.is_empty() {
            out.push_str("variables:\n");
        }
        for field in &self.fields {
            let decl = &field.declaration;
            let dims: Vec<&str> = decl.dimensions.iter().map(|d| d.name.as_str()).collect();
            out.push_str(&format!(
                "\t{} {}({}) ;\n",
                decl.kind.cdl_name(),
                decl.name,
                dims.join(", ")
            ));
            for (attr, value) in decl.attributes.iter() {
                out.push_str(&format!("\t\t{}:{} = {} ;\n", decl.name, attr, format_attribute(value)));
            }
        }

        if !self.global_attributes.is_empty() {
            out.push_str("\n// global attributes:\n");
            for (attr, value) in self.global_attributes.iter() {
                out.push_str(&format!("\t\t:{} = {} ;\n", attr, format_attribute(value)));
            }
        }

        let written: Vec<&CdlField> = self.fields.iter().filter(|f| f.written).collect();
        if !written.is_empty() {
            out.push_str("data:\n");
            for field in written {
                let values: Vec<String> = field.data.iter().map(|v| format_data(*v)).collect();
                out.push_str(&format!("\n {} = {} ;\n", field.declaration.name, values.join(", ")));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Write the rendered CDL to `path`.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> NetCdfResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.render())?;
        info!(path = %path.display(), fields = self.fields.len(), "Wrote CDL");
        Ok(())
    }
}

impl StorageWriter for CdlWriter {
    fn declare_field(&mut self, field: &FieldDeclaration) -> Result<(), StorageError> {
        if self.index.contains_key(&field.name) {
            return Err(StorageError::DuplicateField(field.name.clone()));
        }

        let mut new_dimensions = Vec::new();
        for dim in &field.dimensions {
            match self.dimensions.iter().find(|(name, _)| *name == dim.name) {
                Some((_, len)) if *len != dim.len => {
                    return Err(StorageError::ShapeMismatch {
                        field: field.name.clone(),
                        expected: *len,
                        actual: dim.len,
                    });
                }
                Some(_) => {}
                None => new_dimensions.push((dim.name.clone(), dim.len)),
            }
        }
        self.dimensions.extend(new_dimensions);

        let len = field.shape().iter().product();
        debug!(field = %field.name, len, "Declared CDL field");
        self.index.insert(field.name.clone(), self.fields.len());
        self.fields.push(CdlField {
            declaration: field.clone(),
            data: vec![f32::NAN; len],
            written: false,
        });
        Ok(())
    }

    fn write_row(
        &mut self,
        name: &str,
        origin: [usize; 2],
        data: &[f32],
    ) -> Result<(), StorageError> {
        let i = *self
            .index
            .get(name)
            .ok_or_else(|| StorageError::UnknownField(name.to_string()))?;
        let field = &mut self.fields[i];
        let offset = row_offset(&field.declaration, origin, data.len())?;
        field.data[offset..offset + data.len()].copy_from_slice(data);
        field.written = true;
        Ok(())
    }
}

fn format_attribute(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Number(v) => format_double(*v),
        AttributeValue::Numbers(values) => values
            .iter()
            .map(|v| format_double(*v))
            .collect::<Vec<_>>()
            .join(", "),
        AttributeValue::Text(text) => format!("\"{}\"", escape(text)),
    }
}

/// Doubles keep a decimal point so `ncgen` types them as double.
fn format_double(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        let text = if v > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

fn format_data(v: f32) -> String {
    if v.is_nan() {
        "_".to_string()
    } else {
        format!("{}", v)
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
