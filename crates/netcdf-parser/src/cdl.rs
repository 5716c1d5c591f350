//! CDL documents as printed by `ncdump`.
//!
//! `ncdump -h` prints dimensions, variables and attributes; `ncdump -v a,b`
//! adds a `data:` section holding the values of the listed variables. Both
//! are parsed into a [`CdlDocument`], which serves as a [`MetadataSource`]
//! for geocoding inference.

use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use geo_common::RasterDimension;
use geocoding::{
    axis_dimension, names, AttributeMap, AttributeValue, AttributeView, Band, MetadataError,
    MetadataSource, Product,
};
use tracing::{debug, info};

use crate::error::{NetCdfError, NetCdfResult};

/// Coordinate variables whose values inference needs.
pub const COORDINATE_VARIABLES: [&str; 4] =
    [names::LON, names::LAT, names::LONGITUDE, names::LATITUDE];

const TYPE_KEYWORDS: &[&str] = &[
    "char", "byte", "ubyte", "short", "ushort", "int", "uint", "int64", "uint64", "long", "float",
    "real", "double", "string",
];

/// A declared dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdlDimension {
    pub name: String,
    pub len: usize,
    pub unlimited: bool,
}

/// A declared variable.
#[derive(Debug, Clone, PartialEq)]
pub struct CdlVariable {
    pub name: String,
    pub data_type: String,
    pub dimensions: Vec<String>,
    pub attributes: AttributeMap,
}

/// A parsed CDL document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CdlDocument {
    name: String,
    dimensions: Vec<CdlDimension>,
    variables: Vec<CdlVariable>,
    global_attributes: AttributeMap,
    data: HashMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Dimensions,
    Variables,
    Data,
}

impl CdlDocument {
    /// Parse CDL text.
    ///
    /// The length of an `UNLIMITED` dimension is taken from ncdump's
    /// `// (N currently)` comment, or 0 without one. Fill values (`_`) in the
    /// data section become NaN. Variables with character data keep no values.
    pub fn parse(text: &str) -> NetCdfResult<Self> {
        let mut doc = CdlDocument::default();
        let mut section = Section::Preamble;
        let mut pending = String::new();
        let mut unlimited: HashMap<String, usize> = HashMap::new();

        for raw in text.lines() {
            let (code, comment) = split_comment(raw);
            let line = code.trim();

            if pending.trim().is_empty() {
                match line {
                    "dimensions:" => {
                        section = Section::Dimensions;
                        continue;
                    }
                    "variables:" => {
                        section = Section::Variables;
                        continue;
                    }
                    "data:" => {
                        section = Section::Data;
                        continue;
                    }
                    "}" => break,
                    _ if line.starts_with("netcdf ") => {
                        doc.name = line["netcdf ".len()..]
                            .trim_end_matches('{')
                            .trim()
                            .to_string();
                        continue;
                    }
                    _ => {}
                }
            }

            if section == Section::Dimensions && line.contains("UNLIMITED") {
                if let (Some((name, _)), Some(len)) =
                    (line.split_once('='), comment.and_then(currently))
                {
                    unlimited.insert(name.trim().to_string(), len);
                }
            }

            if line.is_empty() {
                continue;
            }
            pending.push_str(line);
            pending.push(' ');

            while let Some(end) = find_unquoted(&pending, ';') {
                let statement = pending[..end].trim().to_string();
                pending.drain(..=end);
                doc.apply(section, &statement, &unlimited)?;
            }
        }

        if !pending.trim().is_empty() {
            return Err(NetCdfError::InvalidFormat(format!(
                "unterminated statement: '{}'",
                pending.trim()
            )));
        }

        debug!(
            name = %doc.name,
            dimensions = doc.dimensions.len(),
            variables = doc.variables.len(),
            with_data = doc.data.len(),
            "Parsed CDL document"
        );
        Ok(doc)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name given to the product built from this document.
    pub fn product_name(&self) -> &str {
        if self.name.is_empty() {
            "product"
        } else {
            &self.name
        }
    }

    pub fn dimensions(&self) -> &[CdlDimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&CdlDimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn variables(&self) -> &[CdlVariable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&CdlVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn global_attributes(&self) -> &AttributeMap {
        &self.global_attributes
    }

    /// Values of `name` from the data section.
    pub fn values(&self, name: &str) -> Option<&[f64]> {
        self.data.get(name).map(Vec::as_slice)
    }

    /// Raster extent: the largest trailing 2-D extent of any variable of
    /// rank two or more, as (width, height) = (last, second to last).
    /// Without such a variable, the extent of the CF or COARDS 1-D axes.
    pub fn raster_dimension(&self) -> Option<RasterDimension> {
        self.variables
            .iter()
            .filter_map(|v| match self.shape(&v.name)?.as_slice() {
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

    /// Build a product of [`Self::raster_dimension`] whose bands are the
    /// 2-D variables of exactly that extent with values present.
    pub fn to_product(&self) -> NetCdfResult<Product> {
        let dimension = self
            .raster_dimension()
            .ok_or_else(|| NetCdfError::MissingData("variable with two dimensions".to_string()))?;
        let mut product = Product::new(self.product_name(), dimension);

        for var in &self.variables {
            let Some(values) = self.data.get(&var.name) else {
                continue;
            };
            if self.shape(&var.name) != Some(vec![dimension.height, dimension.width])
                || values.len() != dimension.len()
            {
                continue;
            }
            let mut band = Band::new(&var.name, values.iter().map(|v| *v as f32).collect());
            if let Some(expr) = var.attributes.string(names::VALID_PIXEL_EXPRESSION) {
                band = band.with_valid_pixel_expression(expr);
            }
            product
                .add_band(band)
                .map_err(|e| NetCdfError::InvalidFormat(e.to_string()))?;
        }
        Ok(product)
    }

    fn apply(
        &mut self,
        section: Section,
        statement: &str,
        unlimited: &HashMap<String, usize>,
    ) -> NetCdfResult<()> {
        match section {
            Section::Preamble => Err(NetCdfError::InvalidFormat(format!(
                "statement outside any section: '{}'",
                statement
            ))),
            Section::Dimensions => self.apply_dimensions(statement, unlimited),
            Section::Variables if find_unquoted(statement, '=').is_some() => {
                self.apply_attribute(statement)
            }
            Section::Variables => self.apply_declaration(statement),
            Section::Data => self.apply_data(statement),
        }
    }

    fn apply_dimensions(
        &mut self,
        statement: &str,
        unlimited: &HashMap<String, usize>,
    ) -> NetCdfResult<()> {
        for part in split_top_level(statement, ',') {
            let (name, value) = part.split_once('=').ok_or_else(|| {
                NetCdfError::InvalidFormat(format!("bad dimension declaration: '{}'", part))
            })?;
            let name = name.trim().to_string();
            let value = value.trim();
            let dimension = if value.eq_ignore_ascii_case("UNLIMITED") {
                CdlDimension {
                    len: unlimited.get(&name).copied().unwrap_or(0),
                    name,
                    unlimited: true,
                }
            } else {
                let len = value.parse().map_err(|_| {
                    NetCdfError::InvalidFormat(format!("Failed to parse dimension {}", name))
                })?;
                CdlDimension {
                    name,
                    len,
                    unlimited: false,
                }
            };
            self.dimensions.push(dimension);
        }
        Ok(())
    }

    fn apply_declaration(&mut self, statement: &str) -> NetCdfResult<()> {
        let (data_type, rest) = statement
            .split_once(char::is_whitespace)
            .filter(|(t, _)| TYPE_KEYWORDS.contains(t))
            .ok_or_else(|| {
                NetCdfError::InvalidFormat(format!("bad variable declaration: '{}'", statement))
            })?;

        for declarator in split_top_level(rest, ',') {
            let (name, dimensions) = match declarator.split_once('(') {
                Some((name, dims)) => (
                    name.trim(),
                    dims.trim_end_matches(')')
                        .split(',')
                        .map(|d| d.trim().to_string())
                        .filter(|d| !d.is_empty())
                        .collect(),
                ),
                None => (declarator.trim(), Vec::new()),
            };
            self.variables.push(CdlVariable {
                name: name.to_string(),
                data_type: data_type.to_string(),
                dimensions,
                attributes: AttributeMap::new(),
            });
        }
        Ok(())
    }

    fn apply_attribute(&mut self, statement: &str) -> NetCdfResult<()> {
        let (target, value) = split_assignment(statement)?;
        // netCDF-4 output may prefix the attribute with its type.
        let target = target.split_whitespace().last().unwrap_or_default();
        let (variable, attribute) = target.split_once(':').ok_or_else(|| {
            NetCdfError::InvalidFormat(format!("bad attribute: '{}'", statement))
        })?;
        let value = parse_attribute_value(value)?;

        if variable.is_empty() {
            self.global_attributes.insert(attribute, value);
            return Ok(());
        }
        let var = self
            .variables
            .iter_mut()
            .find(|v| v.name == variable)
            .ok_or_else(|| {
                NetCdfError::InvalidFormat(format!("attribute of undeclared variable '{}'", variable))
            })?;
        var.attributes.insert(attribute, value);
        Ok(())
    }

    fn apply_data(&mut self, statement: &str) -> NetCdfResult<()> {
        let (name, values) = split_assignment(statement)?;
        let tokens = split_top_level(values, ',');
        if tokens.iter().any(|t| t.starts_with('"')) {
            return Ok(());
        }
        let values = tokens
            .iter()
            .map(|t| {
                parse_number(t).ok_or_else(|| {
                    NetCdfError::InvalidFormat(format!("bad value '{}' for {}", t, name))
                })
            })
            .collect::<NetCdfResult<Vec<f64>>>()?;
        self.data.insert(name.trim().to_string(), values);
        Ok(())
    }
}

impl MetadataSource for CdlDocument {
    fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }

    fn shape(&self, name: &str) -> Option<Vec<usize>> {
        self.variable(name)?
            .dimensions
            .iter()
            .map(|d| self.dimension(d).map(|dim| dim.len))
            .collect()
    }

    fn attributes(&self, name: &str) -> Option<AttributeMap> {
        self.variable(name).map(|v| v.attributes.clone())
    }

    fn read_samples(&self, name: &str, count: usize) -> Result<Vec<f64>, MetadataError> {
        if !self.has_variable(name) {
            return Err(MetadataError::UnknownVariable(name.to_string()));
        }
        let values = self.values(name).unwrap_or_default();
        if values.len() < count {
            return Err(MetadataError::ShortRead {
                variable: name.to_string(),
                requested: count,
                available: values.len(),
            });
        }
        Ok(values[..count].to_vec())
    }
}

/// Read a CDL text file.
pub fn read_cdl_file<P: AsRef<Path>>(path: P) -> NetCdfResult<CdlDocument> {
    let text = std::fs::read_to_string(path)?;
    CdlDocument::parse(&text)
}

/// Describe a NetCDF file through `ncdump`: the header, plus the values of
/// whichever coordinate variables it declares.
pub fn dump_netcdf<P: AsRef<Path>>(path: P) -> NetCdfResult<CdlDocument> {
    let path = path.as_ref();
    let header = CdlDocument::parse(&run_ncdump(&["-h"], path)?)?;

    let wanted: Vec<&str> = COORDINATE_VARIABLES
        .iter()
        .copied()
        .filter(|name| header.has_variable(name))
        .collect();
    if wanted.is_empty() {
        info!(path = %path.display(), "No coordinate variables declared");
        return Ok(header);
    }

    let variables = wanted.join(",");
    info!(path = %path.display(), variables = %variables, "Dumping coordinate variables");
    CdlDocument::parse(&run_ncdump(&["-v", variables.as_str(), "-p", "9,17"], path)?)
}

fn run_ncdump(args: &[&str], path: &Path) -> NetCdfResult<String> {
    let output = Command::new("ncdump")
        .args(args)
        .arg(path)
        .output()
        .map_err(|e| NetCdfError::CommandError(format!("Failed to run ncdump: {}", e)))?;

    if !output.status.success() {
        return Err(NetCdfError::CommandError(format!(
            "ncdump failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// =============================================================================
// Lexical helpers
// =============================================================================

/// Split a line into code and an optional `//` comment outside strings.
fn split_comment(line: &str) -> (&str, Option<&str>) {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string => i += 1,
            b'"' => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => {
                return (&line[..i], Some(&line[i + 2..]));
            }
            _ => {}
        }
        i += 1;
    }
    (line, None)
}

/// `N` from an ncdump `(N currently)` comment.
fn currently(comment: &str) -> Option<usize> {
    let inner = comment.trim().strip_prefix('(')?;
    let (count, rest) = inner.split_once(char::is_whitespace)?;
    rest.trim_start().starts_with("currently").then_some(())?;
    count.parse().ok()
}

/// Byte index of the first `ch` outside string literals.
fn find_unquoted(s: &str, ch: char) -> Option<usize> {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == ch && !in_string => return Some(i),
            _ => {}
        }
    }
    None
}

/// Split on `sep` outside strings and parentheses. Parts are trimmed and
/// empty parts dropped.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => depth = depth.saturating_sub(1),
            c if c == sep && !in_string && depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

fn split_assignment(statement: &str) -> NetCdfResult<(&str, &str)> {
    let eq = find_unquoted(statement, '=').ok_or_else(|| {
        NetCdfError::InvalidFormat(format!("expected assignment: '{}'", statement))
    })?;
    Ok((statement[..eq].trim(), statement[eq + 1..].trim()))
}

fn parse_attribute_value(text: &str) -> NetCdfResult<AttributeValue> {
    let tokens = split_top_level(text, ',');
    if !tokens.is_empty() && tokens.iter().all(|t| t.starts_with('"')) {
        return Ok(AttributeValue::Text(tokens.iter().map(|t| unquote(t)).collect()));
    }
    let mut values = tokens
        .iter()
        .map(|t| {
            parse_number(t).ok_or_else(|| {
                NetCdfError::InvalidFormat(format!("Failed to parse attribute value '{}'", t))
            })
        })
        .collect::<NetCdfResult<Vec<f64>>>()?;
    match values.len() {
        0 => Err(NetCdfError::InvalidFormat("empty attribute value".to_string())),
        1 => Ok(AttributeValue::Number(values.remove(0))),
        _ => Ok(AttributeValue::Numbers(values)),
    }
}

/// Parse a CDL numeric literal: type suffixes (`f`, `s`, `b`, `L`, `u`,
/// `ul`, ...) are dropped, `NaN`/`Infinity` are accepted and `_` is NaN.
pub fn parse_number(token: &str) -> Option<f64> {
    let token = token.trim();
    if token == "_" {
        return Some(f64::NAN);
    }
    let lower = token.to_ascii_lowercase();
    let core = lower.trim_end_matches(['f', 's', 'b', 'l', 'u']);
    core.parse().ok()
}

fn unquote(token: &str) -> String {
    let inner = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_suffixes() {
        assert_eq!(parse_number("0.f"), Some(0.0));
        assert_eq!(parse_number("-999.f"), Some(-999.0));
        assert_eq!(parse_number("3s"), Some(3.0));
        assert_eq!(parse_number("-2b"), Some(-2.0));
        assert_eq!(parse_number("12UL"), Some(12.0));
        assert_eq!(parse_number("1.5e-3"), Some(0.0015));
        assert_eq!(parse_number("-Infinity"), Some(f64::NEG_INFINITY));
        assert!(parse_number("NaNf").unwrap().is_nan());
        assert!(parse_number("_").unwrap().is_nan());
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_split_comment_ignores_strings() {
        let (code, comment) = split_comment(r#"  :url = "http://example.org" ; // note"#);
        assert_eq!(code.trim(), r#":url = "http://example.org" ;"#);
        assert_eq!(comment, Some(" note"));
    }

    #[test]
    fn test_currently() {
        assert_eq!(currently(" (12 currently)"), Some(12));
        assert_eq!(currently(" something else"), None);
    }

    #[test]
    fn test_multiline_string_attribute() {
        let text = "netcdf t {\ndimensions:\n\tx = 2 ;\nvariables:\n\tfloat x(x) ;\n\t\tx:comment = \"first \",\n\t\t\t\"second\" ;\n}\n";
        let doc = CdlDocument::parse(text).unwrap();
        let comment = doc.variable("x").unwrap().attributes.string("comment");
        assert_eq!(comment, Some("first second"));
    }

    #[test]
    fn test_attribute_of_undeclared_variable() {
        let text = "netcdf t {\nvariables:\n\t\tq:units = \"m\" ;\n}\n";
        assert!(matches!(
            CdlDocument::parse(text),
            Err(NetCdfError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_unterminated_statement() {
        let text = "netcdf t {\ndimensions:\n\tx = 2\n";
        assert!(CdlDocument::parse(text).is_err());
    }

    #[test]
    fn test_typed_attribute_and_escape() {
        let text = "netcdf t {\nvariables:\n\tint v ;\n\t\tstring v:title = \"a \\\"quoted\\\" word\" ;\n\t\tv:flags = 1s, 2s, 4s ;\n}\n";
        let doc = CdlDocument::parse(text).unwrap();
        let attrs = &doc.variable("v").unwrap().attributes;
        assert_eq!(attrs.string("title"), Some("a \"quoted\" word"));
        assert_eq!(
            attrs.get("flags"),
            Some(&AttributeValue::Numbers(vec![1.0, 2.0, 4.0]))
        );
    }
}
