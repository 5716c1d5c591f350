//! Affine geocoding from a SPOT VGT log-volume descriptor, a flat
//! `KEY value` text header.

use std::collections::BTreeMap;

use geo_common::{Crs, RasterDimension};
use projection::AffineTransform;
use serde::Serialize;
use tracing::debug;

use crate::attributes::AttributeView;
use crate::geocoding::AffineGeocoding;
use crate::orientation::Orientation;

/// Offset from the upper-left pixel corner to the position the header's
/// corner coordinates refer to. Unlike NetCDF axes, which refer to pixel
/// centres (see `affine::NETCDF_PIXEL_CENTER`), this header is taken to
/// describe the corner itself.
pub const VGT_PIXEL_CENTER: f64 = 0.0;

/// The only geodetic system the header may declare.
pub const SUPPORTED_DATUM: &str = "WGS 1984";

/// The only map projection unit the header may declare.
pub const SUPPORTED_UNIT: &str = "DEGREES";

/// Header keys.
pub mod keys {
    pub const PRODUCT_ID: &str = "PRODUCT_ID";
    pub const MERIDIAN_ORIGIN: &str = "MERIDIAN_ORIGIN";
    pub const GEODETIC_SYST_NAME: &str = "GEODETIC_SYST_NAME";
    pub const MAP_PROJ_UNIT: &str = "MAP_PROJ_UNIT";
    pub const MAP_PROJ_RESOLUTION: &str = "MAP_PROJ_RESOLUTION";
    pub const GEO_UPPER_LEFT_LAT: &str = "GEO_UPPER_LEFT_LAT";
    pub const GEO_UPPER_LEFT_LONG: &str = "GEO_UPPER_LEFT_LONG";
    pub const IMAGE_UPPER_LEFT_COL: &str = "IMAGE_UPPER_LEFT_COL";
    pub const IMAGE_UPPER_LEFT_ROW: &str = "IMAGE_UPPER_LEFT_ROW";
    pub const IMAGE_LOWER_RIGHT_COL: &str = "IMAGE_LOWER_RIGHT_COL";
    pub const IMAGE_LOWER_RIGHT_ROW: &str = "IMAGE_LOWER_RIGHT_ROW";
}

/// Parsed `KEY value` header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderMap {
    entries: BTreeMap<String, String>,
}

impl HeaderMap {
    /// Parse one `KEY value` pair per line. The key ends at the first
    /// whitespace; the rest of the line, trimmed, is the value. Blank lines
    /// are ignored and a later duplicate key wins.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match line.split_once(char::is_whitespace) {
                Some((key, value)) => (key.to_string(), value.trim().to_string()),
                None => (line.to_string(), String::new()),
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn product_id(&self) -> Option<&str> {
        self.get(keys::PRODUCT_ID)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AttributeView for HeaderMap {
    fn numeric(&self, name: &str) -> Option<f64> {
        self.get(name)?.parse().ok()
    }

    fn string(&self, name: &str) -> Option<&str> {
        self.get(name)
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

/// The image rectangle declared by the header, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageBounds {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl ImageBounds {
    pub fn dimension(&self) -> RasterDimension {
        RasterDimension::new(self.width, self.height)
    }
}

/// Image rectangle from the 1-based inclusive pixel index fields.
pub fn image_bounds<V: AttributeView + ?Sized>(header: &V) -> Option<ImageBounds> {
    let ul_col = index(header, keys::IMAGE_UPPER_LEFT_COL)?;
    let ul_row = index(header, keys::IMAGE_UPPER_LEFT_ROW)?;
    let lr_col = index(header, keys::IMAGE_LOWER_RIGHT_COL)?;
    let lr_row = index(header, keys::IMAGE_LOWER_RIGHT_ROW)?;
    if lr_col < ul_col || lr_row < ul_row {
        return None;
    }
    Some(ImageBounds {
        x: ul_col - 1,
        y: ul_row - 1,
        width: lr_col - ul_col + 1,
        height: lr_row - ul_row + 1,
    })
}

/// Build an affine WGS84 geocoding from a vendor header.
///
/// Returns `None` if the header declares an unsupported meridian origin,
/// datum or unit, lacks a required field, or carries a value that does not
/// parse. Rows are stored north first.
pub fn build_vendor_geocoding<V: AttributeView + ?Sized>(header: &V) -> Option<AffineGeocoding> {
    if let Some(reason) = unsupported_reason(header) {
        debug!(reason, "Rejecting vendor header");
        return None;
    }

    let Some((bounds, pixel_size, ul_lat, ul_lon)) = required_fields(header) else {
        debug!("Vendor header lacks required geolocation fields");
        return None;
    };
    if !(pixel_size > 0.0) {
        debug!(pixel_size, "Rejecting vendor header with non-positive resolution");
        return None;
    }

    let transform = AffineTransform::identity()
        .translate(ul_lon, ul_lat)
        .scale(pixel_size, -pixel_size)
        .translate(-VGT_PIXEL_CENTER, -VGT_PIXEL_CENTER);

    let geocoding = AffineGeocoding::from_transform(
        Crs::wgs84(),
        bounds.dimension(),
        transform,
        Orientation::Natural,
    );
    if geocoding.is_none() {
        debug!("Vendor header transform is not invertible");
    }
    geocoding
}

fn unsupported_reason<V: AttributeView + ?Sized>(header: &V) -> Option<&'static str> {
    if header.contains(keys::MERIDIAN_ORIGIN) && header.numeric(keys::MERIDIAN_ORIGIN) != Some(0.0)
    {
        return Some("meridian origin is not zero");
    }
    if header.contains(keys::GEODETIC_SYST_NAME)
        && header.string(keys::GEODETIC_SYST_NAME) != Some(SUPPORTED_DATUM)
    {
        return Some("unsupported geodetic system");
    }
    if header.contains(keys::MAP_PROJ_UNIT)
        && !header
            .string(keys::MAP_PROJ_UNIT)
            .is_some_and(|unit| unit.eq_ignore_ascii_case(SUPPORTED_UNIT))
    {
        return Some("unsupported map projection unit");
    }
    None
}

fn required_fields<V: AttributeView + ?Sized>(header: &V) -> Option<(ImageBounds, f64, f64, f64)> {
    let pixel_size = header.numeric(keys::MAP_PROJ_RESOLUTION)?;
    let ul_lat = header.numeric(keys::GEO_UPPER_LEFT_LAT)?;
    let ul_lon = header.numeric(keys::GEO_UPPER_LEFT_LONG)?;
    let bounds = image_bounds(header)?;
    Some((bounds, pixel_size, ul_lat, ul_lon))
}

/// A 1-based pixel index, written as a plain decimal integer.
fn index<V: AttributeView + ?Sized>(header: &V, key: &str) -> Option<usize> {
    let value = match header.string(key) {
        Some(text) => text.trim().parse::<usize>().ok()?,
        None => {
            let value = header.numeric(key)?;
            if value.fract() != 0.0 || !(0.0..=u32::MAX as f64).contains(&value) {
                return None;
            }
            value as usize
        }
    };
    (value >= 1).then_some(value)
}
