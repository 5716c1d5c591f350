//! Coordinate variable naming conventions and their resolution.

use geo_common::RasterDimension;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::attributes::names;
use crate::source::MetadataSource;

/// A metadata naming convention for coordinate variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Convention {
    Cf,
    Coards,
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Convention::Cf => write!(f, "CF"),
            Convention::Coards => write!(f, "COARDS"),
        }
    }
}

/// Longitude and latitude variable names of one convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConventionNamePair {
    pub convention: Convention,
    pub lon: &'static str,
    pub lat: &'static str,
}

/// Known conventions in priority order.
pub const CONVENTIONS: &[ConventionNamePair] = &[
    ConventionNamePair {
        convention: Convention::Cf,
        lon: names::LON,
        lat: names::LAT,
    },
    ConventionNamePair {
        convention: Convention::Coards,
        lon: names::LONGITUDE,
        lat: names::LATITUDE,
    },
];

/// Coordinate variables that passed resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedCoordinates {
    pub convention: Convention,
    pub lon: String,
    pub lat: String,
}

/// Resolve the coordinate variables of `source` against [`CONVENTIONS`].
pub fn resolve_convention<S: MetadataSource + ?Sized>(
    source: &S,
    dimension: RasterDimension,
) -> Option<ResolvedCoordinates> {
    resolve_with(CONVENTIONS, source, dimension)
}

/// Resolve against an explicit table.
///
/// The first pair whose two variables both exist is the only candidate: if
/// its axes do not fit `dimension`, resolution fails without trying later
/// pairs. A pair with only one variable present is never a candidate.
pub fn resolve_with<S: MetadataSource + ?Sized>(
    table: &[ConventionNamePair],
    source: &S,
    dimension: RasterDimension,
) -> Option<ResolvedCoordinates> {
    let Some(pair) = table
        .iter()
        .find(|p| source.has_variable(p.lon) && source.has_variable(p.lat))
    else {
        debug!("No coordinate variable convention found");
        return None;
    };

    if !axis_fits(source, pair.lon, dimension.width)
        || !axis_fits(source, pair.lat, dimension.height)
    {
        debug!(
            convention = %pair.convention,
            lon_shape = ?source.shape(pair.lon),
            lat_shape = ?source.shape(pair.lat),
            dimension = %dimension,
            "Coordinate variables do not match raster dimension"
        );
        return None;
    }

    debug!(convention = %pair.convention, "Resolved coordinate variables");
    Some(ResolvedCoordinates {
        convention: pair.convention,
        lon: pair.lon.to_string(),
        lat: pair.lat.to_string(),
    })
}

/// Raster extent implied by 1-D coordinate axes alone, as (lon length,
/// lat length). Uses the first pair of [`CONVENTIONS`] whose two variables
/// both exist; `None` if either of its axes is not 1-D or is empty.
pub fn axis_dimension<S: MetadataSource + ?Sized>(source: &S) -> Option<RasterDimension> {
    let pair = CONVENTIONS
        .iter()
        .find(|p| source.has_variable(p.lon) && source.has_variable(p.lat))?;
    match (source.shape(pair.lon).as_deref(), source.shape(pair.lat).as_deref()) {
        (Some([width]), Some([height])) => {
            Some(RasterDimension::new(*width, *height)).filter(|d| !d.is_empty())
        }
        _ => None,
    }
}

/// A 1-D axis constrains exactly one raster dimension.
fn axis_fits<S: MetadataSource + ?Sized>(source: &S, name: &str, len: usize) -> bool {
    matches!(source.shape(name).as_deref(), Some([n]) if *n == len)
}
