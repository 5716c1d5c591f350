//! Vertical orientation of stored rows relative to raster rows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether stored row order is vertically flipped relative to the raster.
///
/// `Natural` means row 0 is the northernmost row (north-to-south storage);
/// `Flipped` means storage runs south to north, so raster row `y` lives at
/// stored row `height - 1 - y`.
///
/// Inference returns the orientation next to the geocoding so that a later
/// output step applies the same row mapping the reader decided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Natural,
    Flipped,
}

impl Orientation {
    /// Derive orientation from the raw step between the first two stored
    /// latitude samples. A non-negative step means latitude grows with the
    /// stored row index, i.e. south-to-north storage.
    pub fn from_latitude_step(step: f64) -> Self {
        if step >= 0.0 {
            Orientation::Flipped
        } else {
            Orientation::Natural
        }
    }

    pub fn is_flipped(self) -> bool {
        self == Orientation::Flipped
    }

    /// Stored row index for raster row `y` of a raster `height` rows tall,
    /// or `None` if `y` is not a row of that raster.
    pub fn physical_row(self, y: usize, height: usize) -> Option<usize> {
        if y >= height {
            return None;
        }
        match self {
            Orientation::Natural => Some(y),
            Orientation::Flipped => height.checked_sub(y + 1),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Natural => write!(f, "natural"),
            Orientation::Flipped => write!(f, "flipped"),
        }
    }
}
