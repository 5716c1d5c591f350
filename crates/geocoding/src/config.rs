//! Configuration for geocoding inference and output.

use serde::{Deserialize, Serialize};

use crate::error::GeocodingError;

/// Neighbour search radius used by pixel-grid geocodings.
pub const DEFAULT_SEARCH_RADIUS: u32 = 5;

/// Configuration for geocoding inference and dense coordinate output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Refinement window, in pixels, of pixel-grid inverse lookups.
    pub pixel_search_radius: u32,

    /// Sample dense coordinate rows on the rayon pool.
    pub parallel_sampling: bool,

    /// Rows sampled together before being handed to the storage writer.
    pub rows_per_batch: usize,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            pixel_search_radius: DEFAULT_SEARCH_RADIUS,
            parallel_sampling: true,
            rows_per_batch: 64,
        }
    }
}

impl GeocodingConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GEOCODING_SEARCH_RADIUS") {
            if let Ok(radius) = val.parse() {
                config.pixel_search_radius = radius;
            }
        }

        if let Ok(val) = std::env::var("GEOCODING_PARALLEL_SAMPLING") {
            config.parallel_sampling = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("GEOCODING_ROWS_PER_BATCH") {
            if let Ok(rows) = val.parse() {
                config.rows_per_batch = rows;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.rows_per_batch == 0 {
            return Err("rows_per_batch must be > 0".to_string());
        }

        Ok(())
    }

    /// Validate, converting the failure into a [`GeocodingError`].
    pub fn validated(self) -> crate::Result<Self> {
        self.validate().map_err(GeocodingError::InvalidConfig)?;
        Ok(self)
    }
}
