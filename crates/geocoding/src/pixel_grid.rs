//! Dense per-pixel geocoding built from latitude/longitude bands.

use geo_common::{BoundingBox, GeoPos, PixelPos, RasterDimension};
use serde::Serialize;
use tracing::{debug, warn};

use crate::attributes::names;
use crate::config::GeocodingConfig;
use crate::orientation::Orientation;
use crate::product::{Band, RasterModel};
use crate::source::{CoordinateSampleReader, MetadataSource};

/// Band names tried for the longitude grid, in order.
pub const LON_BAND_NAMES: [&str; 2] = [names::LON, names::LONGITUDE];

/// Band names tried for the latitude grid, in order.
pub const LAT_BAND_NAMES: [&str; 2] = [names::LAT, names::LATITUDE];

/// Geocoding given by explicit latitude and longitude for every pixel.
///
/// Grid samples refer to pixel centres. Forward lookup interpolates
/// bilinearly between the surrounding centres; NaN samples are treated as
/// invalid and skipped. The validity expression is carried for consumers
/// that evaluate band expressions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelGridGeocoding {
    dimension: RasterDimension,
    lat_band: String,
    lon_band: String,
    #[serde(skip)]
    latitudes: Vec<f32>,
    #[serde(skip)]
    longitudes: Vec<f32>,
    valid_mask: Option<String>,
    search_radius: u32,
}

impl PixelGridGeocoding {
    /// Returns `None` unless both grids hold exactly one sample per pixel.
    pub fn new(
        dimension: RasterDimension,
        lat_band: &Band,
        lon_band: &Band,
        valid_mask: Option<String>,
        search_radius: u32,
    ) -> Option<Self> {
        if dimension.is_empty()
            || lat_band.data().len() != dimension.len()
            || lon_band.data().len() != dimension.len()
        {
            return None;
        }
        Some(Self {
            dimension,
            lat_band: lat_band.name().to_string(),
            lon_band: lon_band.name().to_string(),
            latitudes: lat_band.data().to_vec(),
            longitudes: lon_band.data().to_vec(),
            valid_mask,
            search_radius,
        })
    }

    pub fn dimension(&self) -> RasterDimension {
        self.dimension
    }

    pub fn lat_band(&self) -> &str {
        &self.lat_band
    }

    pub fn lon_band(&self) -> &str {
        &self.lon_band
    }

    pub fn valid_mask(&self) -> Option<&str> {
        self.valid_mask.as_deref()
    }

    pub fn search_radius(&self) -> u32 {
        self.search_radius
    }

    pub fn pixel_to_geo(&self, pixel: PixelPos) -> Option<GeoPos> {
        let lat = self.interpolate(&self.latitudes, pixel)?;
        let lon = self.interpolate(&self.longitudes, pixel)?;
        Some(GeoPos::new(lat, lon))
    }

    /// Nearest pixel centre to `pos`.
    ///
    /// A coarse scan with a stride of `search_radius` pixels is refined
    /// within `search_radius` pixels of the best coarse hit. Positions
    /// further than two local pixel spacings from every sample are off the
    /// raster.
    pub fn geo_to_pixel(&self, pos: GeoPos) -> Option<PixelPos> {
        if !pos.is_valid() {
            return None;
        }
        let RasterDimension { width, height } = self.dimension;
        let radius = self.search_radius.max(1) as usize;

        let coarse = self.nearest_in(pos, 0..width, 0..height, radius)?;
        let (cx, cy, _) = coarse;
        let (x, y, distance) = self.nearest_in(
            pos,
            cx.saturating_sub(radius)..(cx + radius + 1).min(width),
            cy.saturating_sub(radius)..(cy + radius + 1).min(height),
            1,
        )?;

        let spacing = self.local_spacing(x, y);
        if distance > 4.0 * spacing * spacing {
            return None;
        }
        Some(PixelPos::center(x, y))
    }

    pub(crate) fn geographic_bounds(&self) -> Option<BoundingBox> {
        let mut bounds = BoundingBox::empty();
        for (lat, lon) in self.latitudes.iter().zip(&self.longitudes) {
            bounds.include(*lon as f64, *lat as f64);
        }
        (!bounds.is_empty()).then_some(bounds)
    }

    fn sample(&self, x: usize, y: usize) -> Option<GeoPos> {
        let index = y * self.dimension.width + x;
        let pos = GeoPos::new(self.latitudes[index] as f64, self.longitudes[index] as f64);
        pos.is_valid().then_some(pos)
    }

    fn interpolate(&self, grid: &[f32], pixel: PixelPos) -> Option<f64> {
        let RasterDimension { width, height } = self.dimension;
        let (w, h) = (width as f64, height as f64);
        if !(pixel.x >= 0.0 && pixel.x <= w && pixel.y >= 0.0 && pixel.y <= h) {
            return None;
        }

        let fx = (pixel.x - 0.5).clamp(0.0, w - 1.0);
        let fy = (pixel.y - 0.5).clamp(0.0, h - 1.0);
        let x0 = fx.floor() as usize;
        let y0 = fy.floor() as usize;
        let x1 = (x0 + 1).min(width - 1);
        let y1 = (y0 + 1).min(height - 1);
        let tx = fx - x0 as f64;
        let ty = fy - y0 as f64;

        let corners = [
            (x0, y0, (1.0 - tx) * (1.0 - ty)),
            (x1, y0, tx * (1.0 - ty)),
            (x0, y1, (1.0 - tx) * ty),
            (x1, y1, tx * ty),
        ];

        let mut sum = 0.0;
        let mut weights = 0.0;
        for (x, y, weight) in corners {
            if weight <= 0.0 {
                continue;
            }
            let value = grid[y * width + x] as f64;
            if value.is_nan() {
                continue;
            }
            sum += value * weight;
            weights += weight;
        }
        (weights > 0.0).then(|| sum / weights)
    }

    fn nearest_in(
        &self,
        pos: GeoPos,
        xs: std::ops::Range<usize>,
        ys: std::ops::Range<usize>,
        stride: usize,
    ) -> Option<(usize, usize, f64)> {
        let cos_lat = pos.lat.to_radians().cos();
        let mut best: Option<(usize, usize, f64)> = None;
        for y in ys.step_by(stride) {
            for x in xs.clone().step_by(stride) {
                let Some(sample) = self.sample(x, y) else {
                    continue;
                };
                let dlat = sample.lat - pos.lat;
                let dlon = (sample.lon - pos.lon) * cos_lat;
                let distance = dlat * dlat + dlon * dlon;
                if best.map_or(true, |(_, _, d)| distance < d) {
                    best = Some((x, y, distance));
                }
            }
        }
        best
    }

    /// Largest distance from pixel (x, y) to a valid direct neighbour.
    fn local_spacing(&self, x: usize, y: usize) -> f64 {
        let Some(center) = self.sample(x, y) else {
            return 0.0;
        };
        let RasterDimension { width, height } = self.dimension;
        let cos_lat = center.lat.to_radians().cos();
        let neighbours = [
            (x.checked_sub(1), Some(y)),
            ((x + 1 < width).then_some(x + 1), Some(y)),
            (Some(x), y.checked_sub(1)),
            (Some(x), (y + 1 < height).then_some(y + 1)),
        ];
        neighbours
            .into_iter()
            .filter_map(|(nx, ny)| self.sample(nx?, ny?))
            .map(|n| {
                let dlat = n.lat - center.lat;
                let dlon = (n.lon - center.lon) * cos_lat;
                (dlat * dlat + dlon * dlon).sqrt()
            })
            .fold(0.0, f64::max)
    }
}

/// Build a dense geocoding from the product's latitude/longitude bands.
///
/// The orientation is read from the first two stored latitude samples
/// using the same sign rule as the sample-based affine builder. Returns
/// `None` if either band is missing or those samples cannot be read.
pub fn build_pixel_geocoding<S, R>(
    source: &S,
    raster: &R,
    config: &GeocodingConfig,
) -> Option<(PixelGridGeocoding, Orientation)>
where
    S: MetadataSource + ?Sized,
    R: RasterModel + ?Sized,
{
    let lon_band = find_band(raster, &LON_BAND_NAMES)?;
    let lat_band = find_band(raster, &LAT_BAND_NAMES)?;

    let step = match CoordinateSampleReader::new(source).step(lat_band.name()) {
        Ok(step) => step,
        Err(e) => {
            warn!(band = %lat_band.name(), error = %e, "Failed to read latitude orientation samples");
            return None;
        }
    };
    let orientation = Orientation::from_latitude_step(step);

    let geocoding = PixelGridGeocoding::new(
        raster.dimension(),
        lat_band,
        lon_band,
        lat_band.valid_pixel_expression().map(str::to_string),
        config.pixel_search_radius,
    )?;

    debug!(
        lat_band = %lat_band.name(),
        lon_band = %lon_band.name(),
        orientation = %orientation,
        "Built pixel geocoding"
    );
    Some((geocoding, orientation))
}

fn find_band<'a, R: RasterModel + ?Sized>(raster: &'a R, names: &[&str]) -> Option<&'a Band> {
    names.iter().find_map(|name| raster.band(name))
}
