//! The geocoding model: an affine map between pixels and CRS coordinates, or
//! a dense per-pixel latitude/longitude lookup.

use geo_common::{BoundingBox, Crs, GeoPos, PixelPos, RasterDimension};
use projection::AffineTransform;
use serde::Serialize;

use crate::orientation::Orientation;
use crate::pixel_grid::PixelGridGeocoding;

/// Pixel-to-geographic mapping of one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geocoding {
    Affine(AffineGeocoding),
    PixelGrid(PixelGridGeocoding),
}

impl Geocoding {
    pub fn dimension(&self) -> RasterDimension {
        match self {
            Geocoding::Affine(g) => g.dimension(),
            Geocoding::PixelGrid(g) => g.dimension(),
        }
    }

    /// Geographic position of an image position.
    pub fn pixel_to_geo(&self, pixel: PixelPos) -> Option<GeoPos> {
        match self {
            Geocoding::Affine(g) => g.pixel_to_geo(pixel),
            Geocoding::PixelGrid(g) => g.pixel_to_geo(pixel),
        }
    }

    /// Image position of a geographic position, if it falls on the raster.
    pub fn geo_to_pixel(&self, pos: GeoPos) -> Option<PixelPos> {
        match self {
            Geocoding::Affine(g) => g.geo_to_pixel(pos),
            Geocoding::PixelGrid(g) => g.geo_to_pixel(pos),
        }
    }

    /// True for a plain affine mapping in geographic WGS84, the only shape
    /// that is written as lightweight 1-D coordinate axes.
    pub fn is_geographic_wgs84(&self) -> bool {
        matches!(self, Geocoding::Affine(g) if g.is_geographic_wgs84())
    }

    /// Geographic extent covered by the raster.
    pub fn geographic_bounds(&self) -> Option<BoundingBox> {
        match self {
            Geocoding::Affine(g) => g.geographic_bounds(),
            Geocoding::PixelGrid(g) => g.geographic_bounds(),
        }
    }
}

impl From<AffineGeocoding> for Geocoding {
    fn from(g: AffineGeocoding) -> Self {
        Geocoding::Affine(g)
    }
}

impl From<PixelGridGeocoding> for Geocoding {
    fn from(g: PixelGridGeocoding) -> Self {
        Geocoding::PixelGrid(g)
    }
}

/// An affine image-to-map transform valid uniformly across the raster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffineGeocoding {
    crs: Crs,
    dimension: RasterDimension,
    easting: f64,
    northing: f64,
    reference_pixel: PixelPos,
    image_to_map: AffineTransform,
    #[serde(skip)]
    map_to_image: AffineTransform,
    orientation: Orientation,
}

impl AffineGeocoding {
    /// Build from an anchor: the image position `(reference_x, reference_y)`
    /// maps to `(easting, northing)`, x grows east by `pixel_size_x` per
    /// pixel and y grows south by `pixel_size_y` per pixel.
    ///
    /// Returns `None` unless both pixel sizes are strictly positive and the
    /// raster is non-empty.
    #[allow(clippy::too_many_arguments)]
    pub fn from_reference_pixel(
        crs: Crs,
        dimension: RasterDimension,
        easting: f64,
        northing: f64,
        pixel_size_x: f64,
        pixel_size_y: f64,
        reference_x: f64,
        reference_y: f64,
        orientation: Orientation,
    ) -> Option<Self> {
        if !(pixel_size_x > 0.0 && pixel_size_y > 0.0) {
            return None;
        }
        let transform = AffineTransform::identity()
            .translate(easting, northing)
            .scale(pixel_size_x, -pixel_size_y)
            .translate(-reference_x, -reference_y);
        let mut geocoding = Self::from_transform(crs, dimension, transform, orientation)?;
        geocoding.easting = easting;
        geocoding.northing = northing;
        geocoding.reference_pixel = PixelPos::new(reference_x, reference_y);
        Some(geocoding)
    }

    /// Build from a ready image-to-map transform. The anchor becomes the
    /// upper-left image corner.
    ///
    /// Returns `None` for an empty raster or a transform without an inverse.
    pub fn from_transform(
        crs: Crs,
        dimension: RasterDimension,
        image_to_map: AffineTransform,
        orientation: Orientation,
    ) -> Option<Self> {
        if dimension.is_empty() {
            return None;
        }
        let map_to_image = image_to_map.inverse()?;
        let (easting, northing) = image_to_map.transform(0.0, 0.0);
        Some(Self {
            crs,
            dimension,
            easting,
            northing,
            reference_pixel: PixelPos::new(0.0, 0.0),
            image_to_map,
            map_to_image,
            orientation,
        })
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn dimension(&self) -> RasterDimension {
        self.dimension
    }

    pub fn image_to_map(&self) -> &AffineTransform {
        &self.image_to_map
    }

    /// Row orientation decided when this geocoding was read.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Map x coordinate of the reference pixel.
    pub fn easting(&self) -> f64 {
        self.easting
    }

    /// Map y coordinate of the reference pixel.
    pub fn northing(&self) -> f64 {
        self.northing
    }

    /// Image position anchored at (`easting`, `northing`).
    pub fn reference_pixel(&self) -> PixelPos {
        self.reference_pixel
    }

    /// Map x extent of one pixel.
    pub fn pixel_size_x(&self) -> f64 {
        self.image_to_map.scale_x()
    }

    /// Map y extent of one pixel, positive for image-down rows.
    pub fn pixel_size_y(&self) -> f64 {
        -self.image_to_map.scale_y()
    }

    /// Map coordinates of the upper-left corner of pixel (0, 0).
    pub fn origin(&self) -> (f64, f64) {
        self.image_to_map.transform(0.0, 0.0)
    }

    pub fn pixel_to_map(&self, pixel: PixelPos) -> (f64, f64) {
        self.image_to_map.transform(pixel.x, pixel.y)
    }

    pub fn pixel_to_geo(&self, pixel: PixelPos) -> Option<GeoPos> {
        let (x, y) = self.pixel_to_map(pixel);
        projection::to_geographic(self.crs.code, x, y)
    }

    pub fn geo_to_pixel(&self, pos: GeoPos) -> Option<PixelPos> {
        let (x, y) = projection::from_geographic(self.crs.code, pos)?;
        let (px, py) = self.map_to_image.transform(x, y);
        let RasterDimension { width, height } = self.dimension;
        if px < 0.0 || py < 0.0 || px > width as f64 || py > height as f64 {
            return None;
        }
        Some(PixelPos::new(px, py))
    }

    pub fn is_geographic_wgs84(&self) -> bool {
        self.crs.equals_ignoring_metadata(&Crs::wgs84())
    }

    fn geographic_bounds(&self) -> Option<BoundingBox> {
        let RasterDimension { width, height } = self.dimension;
        let (w, h) = (width as f64, height as f64);
        let mut bounds = BoundingBox::empty();
        for (x, y) in [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)] {
            if let Some(pos) = self.pixel_to_geo(PixelPos::new(x, y)) {
                bounds.include(pos.lon, pos.lat);
            }
        }
        (!bounds.is_empty()).then_some(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_common::CrsCode;

    fn north_up() -> AffineGeocoding {
        AffineGeocoding::from_reference_pixel(
            Crs::wgs84(),
            RasterDimension::new(10, 5),
            4.0,
            50.0,
            0.1,
            0.2,
            0.5,
            0.5,
            Orientation::Natural,
        )
        .unwrap()
    }

    #[test]
    fn test_reference_pixel_maps_to_anchor() {
        let g = north_up();
        let pos = g.pixel_to_geo(PixelPos::new(0.5, 0.5)).unwrap();
        assert!((pos.lon - 4.0).abs() < 1e-12);
        assert!((pos.lat - 50.0).abs() < 1e-12);
        assert!((g.pixel_size_x() - 0.1).abs() < 1e-12);
        assert!((g.pixel_size_y() - 0.2).abs() < 1e-12);
        assert_eq!(g.reference_pixel(), PixelPos::new(0.5, 0.5));
        assert_eq!((g.easting(), g.northing()), (4.0, 50.0));
    }

    #[test]
    fn test_origin_is_upper_left_corner() {
        let (x, y) = north_up().origin();
        assert!((x - 3.95).abs() < 1e-12);
        assert!((y - 50.1).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_positive_pixel_size() {
        let build = |psx: f64, psy: f64| {
            AffineGeocoding::from_reference_pixel(
                Crs::wgs84(),
                RasterDimension::new(10, 5),
                0.0,
                0.0,
                psx,
                psy,
                0.5,
                0.5,
                Orientation::Natural,
            )
        };
        assert!(build(0.0, 1.0).is_none());
        assert!(build(1.0, -1.0).is_none());
        assert!(build(f64::NAN, 1.0).is_none());
        assert!(build(1.0, 1.0).is_some());
    }

    #[test]
    fn test_geo_to_pixel_inverts() {
        let g = north_up();
        let pixel = g.geo_to_pixel(GeoPos::new(49.5, 4.45)).unwrap();
        assert!((pixel.x - 5.0).abs() < 1e-9);
        assert!((pixel.y - 3.0).abs() < 1e-9);
        assert!(g.geo_to_pixel(GeoPos::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_wgs84_detection() {
        let g = north_up();
        assert!(Geocoding::from(g.clone()).is_geographic_wgs84());

        let nad83 = AffineGeocoding::from_transform(
            Crs::new(CrsCode::Epsg4269),
            g.dimension(),
            *g.image_to_map(),
            Orientation::Natural,
        )
        .unwrap();
        assert!(!Geocoding::from(nad83).is_geographic_wgs84());
    }

    #[test]
    fn test_geographic_bounds() {
        let bounds = Geocoding::from(north_up()).geographic_bounds().unwrap();
        assert!((bounds.min_x - 3.95).abs() < 1e-9);
        assert!((bounds.max_x - 4.95).abs() < 1e-9);
        assert!((bounds.min_y - 49.1).abs() < 1e-9);
        assert!((bounds.max_y - 50.1).abs() < 1e-9);
    }
}
