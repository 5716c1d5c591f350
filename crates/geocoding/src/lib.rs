//! Geocoding inference and output for gridded raster products.
//!
//! The read path resolves CF or COARDS coordinate variables, derives an
//! affine pixel-to-WGS84 mapping and its row orientation, and otherwise
//! falls back to a dense per-pixel geocoding built from latitude/longitude
//! bands. SPOT VGT log-volume headers map onto the same affine model.
//!
//! The write path plans coordinate field declarations for a known
//! geocoding and, for anything other than a geographic WGS84 affine
//! mapping, samples full latitude/longitude fields row by row.
//!
//! Metadata, product and storage access go through the [`MetadataSource`],
//! [`RasterModel`] and [`StorageWriter`] traits.

pub mod affine;
pub mod attributes;
pub mod config;
pub mod convention;
pub mod error;
pub mod geocoding;
pub mod infer;
pub mod memory;
pub mod orientation;
pub mod pixel_grid;
pub mod product;
pub mod source;
pub mod storage;
pub mod vendor_header;
pub mod writer;

pub use affine::{build_affine_geocoding, NETCDF_PIXEL_CENTER};
pub use attributes::{names, AttributeMap, AttributeValue, AttributeView};
pub use config::GeocodingConfig;
pub use convention::{
    axis_dimension, resolve_convention, Convention, ConventionNamePair, ResolvedCoordinates,
};
pub use error::{GeocodingError, MetadataError, Result, StorageError};
pub use geocoding::{AffineGeocoding, Geocoding};
pub use infer::{infer_geocoding, InferredGeocoding};
pub use memory::MemoryMetadata;
pub use orientation::Orientation;
pub use pixel_grid::{build_pixel_geocoding, PixelGridGeocoding};
pub use product::{Band, Product, RasterModel};
pub use source::{CoordinateSampleReader, MetadataSource};
pub use storage::{FieldDeclaration, FieldDimension, FieldKind, MemoryStorage, StorageWriter};
pub use vendor_header::{build_vendor_geocoding, HeaderMap, ImageBounds, VGT_PIXEL_CENTER};
pub use writer::{plan_geocoding_output, DeclarationPlan, GeocodingWriter, SampledRow};
