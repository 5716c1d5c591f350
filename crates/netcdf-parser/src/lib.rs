//! NetCDF and CDL collaborators for geocoding inference and output.
//!
//! # Implementation Notes
//!
//! Metadata is read by parsing the CDL text that `ncdump` prints, so the
//! default build needs the netCDF command-line tools but no C libraries.
//! Coordinate fields are written back as CDL, which `ncgen` turns into a
//! NetCDF file.
//!
//! With the `native` feature (requires libhdf5-dev and libnetcdf-dev) the
//! [`native`] module reads and writes NetCDF files directly.

pub mod cdl;
pub mod cdl_writer;
pub mod error;
pub mod inspect;

#[cfg(feature = "native")]
pub mod native;

pub use cdl::{
    dump_netcdf, read_cdl_file, CdlDimension, CdlDocument, CdlVariable, COORDINATE_VARIABLES,
};
pub use cdl_writer::CdlWriter;
pub use error::{NetCdfError, NetCdfResult};
pub use inspect::{inspect_document, inspect_vgt_header, read_vgt_header, Inspection};

#[cfg(feature = "native")]
pub use inspect::inspect_native;
#[cfg(feature = "native")]
pub use native::{silence_hdf5_errors, NativeSource, NativeWriter};
