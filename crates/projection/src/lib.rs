//! Affine image/map transforms and the coordinate conversions needed to turn
//! map coordinates into geographic positions.
//!
//! Implements the math from scratch on top of `nalgebra`; no external
//! projection library is involved.

pub mod affine;
pub mod geographic;
pub mod mercator;

pub use affine::AffineTransform;
pub use geographic::{from_geographic, to_geographic};
