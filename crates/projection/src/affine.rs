//! Two-dimensional affine transforms between image and map space.
//!
//! Transforms are stored as 3x3 homogeneous matrices. Composition follows the
//! classic "concatenate on the right" convention: after
//! `AffineTransform::identity().translate(tx, ty).scale(sx, sy)` a point is
//! first scaled, then translated.

use nalgebra::{Matrix3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// An affine mapping `(x, y) -> (a*x + b*y + c, d*x + e*y + f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 6]", from = "[f64; 6]")]
pub struct AffineTransform {
    matrix: Matrix3<f64>,
}

impl AffineTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    /// Build from the six coefficients `[scale_x, shear_x, translate_x,
    /// shear_y, scale_y, translate_y]`.
    pub fn from_coefficients(c: [f64; 6]) -> Self {
        Self {
            matrix: Matrix3::new(c[0], c[1], c[2], c[3], c[4], c[5], 0.0, 0.0, 1.0),
        }
    }

    /// Concatenate a translation.
    pub fn translate(mut self, tx: f64, ty: f64) -> Self {
        self.matrix *= Matrix3::new_translation(&Vector2::new(tx, ty));
        self
    }

    /// Concatenate a (possibly non-uniform, possibly negative) scaling.
    pub fn scale(mut self, sx: f64, sy: f64) -> Self {
        self.matrix *= Matrix3::new_nonuniform_scaling(&Vector2::new(sx, sy));
        self
    }

    /// Map a point forward through the transform.
    pub fn transform(&self, x: f64, y: f64) -> (f64, f64) {
        let p = self.matrix * Vector3::new(x, y, 1.0);
        (p.x, p.y)
    }

    pub fn determinant(&self) -> f64 {
        self.matrix.determinant()
    }

    /// The inverse mapping, or `None` when the transform is singular or
    /// carries non-finite coefficients.
    pub fn inverse(&self) -> Option<Self> {
        if !self.is_finite() {
            return None;
        }
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        self.matrix
            .try_inverse()
            .map(|matrix| Self { matrix })
    }

    pub fn is_finite(&self) -> bool {
        self.matrix.iter().all(|v| v.is_finite())
    }

    pub fn scale_x(&self) -> f64 {
        self.matrix[(0, 0)]
    }

    pub fn shear_x(&self) -> f64 {
        self.matrix[(0, 1)]
    }

    pub fn translate_x(&self) -> f64 {
        self.matrix[(0, 2)]
    }

    pub fn shear_y(&self) -> f64 {
        self.matrix[(1, 0)]
    }

    pub fn scale_y(&self) -> f64 {
        self.matrix[(1, 1)]
    }

    pub fn translate_y(&self) -> f64 {
        self.matrix[(1, 2)]
    }

    pub fn coefficients(&self) -> [f64; 6] {
        [
            self.scale_x(),
            self.shear_x(),
            self.translate_x(),
            self.shear_y(),
            self.scale_y(),
            self.translate_y(),
        ]
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<AffineTransform> for [f64; 6] {
    fn from(t: AffineTransform) -> Self {
        t.coefficients()
    }
}

impl From<[f64; 6]> for AffineTransform {
    fn from(c: [f64; 6]) -> Self {
        Self::from_coefficients(c)
    }
}
