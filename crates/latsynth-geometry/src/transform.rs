//! Rigid rotations for lattice point sets.
//!
//! A [`Transform`] wraps a 3×3 rotation matrix built from Euler angles in
//! degrees. The composition order is fixed as $R = R_z R_y R_x$, so the
//! x rotation is applied first; generated datasets depend on this order.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::lattice::PointSet;

/// Euler angles in degrees about the x, y and z axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl EulerAngles {
    pub fn new(rx: f64, ry: f64, rz: f64) -> Self {
        Self { rx, ry, rz }
    }
}

/// A rotation about the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// 3x3 rotation matrix.
    pub matrix: Matrix3<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }
}

impl Transform {
    /// Rotation by `degrees` about the x axis (right-handed).
    pub fn rotation_x(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self {
            matrix: Matrix3::new(
                1.0, 0.0, 0.0,
                0.0, c, -s,
                0.0, s, c,
            ),
        }
    }

    /// Rotation by `degrees` about the y axis (right-handed).
    pub fn rotation_y(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self {
            matrix: Matrix3::new(
                c, 0.0, s,
                0.0, 1.0, 0.0,
                -s, 0.0, c,
            ),
        }
    }

    /// Rotation by `degrees` about the z axis (right-handed).
    pub fn rotation_z(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self {
            matrix: Matrix3::new(
                c, -s, 0.0,
                s, c, 0.0,
                0.0, 0.0, 1.0,
            ),
        }
    }

    /// Composite rotation $R_z R_y R_x$ from Euler angles in degrees.
    pub fn euler_degrees(rx: f64, ry: f64, rz: f64) -> Self {
        let rx = Self::rotation_x(rx);
        let ry = Self::rotation_y(ry);
        let rz = Self::rotation_z(rz);
        Self {
            matrix: rz.matrix * ry.matrix * rx.matrix,
        }
    }

    pub fn from_angles(angles: &EulerAngles) -> Self {
        Self::euler_degrees(angles.rx, angles.ry, angles.rz)
    }

    /// Apply this rotation to a 3D point.
    pub fn apply(&self, point: &[f64; 3]) -> [f64; 3] {
        let v = self.matrix * Vector3::new(point[0], point[1], point[2]);
        [v.x, v.y, v.z]
    }

    /// Apply this rotation to every point of a set.
    pub fn apply_points(&self, points: &PointSet) -> PointSet {
        points.map(|p| self.apply(p))
    }

    /// Compose two transforms: self followed by other.
    pub fn then(&self, other: &Transform) -> Transform {
        Transform {
            matrix: other.matrix * self.matrix,
        }
    }

    pub fn determinant(&self) -> f64 {
        self.matrix.determinant()
    }

    /// Whether $R^T R = I$ within `tol` element-wise.
    pub fn is_orthonormal(&self, tol: f64) -> bool {
        let product = self.matrix.transpose() * self.matrix;
        (product - Matrix3::identity()).abs().max() <= tol
    }
}
