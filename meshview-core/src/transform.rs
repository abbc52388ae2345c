//! 3D transformation utilities

use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// An affine transformation applied to scene content
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Rotation about the Y axis, angle in degrees
    pub fn rotation_y(degrees: f32) -> Self {
        Self {
            matrix: Matrix4::from_axis_angle(&Vector3::y_axis(), degrees.to_radians()),
        }
    }

    /// Rotation about the X axis, angle in degrees
    pub fn rotation_x(degrees: f32) -> Self {
        Self {
            matrix: Matrix4::from_axis_angle(&Vector3::x_axis(), degrees.to_radians()),
        }
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        self.matrix.transform_point(point)
    }

    /// Compose this transformation with another, `other` is applied first
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Get the inverse transformation
    pub fn inverse(self) -> Option<Self> {
        self.matrix.try_inverse().map(|inv_matrix| Self {
            matrix: inv_matrix,
        })
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Transform3D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

impl From<Matrix4<f32>> for Transform3D {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_translation_then_rotation() {
        let t = Transform3D::rotation_y(90.0) * Transform3D::translation(Vector3::new(1.0, 0.0, 0.0));
        let p = t.transform_point(&Point3::origin());

        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_inverse() {
        let t = Transform3D::translation(Vector3::new(2.0, 3.0, 4.0)) * Transform3D::rotation_x(30.0);
        let back = t.inverse().unwrap() * t;
        assert_relative_eq!(back.matrix, Matrix4::identity(), epsilon = 1e-5);
    }
}
