//! Mathematical type definitions and small helpers.
//!
//! Provides the fundamental types used throughout the workspace and a few
//! utilities shared by the solver and the metrics.

use nalgebra::{Isometry3, Matrix3, Matrix4, Vector3};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 4×4 matrix with [`Real`] entries.
pub type Mat4 = Matrix4<Real>;
/// 3D rigid transform (SE(3)) using [`Real`].
pub type Iso3 = Isometry3<Real>;

/// Skew-symmetric (cross-product) matrix of a 3-vector.
///
/// `skew(v) * w == v.cross(&w)` for all `w`.
pub fn skew(v: &Vec3) -> Mat3 {
    Mat3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Extract the 3×3 rotation block of a homogeneous matrix.
pub fn rotation_block(t: &Mat4) -> Mat3 {
    t.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Extract the translation column of a homogeneous matrix.
pub fn translation_block(t: &Mat4) -> Vec3 {
    Vec3::new(t[(0, 3)], t[(1, 3)], t[(2, 3)])
}

/// Assemble a homogeneous matrix from rotation and translation blocks.
pub fn compose_homogeneous(r: &Mat3, t: &Vec3) -> Mat4 {
    let mut out = Mat4::identity();
    out.fixed_view_mut::<3, 3>(0, 0).copy_from(r);
    out.fixed_view_mut::<3, 1>(0, 3).copy_from(t);
    out
}

/// True if every entry of the matrix is finite (no NaN/Inf).
pub fn is_finite_mat4(t: &Mat4) -> bool {
    t.iter().all(|v| v.is_finite())
}
