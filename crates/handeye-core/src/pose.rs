//! Euler-angle pose records and homogeneous-matrix conversions.
//!
//! A pose is either `(x, y, z, rx, ry, rz)` — translation in length units
//! plus extrinsic X-Y-Z Euler angles — or the equivalent 4×4 homogeneous
//! matrix `T = [[R, t], [0, 1]]`.

use serde::{Deserialize, Serialize};

use crate::math::{
    compose_homogeneous, is_finite_mat4, rotation_block, translation_block, Iso3, Mat4, Real, Vec3,
};
use crate::rotation::{
    ensure_rotation, euler_to_rotation, rotation_to_euler, AngleUnit, TransformError,
};

/// A robot-style pose: translation plus extrinsic X-Y-Z Euler angles.
///
/// The angle unit is not part of the record; callers state it explicitly
/// when converting (see [`AngleUnit`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EulerPose {
    pub x: Real,
    pub y: Real,
    pub z: Real,
    pub rx: Real,
    pub ry: Real,
    pub rz: Real,
}

impl EulerPose {
    pub fn new(x: Real, y: Real, z: Real, rx: Real, ry: Real, rz: Real) -> Self {
        Self {
            x,
            y,
            z,
            rx,
            ry,
            rz,
        }
    }

    /// True if every component is finite.
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.z, self.rx, self.ry, self.rz]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Convert a full pose to a 4×4 homogeneous transformation matrix.
pub fn pose_to_matrix(pose: &EulerPose, unit: AngleUnit) -> Mat4 {
    let r = euler_to_rotation(pose.rx, pose.ry, pose.rz, unit);
    let t = Vec3::new(pose.x, pose.y, pose.z);
    compose_homogeneous(&r, &t)
}

/// Convert a 4×4 homogeneous matrix back to a pose.
///
/// Inherits the gimbal-lock ambiguity of
/// [`rotation_to_euler`](crate::rotation::rotation_to_euler).
pub fn matrix_to_pose(t: &Mat4, unit: AngleUnit) -> Result<EulerPose, TransformError> {
    let (rx, ry, rz) = rotation_to_euler(&rotation_block(t), unit)?;
    let tr = translation_block(t);
    Ok(EulerPose::new(tr.x, tr.y, tr.z, rx, ry, rz))
}

/// Closed-form inverse of a rigid homogeneous matrix.
///
/// `T⁻¹ = [[Rᵗ, -Rᵗt], [0, 1]]`. General 4×4 inversion is never used here:
/// it is numerically unnecessary for rigid transforms and would conceal
/// orthogonality bugs in the rotation block.
pub fn invert_rigid(t: &Mat4) -> Mat4 {
    let r_inv = rotation_block(t).transpose();
    let t_inv = -r_inv * translation_block(t);
    compose_homogeneous(&r_inv, &t_inv)
}

/// Checked conversion from a wire-format 4×4 matrix to an SE(3) isometry.
///
/// Rejects non-finite entries, a non-trivial bottom row, and rotation
/// blocks that are not proper orthonormal within tolerance.
pub fn iso_from_matrix(t: &Mat4) -> Result<Iso3, TransformError> {
    if !is_finite_mat4(t) {
        return Err(TransformError::NonFinite);
    }
    let bottom = [t[(3, 0)], t[(3, 1)], t[(3, 2)], t[(3, 3)] - 1.0];
    if bottom.iter().any(|v| v.abs() > 1e-9) {
        return Err(TransformError::NotHomogeneous);
    }

    let r = rotation_block(t);
    ensure_rotation(&r)?;

    let rot = nalgebra::UnitQuaternion::from_rotation_matrix(
        &nalgebra::Rotation3::from_matrix_unchecked(r),
    );
    let trans = nalgebra::Translation3::from(translation_block(t));
    Ok(Iso3::from_parts(trans, rot))
}

/// Convert an SE(3) isometry to its 4×4 homogeneous matrix.
pub fn matrix_from_iso(iso: &Iso3) -> Mat4 {
    iso.to_homogeneous()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_matrix_roundtrip() {
        let pose = EulerPose::new(100.0, -250.0, 430.0, 12.0, -48.0, 97.0);
        let t = pose_to_matrix(&pose, AngleUnit::Degrees);
        let back = matrix_to_pose(&t, AngleUnit::Degrees).unwrap();

        assert!((back.x - pose.x).abs() < 1e-9);
        assert!((back.y - pose.y).abs() < 1e-9);
        assert!((back.z - pose.z).abs() < 1e-9);
        assert!((back.rx - pose.rx).abs() < 1e-6);
        assert!((back.ry - pose.ry).abs() < 1e-6);
        assert!((back.rz - pose.rz).abs() < 1e-6);
    }

    #[test]
    fn rigid_inverse_times_forward_is_identity() {
        let pose = EulerPose::new(10.0, 20.0, 30.0, 40.0, -25.0, 110.0);
        let t = pose_to_matrix(&pose, AngleUnit::Degrees);
        let prod = invert_rigid(&t) * t;
        assert!((prod - Mat4::identity()).norm() < 1e-12);
    }

    #[test]
    fn iso_bridge_roundtrip() {
        let pose = EulerPose::new(1.0, -2.0, 3.0, 15.0, 35.0, -60.0);
        let t = pose_to_matrix(&pose, AngleUnit::Degrees);
        let iso = iso_from_matrix(&t).unwrap();
        assert!((matrix_from_iso(&iso) - t).norm() < 1e-12);
    }

    #[test]
    fn iso_from_matrix_rejects_bad_bottom_row() {
        let mut t = Mat4::identity();
        t[(3, 0)] = 0.5;
        assert_eq!(iso_from_matrix(&t), Err(TransformError::NotHomogeneous));
    }

    #[test]
    fn iso_from_matrix_rejects_scaled_rotation() {
        let mut t = Mat4::identity();
        t[(0, 0)] = 2.0;
        assert!(matches!(
            iso_from_matrix(&t),
            Err(TransformError::InvalidRotation { .. })
        ));
    }

    #[test]
    fn iso_from_matrix_rejects_nan() {
        let mut t = Mat4::identity();
        t[(0, 3)] = Real::NAN;
        assert_eq!(iso_from_matrix(&t), Err(TransformError::NonFinite));
    }

    #[test]
    fn pose_json_roundtrip() {
        let pose = EulerPose::new(1.5, 2.5, 3.5, 10.0, 20.0, 30.0);
        let json = serde_json::to_string(&pose).unwrap();
        let back: EulerPose = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pose);
    }
}
