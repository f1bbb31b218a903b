//! Rotation representations and conversions.
//!
//! Euler angles (extrinsic X-Y-Z, see the crate-level docs), rotation
//! matrices, and Rodrigues (axis-angle) vectors. Conversions validate their
//! input: a matrix that is not proper orthonormal within tolerance is
//! reported as [`TransformError::InvalidRotation`], never silently
//! re-normalized.

use nalgebra::{Rotation3, Unit, UnitQuaternion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{Mat3, Real, Vec3};

/// Tolerance on `|det(R) - 1|` and on the orthonormality residual
/// `||RᵗR - I||` beyond which a matrix is rejected as a rotation.
pub const ROTATION_TOL: Real = 1e-3;

/// Errors from rigid-transform conversions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// Matrix is not proper orthonormal within tolerance.
    #[error("matrix is not a valid rotation (det = {det:.6}, orthonormality residual = {ortho:.2e})")]
    InvalidRotation {
        /// Determinant of the offending matrix.
        det: Real,
        /// Frobenius norm of `RᵗR - I`.
        ortho: Real,
    },
    /// Matrix contains NaN or Inf entries.
    #[error("matrix contains non-finite entries")]
    NonFinite,
    /// Bottom row of a homogeneous matrix is not `(0, 0, 0, 1)`.
    #[error("matrix is not homogeneous (bottom row differs from [0, 0, 0, 1])")]
    NotHomogeneous,
}

/// Interpretation of Euler-angle values at the API boundary.
///
/// Internally all trigonometry runs in radians; callers state the unit of
/// their inputs explicitly and conversion happens once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AngleUnit {
    /// Angles are degrees (the robot-controller convention).
    #[default]
    Degrees,
    /// Angles are radians.
    Radians,
}

impl AngleUnit {
    /// Convert a value in this unit to radians.
    pub fn to_radians(&self, value: Real) -> Real {
        match self {
            AngleUnit::Degrees => value.to_radians(),
            AngleUnit::Radians => value,
        }
    }

    /// Convert a value in radians to this unit.
    pub fn from_radians(&self, value: Real) -> Real {
        match self {
            AngleUnit::Degrees => value.to_degrees(),
            AngleUnit::Radians => value,
        }
    }
}

/// Check that a matrix is a proper rotation (orthonormal, det ≈ +1).
pub fn ensure_rotation(r: &Mat3) -> Result<(), TransformError> {
    if !r.iter().all(|v| v.is_finite()) {
        return Err(TransformError::NonFinite);
    }
    let det = r.determinant();
    let ortho = (r.transpose() * r - Mat3::identity()).norm();
    if (det - 1.0).abs() > ROTATION_TOL || ortho > ROTATION_TOL {
        return Err(TransformError::InvalidRotation { det, ortho });
    }
    Ok(())
}

/// Compose a rotation matrix from Euler angles.
///
/// Extrinsic X-Y-Z convention: `R = Rz(rz) · Ry(ry) · Rx(rx)`, i.e. the
/// X rotation is applied first about the fixed frame.
pub fn euler_to_rotation(rx: Real, ry: Real, rz: Real, unit: AngleUnit) -> Mat3 {
    let rot = Rotation3::from_euler_angles(
        unit.to_radians(rx),
        unit.to_radians(ry),
        unit.to_radians(rz),
    );
    *rot.matrix()
}

/// Recover Euler angles from a rotation matrix.
///
/// Inverse of [`euler_to_rotation`]. The decomposition is not unique at
/// gimbal lock (`ry = ±90°`); there nalgebra picks one representative of
/// the one-parameter family. This is a known singularity of the Euler
/// parameterization, not an error.
pub fn rotation_to_euler(r: &Mat3, unit: AngleUnit) -> Result<(Real, Real, Real), TransformError> {
    ensure_rotation(r)?;
    let rot = Rotation3::from_matrix_unchecked(*r);
    let (rx, ry, rz) = rot.euler_angles();
    Ok((
        unit.from_radians(rx),
        unit.from_radians(ry),
        unit.from_radians(rz),
    ))
}

/// Convert a Rodrigues (axis-angle) vector to a rotation matrix.
///
/// Direction is the rotation axis, magnitude the angle in radians. This is
/// the representation vision libraries return from PnP-style pose solvers.
pub fn rodrigues_to_rotation(rvec: &Vec3) -> Mat3 {
    UnitQuaternion::from_scaled_axis(*rvec)
        .to_rotation_matrix()
        .into_inner()
}

/// Convert a rotation matrix to a Rodrigues (axis-angle) vector.
pub fn rotation_to_rodrigues(r: &Mat3) -> Result<Vec3, TransformError> {
    ensure_rotation(r)?;
    Ok(log_so3(r))
}

/// log: SO(3) -> so(3) as a 3-vector (axis * angle).
///
/// The input is assumed to be a valid rotation; use
/// [`rotation_to_rodrigues`] for checked conversion.
pub fn log_so3(r: &Mat3) -> Vec3 {
    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(*r));
    let angle = rot.angle();
    if angle < 1e-12 {
        return Vec3::zeros();
    }
    let axis: Unit<Vec3> = rot
        .axis()
        .unwrap_or_else(|| Unit::new_unchecked(Vec3::x_axis().into_inner()));
    axis.into_inner() * angle
}

/// Angle (radians) of the relative rotation `R1ᵗ · R2`.
///
/// Shared by the residual metrics and the pose-diversity report.
pub fn rotation_angle_between(r1: &Mat3, r2: &Mat3) -> Real {
    let r_rel = r1.transpose() * r2;
    let cos_theta = ((r_rel.trace() - 1.0) * 0.5).clamp(-1.0, 1.0);
    cos_theta.acos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euler_roundtrip_away_from_gimbal_lock() {
        // Deterministic sweep over a grid of angles, middle axis well away
        // from +-90 degrees.
        for &rx in &[-170.0, -45.0, 0.0, 30.0, 160.0] {
            for &ry in &[-80.0, -20.0, 0.0, 45.0, 85.0] {
                for &rz in &[-150.0, -10.0, 0.0, 60.0, 175.0] {
                    let r = euler_to_rotation(rx, ry, rz, AngleUnit::Degrees);
                    let (bx, by, bz) = rotation_to_euler(&r, AngleUnit::Degrees).unwrap();
                    assert!(
                        (bx - rx).abs() < 1e-6 && (by - ry).abs() < 1e-6 && (bz - rz).abs() < 1e-6,
                        "roundtrip failed for ({}, {}, {}): got ({}, {}, {})",
                        rx,
                        ry,
                        rz,
                        bx,
                        by,
                        bz
                    );
                }
            }
        }
    }

    #[test]
    fn euler_rotation_is_orthonormal() {
        let r = euler_to_rotation(33.0, -72.0, 141.0, AngleUnit::Degrees);
        assert!((r.transpose() * r - Mat3::identity()).norm() < 1e-12);
        assert!((r.determinant() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn z_rotation_90_degrees() {
        // 90 deg about Z maps x-hat to y-hat.
        let r = euler_to_rotation(0.0, 0.0, 90.0, AngleUnit::Degrees);
        let v = r * Vec3::x();
        assert!((v - Vec3::y()).norm() < 1e-12);
    }

    #[test]
    fn extrinsic_composition_order() {
        // R must equal Rz * Ry * Rx (X applied first about fixed axes).
        let (rx, ry, rz) = (0.3, -0.4, 0.7);
        let r = euler_to_rotation(rx, ry, rz, AngleUnit::Radians);
        let expected = euler_to_rotation(0.0, 0.0, rz, AngleUnit::Radians)
            * euler_to_rotation(0.0, ry, 0.0, AngleUnit::Radians)
            * euler_to_rotation(rx, 0.0, 0.0, AngleUnit::Radians);
        assert!((r - expected).norm() < 1e-12);
    }

    #[test]
    fn rodrigues_roundtrip() {
        let rvec = Vec3::new(0.2, -0.5, 1.1);
        let r = rodrigues_to_rotation(&rvec);
        let back = rotation_to_rodrigues(&r).unwrap();
        assert!((back - rvec).norm() < 1e-10);
    }

    #[test]
    fn non_orthonormal_matrix_rejected() {
        let mut bad = Mat3::identity();
        bad[(0, 0)] = 1.5; // scaled axis, det != 1
        let err = rotation_to_euler(&bad, AngleUnit::Degrees).unwrap_err();
        assert!(matches!(err, TransformError::InvalidRotation { .. }));
    }

    #[test]
    fn nan_matrix_rejected() {
        let mut bad = Mat3::identity();
        bad[(2, 1)] = Real::NAN;
        assert_eq!(ensure_rotation(&bad), Err(TransformError::NonFinite));
    }

    #[test]
    fn relative_angle_of_known_rotations() {
        let r1 = euler_to_rotation(0.0, 0.0, 10.0, AngleUnit::Degrees);
        let r2 = euler_to_rotation(0.0, 0.0, 55.0, AngleUnit::Degrees);
        let angle = rotation_angle_between(&r1, &r2).to_degrees();
        assert!((angle - 45.0).abs() < 1e-9);
    }
}
