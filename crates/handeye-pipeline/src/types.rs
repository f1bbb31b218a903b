//! Boundary data contract for a calibration run.
//!
//! These are the records exchanged with the two collaborators (the
//! image-pose estimator and the robot-pose source) and the structured
//! output returned to the caller. Everything here is serde-serializable;
//! angle units are explicit and normalized to radians exactly once, at the
//! conversion into matrices.

use serde::{Deserialize, Serialize};

use handeye_core::{
    compose_homogeneous, pose_to_matrix, rodrigues_to_rotation, AngleUnit, EulerPose, Mat3, Mat4,
    Real, Vec3,
};
use handeye_solve::DEFAULT_MIN_MOTION_ANGLE_DEG;

/// Camera-observed rotation, as produced by a vision-library pose solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RotationObs {
    /// Row-major 3×3 rotation matrix.
    Matrix([[Real; 3]; 3]),
    /// Rodrigues (axis-angle) vector, radians.
    Rodrigues([Real; 3]),
}

impl RotationObs {
    /// Expand to a 3×3 matrix. No validity check is performed here; the
    /// validator and the rigid-transform bridge do that with context.
    pub fn to_matrix(&self) -> Mat3 {
        match self {
            RotationObs::Matrix(rows) => Mat3::new(
                rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
                rows[2][1], rows[2][2],
            ),
            RotationObs::Rodrigues(v) => rodrigues_to_rotation(&Vec3::new(v[0], v[1], v[2])),
        }
    }
}

/// One detected calibration-target pose from the vision collaborator.
///
/// Entries for images where detection failed are simply absent from the
/// observation list; the shared `index` joins each observation to the robot
/// pose captured at the same stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraObservation {
    /// Shared sequence index in the capture order.
    pub index: usize,
    /// Target-to-camera rotation.
    pub rotation: RotationObs,
    /// Target-to-camera translation, length units.
    pub translation: [Real; 3],
    /// Per-image reprojection error from the detector, pixels.
    pub reproj_error_px: Option<Real>,
}

impl CameraObservation {
    /// Assemble the 4×4 homogeneous target-to-camera transform.
    pub fn to_transform(&self) -> Mat4 {
        let t = Vec3::new(
            self.translation[0],
            self.translation[1],
            self.translation[2],
        );
        compose_homogeneous(&self.rotation.to_matrix(), &t)
    }
}

/// One robot end-effector pose in the base frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotPoseSample {
    /// Shared sequence index in the capture order.
    pub index: usize,
    /// Pose as translation + extrinsic X-Y-Z Euler angles. A/B/C column
    /// names from controller exports are normalized to rx/ry/rz at
    /// ingestion ([`crate::io`]); past the boundary only rx/ry/rz exist.
    pub pose: EulerPose,
}

impl RobotPoseSample {
    /// Assemble the 4×4 homogeneous gripper-to-base transform.
    pub fn to_transform(&self, unit: AngleUnit) -> Mat4 {
        pose_to_matrix(&self.pose, unit)
    }
}

/// Tuning knobs for a calibration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationOptions {
    /// Unit of the robot-pose Euler angles.
    pub angle_unit: AngleUnit,
    /// Hard minimum number of pose pairs (3 is the mathematical floor).
    pub min_poses: usize,
    /// Pair count below which a non-fatal "capture more poses" warning is
    /// emitted (8-15 is recommended for a well-conditioned solve).
    pub recommended_poses: usize,
    /// Minimum relative rotation (degrees) for a motion pair to enter the
    /// solver's least-squares systems.
    pub min_motion_angle_deg: Real,
    /// Translation tolerance (length units) for the near-duplicate robot
    /// pose warning. Sized to catch a re-captured stop, not just bit-exact
    /// repeats.
    pub duplicate_translation_tol: Real,
    /// Rotation tolerance (degrees) for the near-duplicate robot pose
    /// warning.
    pub duplicate_rotation_tol_deg: Real,
    /// Mean consecutive rotation (degrees) below which the robot pose set
    /// is flagged as low-diversity.
    pub low_diversity_rotation_deg: Real,
}

impl Default for CalibrationOptions {
    fn default() -> Self {
        Self {
            angle_unit: AngleUnit::Degrees,
            min_poses: 3,
            recommended_poses: 8,
            min_motion_angle_deg: DEFAULT_MIN_MOTION_ANGLE_DEG,
            duplicate_translation_tol: 0.1,
            duplicate_rotation_tol_deg: 0.05,
            low_diversity_rotation_deg: 5.0,
        }
    }
}

/// Structured result of a calibration run.
///
/// Returned for failed runs too: `success == false` with the failure
/// reason in `error_message` and the numeric fields absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationOutput {
    pub success: bool,
    /// Solved hand-eye transform X as a nested row-major 4×4 array.
    pub transform: Option<[[Real; 4]; 4]>,
    /// Mean AX − XB residual (Frobenius) over all pose pairs.
    ///
    /// Earlier revisions of the collaborator contract published this value
    /// as `reprojectionErrorMean`; the name was dropped because nothing
    /// here projects a point. Integrators migrating from that contract map
    /// the old field to this one.
    pub residual_error_mean: Option<Real>,
    /// Mean rotation part of the residual, degrees.
    pub rotation_error_deg_mean: Option<Real>,
    /// Mean translation part of the residual, pose length units.
    pub translation_error_mean: Option<Real>,
    /// Robot poses supplied to the run.
    pub poses_processed: usize,
    /// Index-aligned pose pairs that entered the solve.
    pub poses_valid: usize,
    /// Solver method identifier.
    pub method: Option<String>,
    /// Non-fatal findings (dropped indices, low diversity, few poses).
    pub warnings: Vec<String>,
    /// Failure reason when `success == false`.
    pub error_message: Option<String>,
}

impl CalibrationOutput {
    pub(crate) fn failure(
        message: String,
        poses_processed: usize,
        poses_valid: usize,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            success: false,
            transform: None,
            residual_error_mean: None,
            rotation_error_deg_mean: None,
            translation_error_mean: None,
            poses_processed,
            poses_valid,
            method: None,
            warnings,
            error_message: Some(message),
        }
    }
}

/// Convert a 4×4 matrix to the nested-array wire format.
pub fn matrix_to_nested(t: &Mat4) -> [[Real; 4]; 4] {
    let mut out = [[0.0; 4]; 4];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = t[(i, j)];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use handeye_core::{euler_to_rotation, rotation_block, translation_block};

    #[test]
    fn rotation_obs_matrix_and_rodrigues_agree() {
        let r = euler_to_rotation(20.0, -35.0, 50.0, AngleUnit::Degrees);
        let rvec = handeye_core::rotation_to_rodrigues(&r).unwrap();

        let from_mat = RotationObs::Matrix([
            [r[(0, 0)], r[(0, 1)], r[(0, 2)]],
            [r[(1, 0)], r[(1, 1)], r[(1, 2)]],
            [r[(2, 0)], r[(2, 1)], r[(2, 2)]],
        ]);
        let from_vec = RotationObs::Rodrigues([rvec.x, rvec.y, rvec.z]);

        assert!((from_mat.to_matrix() - from_vec.to_matrix()).norm() < 1e-10);
    }

    #[test]
    fn camera_observation_transform_blocks() {
        let obs = CameraObservation {
            index: 0,
            rotation: RotationObs::Rodrigues([0.0, 0.0, 0.0]),
            translation: [10.0, 20.0, 30.0],
            reproj_error_px: Some(0.4),
        };
        let t = obs.to_transform();
        assert!((rotation_block(&t) - Mat3::identity()).norm() < 1e-12);
        assert!((translation_block(&t) - Vec3::new(10.0, 20.0, 30.0)).norm() < 1e-12);
    }

    #[test]
    fn nested_matrix_roundtrip() {
        let pose = EulerPose::new(1.0, 2.0, 3.0, 10.0, 20.0, 30.0);
        let t = pose_to_matrix(&pose, AngleUnit::Degrees);
        let nested = matrix_to_nested(&t);
        for i in 0..4 {
            for j in 0..4 {
                assert!((nested[i][j] - t[(i, j)]).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn options_json_roundtrip() {
        let opts = CalibrationOptions {
            min_motion_angle_deg: 2.5,
            ..Default::default()
        };
        let json = serde_json::to_string(&opts).unwrap();
        let back: CalibrationOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.min_poses, 3);
        assert!((back.min_motion_angle_deg - 2.5).abs() < 1e-12);
        assert_eq!(back.angle_unit, AngleUnit::Degrees);
    }

    #[test]
    fn observation_json_roundtrip() {
        let obs = CameraObservation {
            index: 4,
            rotation: RotationObs::Rodrigues([0.1, -0.2, 0.3]),
            translation: [5.0, -1.0, 200.0],
            reproj_error_px: None,
        };
        let json = serde_json::to_string(&obs).unwrap();
        let back: CameraObservation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, obs);
    }
}
