//! Pose-pair sanity checks before solving.
//!
//! The validator inspects the two aligned transform lists and reports hard
//! failures (which abort the run) separately from advisory warnings. It
//! never mutates its inputs.

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use handeye_core::{is_finite_mat4, rotation_angle_between, rotation_block, translation_block, Mat4};

use crate::types::CalibrationOptions;

/// Which of the two input lists a finding refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoseList {
    Robot,
    Camera,
}

impl std::fmt::Display for PoseList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoseList::Robot => write!(f, "robot"),
            PoseList::Camera => write!(f, "camera"),
        }
    }
}

/// Hard validation failures. Any of these makes the pose set unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// The two lists have different lengths; index alignment is broken.
    #[error("pose count mismatch: {robot} robot poses vs {camera} camera poses")]
    CountMismatch { robot: usize, camera: usize },
    /// Fewer usable pairs than the mathematical minimum.
    #[error("insufficient poses: need at least {needed}, got {got}")]
    InsufficientPoses { needed: usize, got: usize },
    /// A transform contains NaN or Inf entries.
    #[error("{list} pose {index} contains NaN or Inf values")]
    DegeneratePose { list: PoseList, index: usize },
}

/// Structured validation result.
///
/// `valid` is false exactly when `errors` is non-empty; warnings are
/// advisory and never block a solve on their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseValidation {
    pub valid: bool,
    pub usable_count: usize,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

/// Sanity-check two aligned pose lists before solving.
///
/// Hard failures: length mismatch, fewer than `opts.min_poses` usable
/// pairs, NaN/Inf entries. Warnings: usable count below
/// `opts.recommended_poses`, and near-identical robot poses (duplicates add
/// no constraint and usually indicate a capture mistake).
pub fn validate_pose_pairs(
    robot: &[Mat4],
    camera: &[Mat4],
    opts: &CalibrationOptions,
) -> PoseValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if robot.len() != camera.len() {
        errors.push(ValidationError::CountMismatch {
            robot: robot.len(),
            camera: camera.len(),
        });
    }

    let usable_count = robot.len().min(camera.len());
    if usable_count < opts.min_poses {
        errors.push(ValidationError::InsufficientPoses {
            needed: opts.min_poses,
            got: usable_count,
        });
    }

    for (list, poses) in [(PoseList::Robot, robot), (PoseList::Camera, camera)] {
        for (index, pose) in poses.iter().enumerate() {
            if !is_finite_mat4(pose) {
                errors.push(ValidationError::DegeneratePose { list, index });
            }
        }
    }

    check_duplicate_robot_poses(robot, opts, &mut warnings);

    if usable_count >= opts.min_poses && usable_count < opts.recommended_poses {
        warnings.push(format!(
            "only {} pose pairs provided; {}-15 recommended for a robust calibration",
            usable_count, opts.recommended_poses
        ));
    }

    for w in &warnings {
        warn!("pose validation: {}", w);
    }

    PoseValidation {
        valid: errors.is_empty(),
        usable_count,
        errors,
        warnings,
    }
}

fn check_duplicate_robot_poses(
    robot: &[Mat4],
    opts: &CalibrationOptions,
    warnings: &mut Vec<String>,
) {
    let rot_tol = opts.duplicate_rotation_tol_deg.to_radians();

    for i in 0..robot.len() {
        if !is_finite_mat4(&robot[i]) {
            continue;
        }
        for j in (i + 1)..robot.len() {
            if !is_finite_mat4(&robot[j]) {
                continue;
            }
            let dt = (translation_block(&robot[i]) - translation_block(&robot[j])).norm();
            if dt > opts.duplicate_translation_tol {
                continue;
            }
            let dr = rotation_angle_between(&rotation_block(&robot[i]), &rotation_block(&robot[j]));
            if dr <= rot_tol {
                warnings.push(format!(
                    "robot poses {} and {} are nearly identical; duplicates add no constraint",
                    i, j
                ));
                break; // one warning per originating pose is enough
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handeye_core::{pose_to_matrix, AngleUnit, EulerPose, Real};

    fn pose_mat(x: Real, rz_deg: Real) -> Mat4 {
        pose_to_matrix(
            &EulerPose::new(x, 0.0, 0.0, 0.0, 0.0, rz_deg),
            AngleUnit::Degrees,
        )
    }

    fn varied_poses(n: usize) -> Vec<Mat4> {
        (0..n)
            .map(|k| pose_mat(k as Real * 10.0, k as Real * 15.0))
            .collect()
    }

    #[test]
    fn aligned_varied_lists_pass() {
        let robot = varied_poses(10);
        let camera = varied_poses(10);
        let result = validate_pose_pairs(&robot, &camera, &CalibrationOptions::default());
        assert!(result.valid);
        assert_eq!(result.usable_count, 10);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn length_mismatch_fails() {
        let robot = varied_poses(5);
        let camera = varied_poses(6);
        let result = validate_pose_pairs(&robot, &camera, &CalibrationOptions::default());
        assert!(!result.valid);
        assert!(result
            .errors
            .contains(&ValidationError::CountMismatch { robot: 5, camera: 6 }));
        let rendered = result.errors[0].to_string();
        assert!(rendered.contains("mismatch"), "message: {}", rendered);
    }

    #[test]
    fn two_poses_is_insufficient() {
        let robot = varied_poses(2);
        let camera = varied_poses(2);
        let result = validate_pose_pairs(&robot, &camera, &CalibrationOptions::default());
        assert!(!result.valid);
        assert!(result
            .errors
            .contains(&ValidationError::InsufficientPoses { needed: 3, got: 2 }));
    }

    #[test]
    fn nan_entry_is_degenerate() {
        let mut robot = varied_poses(5);
        robot[3][(1, 2)] = Real::NAN;
        let camera = varied_poses(5);
        let result = validate_pose_pairs(&robot, &camera, &CalibrationOptions::default());
        assert!(!result.valid);
        assert!(result.errors.contains(&ValidationError::DegeneratePose {
            list: PoseList::Robot,
            index: 3
        }));
    }

    #[test]
    fn duplicate_robot_poses_warn_but_pass() {
        let mut robot = varied_poses(9);
        robot[7] = robot[2];
        let camera = varied_poses(9);
        let result = validate_pose_pairs(&robot, &camera, &CalibrationOptions::default());
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.contains("2 and 7")));
    }

    #[test]
    fn recaptured_pose_within_tolerance_warns() {
        // Not bit-exact: a re-captured stop a few hundredths of a unit and
        // a few millidegrees away must still be flagged as a duplicate.
        let mut robot = varied_poses(9);
        robot[7] = pose_mat(20.03, 30.002);
        let camera = varied_poses(9);
        let result = validate_pose_pairs(&robot, &camera, &CalibrationOptions::default());
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.contains("2 and 7")));
    }

    #[test]
    fn few_poses_warn_but_pass() {
        let robot = varied_poses(4);
        let camera = varied_poses(4);
        let result = validate_pose_pairs(&robot, &camera, &CalibrationOptions::default());
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.contains("recommended")));
    }
}
