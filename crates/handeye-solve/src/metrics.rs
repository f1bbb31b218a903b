//! Residual and diversity metrics for hand-eye calibration.
//!
//! The primary acceptance metric is the AX − XB residual
//! ([`residual_error`]): for each pose pair the solved transform is checked
//! against the hand-eye equation directly, decomposed into rotation and
//! translation parts. [`pose_diversity`] is an input-quality signal only,
//! and [`target_consistency`] is a secondary diagnostic retained for
//! operators used to the older consistency heuristic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use handeye_core::{rotation_angle_between, Iso3, Real};

/// Errors from the metric computations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricsError {
    /// The two pose lists have different lengths.
    #[error("pose count mismatch: {robot} robot poses vs {camera} camera poses")]
    CountMismatch { robot: usize, camera: usize },
    /// No pose pairs to evaluate.
    #[error("no pose pairs to evaluate")]
    Empty,
}

/// Per-pair and aggregate AX − XB residual statistics.
///
/// The combined error is the Frobenius norm of `AX − XB` per pair; it mixes
/// rotation and translation scales, so the decomposed means are reported
/// alongside in their natural units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidualReport {
    /// Mean of the combined per-pair errors.
    pub mean_error: Real,
    /// Standard deviation of the combined per-pair errors.
    pub std_error: Real,
    /// Smallest combined per-pair error.
    pub min_error: Real,
    /// Largest combined per-pair error.
    pub max_error: Real,
    /// Combined (Frobenius) error per pose pair.
    pub individual_errors: Vec<Real>,
    /// Rotation-angle error per pair, degrees.
    pub rotation_errors_deg: Vec<Real>,
    /// Translation error per pair, in the pose length unit.
    pub translation_errors: Vec<Real>,
    /// Mean rotation error, degrees.
    pub rotation_error_deg_mean: Real,
    /// Mean translation error, pose length unit.
    pub translation_error_mean: Real,
}

/// Rotation/translation spread between consecutive poses in capture order.
///
/// Low diversity weakens the conditioning of the hand-eye solve; this is an
/// advisory signal for the operator, not a validation of the solve itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiversityReport {
    pub mean_rotation_deg: Real,
    pub max_rotation_deg: Real,
    pub min_rotation_deg: Real,
    pub mean_translation: Real,
    pub max_translation: Real,
    pub min_translation: Real,
}

/// Spread of the per-pair product `A·X·B⁻¹` around a reference.
///
/// Secondary diagnostic only: it mixes rotation and translation into one
/// heuristic scalar and is strictly weaker than the AX − XB residual. Never
/// use it as the acceptance metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Rotation deviation (deg) of each `A·X·B⁻¹` from the first pair's.
    pub rotation_deviations_deg: Vec<Real>,
    /// Translation deviation of each `A·X·B⁻¹` from the mean translation.
    pub translation_deviations: Vec<Real>,
    pub mean_rotation_deviation_deg: Real,
    pub mean_translation_deviation: Real,
}

fn mean(values: &[Real]) -> Real {
    values.iter().sum::<Real>() / values.len() as Real
}

fn std_dev(values: &[Real], mean: Real) -> Real {
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<Real>() / values.len() as Real;
    var.sqrt()
}

fn check_pairs(robot: &[Iso3], camera: &[Iso3]) -> Result<(), MetricsError> {
    if robot.len() != camera.len() {
        return Err(MetricsError::CountMismatch {
            robot: robot.len(),
            camera: camera.len(),
        });
    }
    if robot.is_empty() {
        return Err(MetricsError::Empty);
    }
    Ok(())
}

/// AX − XB residual of a solved hand-eye transform against all pose pairs.
///
/// For each pair computes `AX` and `XB`; the combined error is the
/// Frobenius norm of their difference, the rotation error the angle of
/// `rot(AX)ᵗ·rot(XB)` in degrees, and the translation error the Euclidean
/// distance between the translation components.
pub fn residual_error(
    x: &Iso3,
    robot: &[Iso3],
    camera: &[Iso3],
) -> Result<ResidualReport, MetricsError> {
    check_pairs(robot, camera)?;

    let mut individual_errors = Vec::with_capacity(robot.len());
    let mut rotation_errors_deg = Vec::with_capacity(robot.len());
    let mut translation_errors = Vec::with_capacity(robot.len());

    for (a, b) in robot.iter().zip(camera.iter()) {
        let ax = a * x;
        let xb = x * b;

        let frob = (ax.to_homogeneous() - xb.to_homogeneous()).norm();
        let rot_err = rotation_angle_between(
            ax.rotation.to_rotation_matrix().matrix(),
            xb.rotation.to_rotation_matrix().matrix(),
        )
        .to_degrees();
        let tra_err = (ax.translation.vector - xb.translation.vector).norm();

        individual_errors.push(frob);
        rotation_errors_deg.push(rot_err);
        translation_errors.push(tra_err);
    }

    let mean_error = mean(&individual_errors);
    Ok(ResidualReport {
        mean_error,
        std_error: std_dev(&individual_errors, mean_error),
        min_error: individual_errors.iter().cloned().fold(Real::INFINITY, Real::min),
        max_error: individual_errors.iter().cloned().fold(0.0, Real::max),
        rotation_error_deg_mean: mean(&rotation_errors_deg),
        translation_error_mean: mean(&translation_errors),
        individual_errors,
        rotation_errors_deg,
        translation_errors,
    })
}

/// Rotation/translation change between consecutive poses.
///
/// Returns an all-zero report for fewer than two poses.
pub fn pose_diversity(poses: &[Iso3]) -> DiversityReport {
    if poses.len() < 2 {
        return DiversityReport::default();
    }

    let mut rotations = Vec::with_capacity(poses.len() - 1);
    let mut translations = Vec::with_capacity(poses.len() - 1);

    for pair in poses.windows(2) {
        let rot = rotation_angle_between(
            pair[0].rotation.to_rotation_matrix().matrix(),
            pair[1].rotation.to_rotation_matrix().matrix(),
        )
        .to_degrees();
        let tra = (pair[1].translation.vector - pair[0].translation.vector).norm();
        rotations.push(rot);
        translations.push(tra);
    }

    DiversityReport {
        mean_rotation_deg: mean(&rotations),
        max_rotation_deg: rotations.iter().cloned().fold(0.0, Real::max),
        min_rotation_deg: rotations.iter().cloned().fold(Real::INFINITY, Real::min),
        mean_translation: mean(&translations),
        max_translation: translations.iter().cloned().fold(0.0, Real::max),
        min_translation: translations.iter().cloned().fold(Real::INFINITY, Real::min),
    }
}

/// Spread of the per-pair product `A_i · X · B_i⁻¹`.
///
/// When `A_i X = X B_i` holds exactly, every product equals X itself; with
/// noisy input the spread around the first rotation and the mean
/// translation measures inconsistency. Kept as a secondary diagnostic only;
/// prefer [`residual_error`] for acceptance decisions.
pub fn target_consistency(
    x: &Iso3,
    robot: &[Iso3],
    camera: &[Iso3],
) -> Result<ConsistencyReport, MetricsError> {
    check_pairs(robot, camera)?;

    let targets: Vec<Iso3> = robot
        .iter()
        .zip(camera.iter())
        .map(|(a, b)| a * x * b.inverse())
        .collect();

    let mean_translation = targets
        .iter()
        .fold(handeye_core::Vec3::zeros(), |acc, t| {
            acc + t.translation.vector
        })
        / targets.len() as Real;
    let ref_rot = targets[0].rotation.to_rotation_matrix();

    let mut rotation_deviations_deg = Vec::with_capacity(targets.len());
    let mut translation_deviations = Vec::with_capacity(targets.len());

    for t in &targets {
        rotation_deviations_deg.push(
            rotation_angle_between(ref_rot.matrix(), t.rotation.to_rotation_matrix().matrix())
                .to_degrees(),
        );
        translation_deviations.push((t.translation.vector - mean_translation).norm());
    }

    Ok(ConsistencyReport {
        mean_rotation_deviation_deg: mean(&rotation_deviations_deg),
        mean_translation_deviation: mean(&translation_deviations),
        rotation_deviations_deg,
        translation_deviations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Translation3};

    fn make_iso(angles: (Real, Real, Real), t: (Real, Real, Real)) -> Iso3 {
        let rot = Rotation3::from_euler_angles(angles.0, angles.1, angles.2);
        Iso3::from_parts(Translation3::new(t.0, t.1, t.2), rot.into())
    }

    fn exact_pairs(x: &Iso3, n: usize) -> (Vec<Iso3>, Vec<Iso3>) {
        let robot: Vec<Iso3> = (0..n)
            .map(|k| {
                let kf = k as Real;
                make_iso(
                    (0.12 * kf, -0.08 * kf, 0.05 * kf),
                    (0.1 * kf, 0.04 * kf, 0.7 + 0.05 * kf),
                )
            })
            .collect();
        let camera = robot.iter().map(|a| x.inverse() * a * x).collect();
        (robot, camera)
    }

    #[test]
    fn residual_is_zero_for_exact_construction() {
        let x = make_iso((0.1, -0.2, 0.3), (0.05, 0.1, -0.2));
        let (robot, camera) = exact_pairs(&x, 8);

        let report = residual_error(&x, &robot, &camera).unwrap();
        assert!(report.mean_error < 1e-10, "mean {}", report.mean_error);
        assert!(report.rotation_error_deg_mean < 1e-8);
        assert!(report.translation_error_mean < 1e-10);
        assert_eq!(report.individual_errors.len(), 8);
    }

    #[test]
    fn residual_grows_with_wrong_transform() {
        let x = make_iso((0.1, -0.2, 0.3), (0.05, 0.1, -0.2));
        let (robot, camera) = exact_pairs(&x, 8);

        let wrong = make_iso((0.3, 0.1, -0.2), (0.2, -0.1, 0.3));
        let report = residual_error(&wrong, &robot, &camera).unwrap();
        assert!(report.mean_error > 1e-3);
        assert!(report.max_error >= report.min_error);
    }

    #[test]
    fn residual_rejects_mismatched_lists() {
        let x = Iso3::identity();
        let (robot, mut camera) = exact_pairs(&x, 5);
        camera.pop();
        let err = residual_error(&x, &robot, &camera).unwrap_err();
        assert_eq!(
            err,
            MetricsError::CountMismatch {
                robot: 5,
                camera: 4
            }
        );
    }

    #[test]
    fn diversity_of_known_sequence() {
        // Consecutive 10-degree Z steps and 0.1 translation steps.
        let poses: Vec<Iso3> = (0..4)
            .map(|k| {
                make_iso(
                    (0.0, 0.0, (k as Real * 10.0).to_radians()),
                    (k as Real * 0.1, 0.0, 0.0),
                )
            })
            .collect();

        let report = pose_diversity(&poses);
        assert!((report.mean_rotation_deg - 10.0).abs() < 1e-9);
        assert!((report.max_rotation_deg - 10.0).abs() < 1e-9);
        assert!((report.mean_translation - 0.1).abs() < 1e-12);
    }

    #[test]
    fn diversity_of_single_pose_is_zero() {
        let report = pose_diversity(&[Iso3::identity()]);
        assert_eq!(report.mean_rotation_deg, 0.0);
        assert_eq!(report.mean_translation, 0.0);
    }

    #[test]
    fn consistency_is_tight_for_exact_pairs() {
        let x = make_iso((0.2, 0.1, -0.15), (0.1, 0.0, 0.3));
        let (robot, camera) = exact_pairs(&x, 6);

        // The rotation deviation of exact pairs is rounding noise pushed
        // through acos near 1, which bottoms out around sqrt(eps) radians;
        // the tolerance must sit above that floor.
        let report = target_consistency(&x, &robot, &camera).unwrap();
        assert!(report.mean_rotation_deviation_deg < 1e-5);
        assert!(report.mean_translation_deviation < 1e-10);
    }

    #[test]
    fn report_json_roundtrip() {
        let x = make_iso((0.1, -0.2, 0.3), (0.05, 0.1, -0.2));
        let (robot, camera) = exact_pairs(&x, 4);
        let report = residual_error(&x, &robot, &camera).unwrap();

        let json = serde_json::to_string(&report).unwrap();
        let back: ResidualReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.individual_errors.len(), 4);
        assert!((back.mean_error - report.mean_error).abs() < 1e-15);
    }
}
