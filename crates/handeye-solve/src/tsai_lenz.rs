//! Hand-eye calibration (AX = XB) using Tsai–Lenz.
//!
//! Given paired pose streams — robot poses `A_i` (gripper in the base
//! frame) and camera/target poses `B_i` — recovers the single fixed rigid
//! transform `X` satisfying `A_i⁻¹A_j · X ≈ X · B_i⁻¹B_j` over all motion
//! pairs, in a least-squares sense.
//!
//! The rotation is solved first from the axis-angle representations of the
//! relative motions, then the translation from a stacked linear system.
//! Both stages go through an SVD least-squares solve with an explicit rank
//! check; degenerate input fails loudly instead of returning a garbage
//! transform.

use log::debug;
use nalgebra::{DMatrix, DVector, Rotation3, Translation3, UnitQuaternion};
use thiserror::Error;

use handeye_core::{log_so3, skew, Iso3, Mat3, Real, Vec3};

/// Identifier reported for solutions produced by this solver.
pub const METHOD_TSAI_LENZ: &str = "Tsai-Lenz";

/// Mathematical minimum number of absolute poses for AX = XB.
pub const MIN_POSES: usize = 3;

/// Default minimum relative rotation (degrees) for a motion pair to be
/// considered usable.
pub const DEFAULT_MIN_MOTION_ANGLE_DEG: Real = 1.0;

/// Guard against near-parallel rotation axes between the two chains.
const AXIS_PARALLEL_EPS: Real = 1e-3;

/// Relative singular-value cutoff below which a stacked least-squares
/// system is treated as rank-deficient.
const RANK_EPS: Real = 1e-9;

/// Errors from the hand-eye solver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    /// The two pose lists have different lengths.
    #[error("pose count mismatch: {robot} robot poses vs {camera} camera poses")]
    CountMismatch { robot: usize, camera: usize },
    /// Fewer absolute poses than the mathematical minimum.
    #[error("insufficient poses: need at least {needed}, got {got}")]
    InsufficientPoses { needed: usize, got: usize },
    /// The motion set does not constrain X (too few usable pairs, or a
    /// rank-deficient least-squares system).
    #[error("degenerate solve: {reason}")]
    SolveDegenerate { reason: String },
}

/// Result of a successful hand-eye solve.
#[derive(Debug, Clone)]
pub struct HandEyeSolution {
    /// The recovered hand-eye transform X.
    pub transform: Iso3,
    /// Number of motion pairs that survived filtering and entered the
    /// least-squares systems.
    pub pairs_used: usize,
    /// Method identifier (see [`METHOD_TSAI_LENZ`]).
    pub method: &'static str,
}

/// Relative motion pair for Tsai–Lenz:
/// A: relative motion in the robot chain, B: in the camera/target chain.
#[derive(Debug, Clone, Copy)]
pub struct MotionPair {
    pub rot_a: Mat3,
    pub rot_b: Mat3,
    pub tra_a: Vec3,
    pub tra_b: Vec3,
}

fn make_motion_pair(a_i: &Iso3, b_i: &Iso3, a_j: &Iso3, b_j: &Iso3) -> MotionPair {
    let delta_a = a_i.inverse() * a_j;
    let delta_b = b_i.inverse() * b_j;

    MotionPair {
        rot_a: *delta_a.rotation.to_rotation_matrix().matrix(),
        rot_b: *delta_b.rotation.to_rotation_matrix().matrix(),
        tra_a: delta_a.translation.vector,
        tra_b: delta_b.translation.vector,
    }
}

/// Check if a motion pair is usable:
/// - has sufficient rotation in both chains,
/// - rejects near-parallel rotation axes (ill-conditioned).
fn is_good_pair(pair: &MotionPair, min_angle: Real) -> bool {
    let alpha = log_so3(&pair.rot_a);
    let beta = log_so3(&pair.rot_b);
    let norm_a = alpha.norm();
    let norm_b = beta.norm();
    let min_rot = norm_a.min(norm_b);

    if min_rot < min_angle {
        debug!(
            "motion pair rejected: small rotation {:.3} deg",
            min_rot.to_degrees()
        );
        return false;
    }

    if norm_a > 1e-9 && norm_b > 1e-9 {
        let sin_axis = alpha.normalize().cross(&beta.normalize()).norm();
        if sin_axis < AXIS_PARALLEL_EPS {
            debug!("motion pair rejected: near-parallel axes");
            return false;
        }
    }

    true
}

/// Build all usable motion pairs from the two pose streams.
///
/// Pairs with too-small relative rotation or near-parallel rotation axes
/// are dropped to improve conditioning.
pub fn build_motion_pairs(
    robot: &[Iso3],
    camera: &[Iso3],
    min_motion_angle_deg: Real,
) -> Result<Vec<MotionPair>, SolveError> {
    if robot.len() != camera.len() {
        return Err(SolveError::CountMismatch {
            robot: robot.len(),
            camera: camera.len(),
        });
    }
    if robot.len() < MIN_POSES {
        return Err(SolveError::InsufficientPoses {
            needed: MIN_POSES,
            got: robot.len(),
        });
    }

    let num_poses = robot.len();
    let min_angle = min_motion_angle_deg.to_radians();
    let mut pairs = Vec::with_capacity(num_poses * (num_poses - 1) / 2);

    for i in 0..(num_poses - 1) {
        for j in (i + 1)..num_poses {
            let pair = make_motion_pair(&robot[i], &camera[i], &robot[j], &camera[j]);
            if is_good_pair(&pair, min_angle) {
                pairs.push(pair);
            } else {
                debug!("skipping pair ({},{})", i, j);
            }
        }
    }

    if pairs.len() < 2 {
        return Err(SolveError::SolveDegenerate {
            reason: format!(
                "only {} usable motion pair(s) after filtering; poses are too similar",
                pairs.len()
            ),
        });
    }

    Ok(pairs)
}

/// Modified Rodrigues vector `2·sin(θ/2)·axis` of a relative rotation.
fn modified_rodrigues(r: &Mat3) -> Vec3 {
    let v = log_so3(r);
    let theta = v.norm();
    if theta < 1e-12 {
        return Vec3::zeros();
    }
    (v / theta) * (2.0 * (theta * 0.5).sin())
}

/// SVD least squares with a rank check on the 3-column stacked system.
fn llsq_3(a: &DMatrix<Real>, b: &DVector<Real>, what: &str) -> Result<Vec3, SolveError> {
    let svd = a.clone().svd(true, true);
    let sv = &svd.singular_values;
    let s_max = sv.iter().cloned().fold(0.0, Real::max);
    let s_min = sv.iter().cloned().fold(Real::INFINITY, Real::min);
    if s_max <= 0.0 || s_min < RANK_EPS * s_max {
        return Err(SolveError::SolveDegenerate {
            reason: format!("{} system is rank-deficient", what),
        });
    }

    let x = svd
        .solve(b, 1e-12)
        .map_err(|_| SolveError::SolveDegenerate {
            reason: format!("{} least-squares solve failed", what),
        })?;
    Ok(Vec3::new(x[0], x[1], x[2]))
}

// ---------- Tsai–Lenz rotation over all pairs ----------

fn estimate_rotation(pairs: &[MotionPair]) -> Result<Mat3, SolveError> {
    let num_pairs = pairs.len();
    let mut m = DMatrix::<Real>::zeros(3 * num_pairs, 3);
    let mut rhs = DVector::<Real>::zeros(3 * num_pairs);

    for (idx, p) in pairs.iter().enumerate() {
        let pa = modified_rodrigues(&p.rot_a);
        let pb = modified_rodrigues(&p.rot_b);

        let row = 3 * idx;
        m.view_mut((row, 0), (3, 3)).copy_from(&skew(&(pa + pb)));
        rhs.rows_mut(row, 3).copy_from(&(pb - pa));
    }

    let p_prime = llsq_3(&m, &rhs, "rotation")?;

    // Recover the full rotation vector, then the matrix, from the
    // intermediate solution (Tsai & Lenz, eqs. 14-15).
    let p = p_prime * (2.0 / (1.0 + p_prime.norm_squared()).sqrt());
    let n2 = p.norm_squared();
    let rot = Mat3::identity() * (1.0 - n2 * 0.5)
        + (p * p.transpose() + skew(&p) * (4.0 - n2).sqrt()) * 0.5;

    Ok(rot)
}

// ---------- Tsai–Lenz translation over all pairs ----------

fn estimate_translation(pairs: &[MotionPair], rot_x: &Mat3) -> Result<Vec3, SolveError> {
    let num_pairs = pairs.len();
    let mut m = DMatrix::<Real>::zeros(3 * num_pairs, 3);
    let mut rhs = DVector::<Real>::zeros(3 * num_pairs);

    for (idx, p) in pairs.iter().enumerate() {
        let row = 3 * idx;
        m.view_mut((row, 0), (3, 3))
            .copy_from(&(p.rot_a - Mat3::identity()));
        rhs.rows_mut(row, 3).copy_from(&(rot_x * p.tra_b - p.tra_a));
    }

    llsq_3(&m, &rhs, "translation")
}

/// Solve AX = XB for the hand-eye transform using Tsai–Lenz.
///
/// `robot` are per-pose gripper-in-base transforms, `camera` the paired
/// target/camera transforms. Both lists must be index-aligned and have
/// length ≥ [`MIN_POSES`]. `min_motion_angle_deg` controls the minimum
/// relative rotation used to build motion pairs.
///
/// All angles here are radians internally; unit conversion belongs to the
/// caller's boundary.
pub fn solve_tsai_lenz(
    robot: &[Iso3],
    camera: &[Iso3],
    min_motion_angle_deg: Real,
) -> Result<HandEyeSolution, SolveError> {
    let pairs = build_motion_pairs(robot, camera, min_motion_angle_deg)?;
    debug!("solving with {} motion pairs", pairs.len());

    let rot_x = estimate_rotation(&pairs)?;
    let tra_x = estimate_translation(&pairs, &rot_x)?;

    let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(rot_x));
    let transform = Iso3::from_parts(Translation3::from(tra_x), rot);

    Ok(HandEyeSolution {
        transform,
        pairs_used: pairs.len(),
        method: METHOD_TSAI_LENZ,
    })
}
