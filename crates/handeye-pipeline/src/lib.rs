//! Calibration-run orchestration for hand-eye calibration.
//!
//! This crate wraps the pure math of `handeye-core` and `handeye-solve`
//! with everything a calibration run needs at its boundary:
//!
//! - the data contract with the image-pose-estimation and robot-pose
//!   collaborators ([`types`]),
//! - sanity checks on the paired pose lists before solving ([`validate`]),
//! - robot-pose file ingestion with A/B/C column aliases ([`io`]),
//! - the run state machine `Pending → Processing → {Completed, Failed}`
//!   ([`run`]).
//!
//! The orchestrator never propagates an error past its own boundary: a run
//! always ends with a structured [`CalibrationOutput`](types::CalibrationOutput),
//! successful or not, so callers can render actionable diagnostics.

/// Robot-pose file ingestion.
pub mod io;
/// Calibration run state machine.
pub mod run;
/// Boundary data contract types.
pub mod types;
/// Pose-pair validation.
pub mod validate;

pub use run::*;
pub use types::*;
pub use validate::*;

use handeye_core::TransformError;
use handeye_solve::{MetricsError, SolveError};
use thiserror::Error;

/// Failure taxonomy for a calibration run.
///
/// Each variant is terminal for the current run: nothing is retried
/// internally, and the failure surfaces with enough context (pose index,
/// failed check) for the caller to fix the input and start a new run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    /// Zero usable camera poses from the vision collaborator.
    #[error("no calibration target detections available")]
    NoDetections,
    /// The pose-pair validator reported hard failures.
    #[error("pose validation failed: {}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
    /// A pose could not be converted to a rigid transform.
    #[error("{list} pose {index} is not a rigid transform: {source}")]
    InvalidPose {
        list: PoseList,
        index: usize,
        source: TransformError,
    },
    /// The AX = XB solve failed.
    #[error(transparent)]
    Solve(#[from] SolveError),
    /// The residual metrics could not be computed.
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
