//! Calibration run state machine.
//!
//! A run owns the full lifecycle of one calibration:
//! `Pending → Processing → {Completed, Failed}`. It becomes `Processing`
//! once both collaborators have supplied at least one entry, and
//! [`CalibrationRun::process`] drives pose-pair assembly, validation,
//! solve, and metrics in one forward pass.
//!
//! Calibration-domain failures never escape as `Err`: the run transitions
//! to `Failed` and the reason is preserved in the structured output. There
//! are no automatic retries; a failed run is terminal and must be
//! re-created with corrected inputs.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use handeye_core::{iso_from_matrix, matrix_from_iso, Iso3, Mat4};
use handeye_solve::{pose_diversity, residual_error, solve_tsai_lenz};

use crate::types::{
    matrix_to_nested, CalibrationOptions, CalibrationOutput, CameraObservation, RobotPoseSample,
};
use crate::validate::{validate_pose_pairs, PoseList};
use crate::CalibrationError;

/// Lifecycle state of a calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Waiting for input from at least one collaborator.
    Pending,
    /// Both pose sources have supplied data; ready to process.
    Processing,
    /// Processed successfully; output holds the transform and metrics.
    Completed,
    /// Processing failed; output holds the preserved failure reason.
    Failed,
}

/// Misuse of the run lifecycle (distinct from calibration failures, which
/// are reported through the output record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RunStateError {
    /// The run already finished; results are immutable.
    #[error("run already finished ({status:?}); create a new run with corrected inputs")]
    Terminal { status: RunStatus },
    /// Both pose sources must supply at least one entry before processing.
    #[error("run is not ready to process (status {status:?})")]
    NotReady { status: RunStatus },
}

/// A single hand-eye calibration run.
#[derive(Debug, Clone)]
pub struct CalibrationRun {
    options: CalibrationOptions,
    camera_observations: Vec<CameraObservation>,
    robot_poses: Vec<RobotPoseSample>,
    status: RunStatus,
    output: Option<CalibrationOutput>,
}

impl CalibrationRun {
    pub fn new(options: CalibrationOptions) -> Self {
        Self {
            options,
            camera_observations: Vec::new(),
            robot_poses: Vec::new(),
            status: RunStatus::Pending,
            output: None,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Output of a finished run, if any.
    pub fn output(&self) -> Option<&CalibrationOutput> {
        self.output.as_ref()
    }

    /// Add one detected camera pose from the vision collaborator.
    pub fn add_camera_observation(&mut self, obs: CameraObservation) -> Result<(), RunStateError> {
        self.ensure_accepting_input()?;
        self.camera_observations.push(obs);
        self.maybe_start_processing();
        Ok(())
    }

    /// Add one robot pose from the robot-pose collaborator.
    pub fn add_robot_pose(&mut self, sample: RobotPoseSample) -> Result<(), RunStateError> {
        self.ensure_accepting_input()?;
        self.robot_poses.push(sample);
        self.maybe_start_processing();
        Ok(())
    }

    /// Add many robot poses (e.g. from [`crate::io::read_robot_poses_csv`]).
    pub fn add_robot_poses(
        &mut self,
        samples: impl IntoIterator<Item = RobotPoseSample>,
    ) -> Result<(), RunStateError> {
        for sample in samples {
            self.add_robot_pose(sample)?;
        }
        Ok(())
    }

    fn ensure_accepting_input(&self) -> Result<(), RunStateError> {
        match self.status {
            RunStatus::Pending | RunStatus::Processing => Ok(()),
            status => Err(RunStateError::Terminal { status }),
        }
    }

    fn maybe_start_processing(&mut self) {
        if self.status == RunStatus::Pending
            && !self.camera_observations.is_empty()
            && !self.robot_poses.is_empty()
        {
            self.status = RunStatus::Processing;
        }
    }

    /// Run the calibration: pair assembly → validation → solve → metrics.
    ///
    /// Only valid from `Processing`. The returned output is also retained
    /// on the run; on calibration failure the run transitions to `Failed`
    /// and the reason is preserved in the output, not raised as `Err`.
    pub fn process(&mut self) -> Result<&CalibrationOutput, RunStateError> {
        match self.status {
            RunStatus::Processing => {}
            RunStatus::Pending => return Err(RunStateError::NotReady { status: self.status }),
            status => return Err(RunStateError::Terminal { status }),
        }

        let mut warnings = Vec::new();
        let mut poses_valid = 0usize;
        let poses_processed = self.robot_poses.len();

        let output = match self.compute(&mut warnings, &mut poses_valid) {
            Ok(output) => {
                self.status = RunStatus::Completed;
                output
            }
            Err(err) => {
                warn!("calibration run failed: {}", err);
                self.status = RunStatus::Failed;
                CalibrationOutput::failure(err.to_string(), poses_processed, poses_valid, warnings)
            }
        };

        Ok(&*self.output.insert(output))
    }

    fn compute(
        &self,
        warnings: &mut Vec<String>,
        poses_valid: &mut usize,
    ) -> Result<CalibrationOutput, CalibrationError> {
        if self.camera_observations.is_empty() {
            return Err(CalibrationError::NoDetections);
        }

        let (indices, robot_mats, camera_mats) = self.assemble_pairs(warnings)?;
        *poses_valid = indices.len();
        debug!("assembled {} index-aligned pose pairs", indices.len());

        let validation = validate_pose_pairs(&robot_mats, &camera_mats, &self.options);
        warnings.extend(validation.warnings.iter().cloned());
        if !validation.valid {
            return Err(CalibrationError::Validation(validation.errors));
        }

        let robot_isos = to_isometries(&robot_mats, &indices, PoseList::Robot)?;
        let camera_isos = to_isometries(&camera_mats, &indices, PoseList::Camera)?;

        let solution = solve_tsai_lenz(
            &robot_isos,
            &camera_isos,
            self.options.min_motion_angle_deg,
        )?;
        let residuals = residual_error(&solution.transform, &robot_isos, &camera_isos)?;

        let diversity = pose_diversity(&robot_isos);
        if diversity.mean_rotation_deg < self.options.low_diversity_rotation_deg {
            warnings.push(format!(
                "low robot pose diversity: mean consecutive rotation {:.2} deg (want >= {:.1} deg)",
                diversity.mean_rotation_deg, self.options.low_diversity_rotation_deg
            ));
        }

        Ok(CalibrationOutput {
            success: true,
            transform: Some(matrix_to_nested(&matrix_from_iso(&solution.transform))),
            residual_error_mean: Some(residuals.mean_error),
            rotation_error_deg_mean: Some(residuals.rotation_error_deg_mean),
            translation_error_mean: Some(residuals.translation_error_mean),
            poses_processed: self.robot_poses.len(),
            poses_valid: *poses_valid,
            method: Some(solution.method.to_string()),
            warnings: warnings.clone(),
            error_message: None,
        })
    }

    /// Join the two inputs on their shared sequence index.
    ///
    /// Indices present on only one side are dropped and reported as
    /// warnings; misaligned lists silently produce garbage, so alignment is
    /// enforced here, before any math runs.
    fn assemble_pairs(
        &self,
        warnings: &mut Vec<String>,
    ) -> Result<(Vec<usize>, Vec<Mat4>, Vec<Mat4>), CalibrationError> {
        let mut camera_by_index: BTreeMap<usize, &CameraObservation> = BTreeMap::new();
        for obs in &self.camera_observations {
            if camera_by_index.insert(obs.index, obs).is_some() {
                warnings.push(format!(
                    "duplicate camera observation for index {}; keeping the latest",
                    obs.index
                ));
            }
        }

        let mut robot_by_index: BTreeMap<usize, &RobotPoseSample> = BTreeMap::new();
        for sample in &self.robot_poses {
            if robot_by_index.insert(sample.index, sample).is_some() {
                warnings.push(format!(
                    "duplicate robot pose for index {}; keeping the latest",
                    sample.index
                ));
            }
        }

        let mut indices = Vec::new();
        let mut robot_mats = Vec::new();
        let mut camera_mats = Vec::new();

        for (&index, sample) in &robot_by_index {
            match camera_by_index.get(&index) {
                Some(obs) => {
                    indices.push(index);
                    robot_mats.push(sample.to_transform(self.options.angle_unit));
                    camera_mats.push(obs.to_transform());
                }
                None => warnings.push(format!(
                    "robot pose index {} has no camera detection; dropped",
                    index
                )),
            }
        }
        for &index in camera_by_index.keys() {
            if !robot_by_index.contains_key(&index) {
                warnings.push(format!(
                    "camera observation index {} has no robot pose; dropped",
                    index
                ));
            }
        }

        if camera_mats.is_empty() {
            return Err(CalibrationError::NoDetections);
        }

        Ok((indices, robot_mats, camera_mats))
    }
}

fn to_isometries(
    mats: &[Mat4],
    indices: &[usize],
    list: PoseList,
) -> Result<Vec<Iso3>, CalibrationError> {
    mats.iter()
        .zip(indices.iter())
        .map(|(mat, &index)| {
            iso_from_matrix(mat).map_err(|source| CalibrationError::InvalidPose {
                list,
                index,
                source,
            })
        })
        .collect()
}
