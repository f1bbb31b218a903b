//! High-level entry crate for the `handeye-rs` toolbox.
//!
//! Hand-eye calibration recovers the fixed rigid transform X between a
//! robot's end-effector and a camera from paired observations of robot
//! poses and camera-observed calibration-target poses (the classical
//! `AX = XB` problem).
//!
//! ## Run API (orchestrated)
//!
//! Feed both pose streams into a [`pipeline::CalibrationRun`] and process
//! it; the run always ends with a structured output, successful or not:
//!
//! ```no_run
//! use handeye::pipeline::{CalibrationOptions, CalibrationRun, CameraObservation, RobotPoseSample};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut run = CalibrationRun::new(CalibrationOptions::default());
//!
//! let robot_poses: Vec<RobotPoseSample> = /* from controller export */
//! # vec![];
//! let detections: Vec<CameraObservation> = /* from the vision collaborator */
//! # vec![];
//!
//! run.add_robot_poses(robot_poses)?;
//! for obs in detections {
//!     run.add_camera_observation(obs)?;
//! }
//!
//! let output = run.process()?;
//! if output.success {
//!     println!("X = {:?}", output.transform);
//!     println!("mean residual = {:?}", output.residual_error_mean);
//! } else {
//!     eprintln!("calibration failed: {:?}", output.error_message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Function API (building blocks)
//!
//! For custom workflows, call the layers directly: transform algebra in
//! [`core`], the Tsai–Lenz solver and quality metrics in [`solve`], and
//! validation in [`pipeline`]:
//!
//! ```no_run
//! use handeye::core::Iso3;
//! use handeye::solve::{residual_error, solve_tsai_lenz};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let robot: Vec<Iso3> = /* gripper-in-base poses */
//! # vec![];
//! let camera: Vec<Iso3> = /* target-to-camera poses */
//! # vec![];
//!
//! let solution = solve_tsai_lenz(&robot, &camera, 1.0)?;
//! let report = residual_error(&solution.transform, &robot, &camera)?;
//! println!("mean AX - XB residual: {:.6}", report.mean_error);
//! # Ok(())
//! # }
//! ```

/// Rigid-transform algebra and pose types.
pub use handeye_core as core;
/// Run orchestration, validation, and the boundary data contract.
pub use handeye_pipeline as pipeline;
/// Tsai–Lenz solver and calibration quality metrics.
pub use handeye_solve as solve;
