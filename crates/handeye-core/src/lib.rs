//! Core rigid-transform algebra for `handeye-rs`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec3`, `Mat3`, `Mat4`, `Iso3`),
//! - conversions between Euler-angle poses, rotation matrices, Rodrigues
//!   vectors, and 4×4 homogeneous matrices,
//! - the checked bridge between wire-format matrices and internal SE(3)
//!   isometries.
//!
//! # Euler convention
//!
//! All Euler-angle conversions use the **extrinsic X-Y-Z** convention:
//! rotations about the fixed axes X, then Y, then Z, composing to
//! `R = Rz(rz) · Ry(ry) · Rx(rx)`. This matches
//! `nalgebra::Rotation3::from_euler_angles(roll, pitch, yaw)` and is held
//! constant everywhere in the workspace; swapping the convention silently
//! changes the calibration result.

/// Linear algebra type aliases and small matrix helpers.
pub mod math;
/// Euler-angle pose records and homogeneous-matrix conversions.
pub mod pose;
/// Rotation representations and conversions.
pub mod rotation;

pub use math::*;
pub use pose::*;
pub use rotation::*;
