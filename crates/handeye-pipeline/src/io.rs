//! Robot-pose file ingestion.
//!
//! Robot controllers export pose tables with either `x,y,z,rx,ry,rz` or
//! `X,Y,Z,A,B,C` headers (A/B/C being the controller spelling of the three
//! Euler angles). The aliases are accepted here, at the boundary, and
//! normalized to `rx/ry/rz` immediately; nothing downstream ever sees
//! A/B/C.

use std::io::Read;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use handeye_core::{EulerPose, Real};

use crate::types::RobotPoseSample;

#[derive(Debug, Deserialize)]
struct RawPoseRow {
    /// Explicit capture index; row order is used when absent.
    #[serde(alias = "Index", default)]
    index: Option<usize>,
    #[serde(alias = "X")]
    x: Real,
    #[serde(alias = "Y")]
    y: Real,
    #[serde(alias = "Z")]
    z: Real,
    #[serde(alias = "Rx", alias = "RX", alias = "A", alias = "a")]
    rx: Real,
    #[serde(alias = "Ry", alias = "RY", alias = "B", alias = "b")]
    ry: Real,
    #[serde(alias = "Rz", alias = "RZ", alias = "C", alias = "c")]
    rz: Real,
}

/// Parse a robot-pose CSV from any reader.
///
/// Returns samples in file order; each row's pose index is the explicit
/// `index` column when present, the zero-based row number otherwise.
pub fn read_robot_poses_csv<R: Read>(reader: R) -> Result<Vec<RobotPoseSample>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut samples = Vec::new();
    for (row_idx, record) in csv_reader.deserialize::<RawPoseRow>().enumerate() {
        let row = record.with_context(|| format!("invalid robot pose row {}", row_idx + 1))?;
        let pose = EulerPose::new(row.x, row.y, row.z, row.rx, row.ry, row.rz);
        ensure!(
            pose.is_finite(),
            "robot pose row {} contains non-finite values",
            row_idx + 1
        );
        samples.push(RobotPoseSample {
            index: row.index.unwrap_or(row_idx),
            pose,
        });
    }

    ensure!(!samples.is_empty(), "robot pose file contains no rows");
    Ok(samples)
}

/// Load a robot-pose CSV from disk.
pub fn load_robot_poses_csv(path: &Path) -> Result<Vec<RobotPoseSample>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open robot pose file {}", path.display()))?;
    read_robot_poses_csv(file)
}
