//! Hand-eye solver and calibration quality metrics.
//!
//! This crate contains:
//! - the Tsai–Lenz closed-form solver for the hand-eye equation `AX = XB`
//!   ([`tsai_lenz`]),
//! - residual and pose-diversity metrics that judge the quality of a solved
//!   calibration and of the captured pose set ([`metrics`]).
//!
//! All functions are pure: same inputs give same outputs, with no global
//! state. Runs are independent and may execute on separate threads.

/// Residual consistency and pose-diversity metrics.
pub mod metrics;
/// Tsai–Lenz AX = XB solver.
pub mod tsai_lenz;

pub use metrics::*;
pub use tsai_lenz::*;
