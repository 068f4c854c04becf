//! Pairwise geometric queries between spherical-harmonic particles.

pub use self::error::OverlapError;
pub use self::overlap::{OverlapResult, OverlapSolver};

mod error;
mod overlap;
