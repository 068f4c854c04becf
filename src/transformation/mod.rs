//! Transformations of spherical-harmonic coefficient vectors.

pub use self::wigner::{rotate_coefficients, RotationError, WignerTable};

mod wigner;
