//! Spherical-harmonic shapes, their initialization pipeline and catalog.

pub use self::catalog::{ShapeCatalog, ShapeHandle};
pub use self::fitting::fit_coefficients;
pub use self::harmonic_shape::{coefficient_index, coefficient_len, HarmonicShape};
pub use self::shape_builder::{ShapeBuilder, ShapeBuilderError};

mod catalog;
mod fitting;
mod harmonic_shape;
mod shape_builder;
