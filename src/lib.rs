/*!
spharm3d
========

**spharm3d** is a geometric/numerical engine for contact detection and
volumetric overlap force computation between non-spherical rigid particles
whose surfaces are truncated real spherical-harmonic expansions
r(θ,φ) = Σ a_{n,m} Y_n^m(θ,φ).

The crate provides:

* a shape oracle returning the surface radius, its angular gradients and the
  outward (non-unit) surface normal for any direction ([`shape::HarmonicShape`]);
* a one-time shape initialization pipeline computing quadrature tables,
  volume, principal inertia and its body-frame quaternion, the maximum
  surface radius and the per-degree expansion factors
  ([`shape::ShapeBuilder`]);
* a progressive-degree point-inclusion test with sound early exit
  ([`shape::HarmonicShape::check_contact`]);
* a pairwise overlap integrator yielding overlap volume, normal force and
  torque for two particles in contact ([`query::OverlapSolver`]);
* a Wigner-d based rotation of spherical-harmonic coefficient vectors
  ([`transformation::WignerTable`]).

The surrounding simulation loop (integration, neighbor search, force
accumulation across particles) is the host's concern: shapes are immutable
once built, every query is a pure function of its arguments, and independent
pair evaluations may run in parallel.
*/

#![deny(non_camel_case_types)]
#![deny(unused_parens)]
#![deny(non_upper_case_globals)]
#![warn(missing_docs)]
#![warn(unused_imports)]
#![allow(missing_copy_implementations)]
#![allow(clippy::too_many_arguments)] // Quadrature plumbing takes many scalars.
#![allow(clippy::module_inception)]

#[cfg(feature = "serde-serialize")]
#[macro_use]
extern crate serde;
#[cfg_attr(test, macro_use)]
extern crate approx;
extern crate nalgebra as na;
extern crate num_traits as num;

pub mod mass_properties;
pub mod query;
pub mod shape;
pub mod transformation;
pub mod utils;

/// Aliases for the mathematical types used throughout this crate.
pub mod math {
    pub use na::{Matrix3, Point3, UnitQuaternion, UnitVector3, Vector3};

    /// The scalar type used throughout this crate.
    pub type Real = f64;

    /// The default tolerance used for geometric operations.
    pub const DEFAULT_EPSILON: Real = Real::EPSILON;

    /// The dimension of the space.
    pub const DIM: usize = 3;

    /// The point type.
    pub type Point = Point3<Real>;

    /// The vector type.
    pub type Vector = Vector3<Real>;

    /// The unit vector type.
    pub type UnitVector = UnitVector3<Real>;

    /// The matrix type.
    pub type Matrix = Matrix3<Real>;

    /// The rotation type (body frame → space frame).
    pub type Rotation = UnitQuaternion<Real>;
}
