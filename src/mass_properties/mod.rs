//! Volume and inertial properties of spherical-harmonic shapes.

pub use self::mass_properties::{MassProperties, MassPropertiesError};

mod mass_properties;
