use crate::math::Real;

/// Errors raised by the pairwise overlap query.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum OverlapError {
    /// The particle centers are closer than the partner's bounding radius,
    /// so no spherical cap on the primary particle can contain the contact
    /// region.
    #[error(
        "center distance {distance} is within the partner's bounding radius {partner_max_rad}"
    )]
    CenterInsideOther {
        /// Distance between the two particle centers.
        distance: Real,
        /// Bounding radius of the partner particle.
        partner_max_rad: Real,
    },
}
