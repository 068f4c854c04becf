use crate::math::{Matrix, Real, Rotation, Vector};
use crate::utils;
use na::Rotation3;

/// Eigenvalues below `EPSILON · max(λ)` are treated as exact zeros.
const EPSILON: Real = 1.0e-7;

/// Maximum number of cyclic Jacobi sweeps before giving up.
const MAX_JACOBI_SWEEPS: usize = 50;

/// Errors produced while computing the inertial properties of a shape.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassPropertiesError {
    /// The quadrature volume integral came out non-positive, so the inertia
    /// tensor cannot be volume-normalized.
    #[error("non-positive volume integral; the surface expansion does not enclose a volume")]
    VolumeZero,
    /// The Jacobi eigendecomposition of the inertia tensor did not converge
    /// within the sweep limit.
    #[error("inertia eigendecomposition did not converge within 50 sweeps")]
    JacobiNonConverged,
}

/// The volume and volume-normalized inertial frame of a rigid particle whose
/// surface is sampled on a Gauss–Legendre quadrature grid.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// The enclosed volume.
    pub volume: Real,
    /// Volume-normalized eigenvalues of the inertia tensor. Entries below
    /// 1e−7 of the largest one are clamped to zero.
    pub principal_inertia: Vector,
    /// The rotation taking the body frame onto the (right-handed) inertia
    /// eigenbasis.
    pub inertia_frame: Rotation,
}

impl MassProperties {
    /// Integrates volume and inertia over a quadrature grid of surface radii.
    ///
    /// `angles` holds the (θ, φ) pair of every grid node in row-major
    /// (θ-major) order, `weights` the one-dimensional Gauss–Legendre weights
    /// of the `n_quad`-point rule and `radii` the surface radius at each
    /// node. The grid is the one built by the shape initializer: θ and φ are
    /// Gauss–Legendre abscissae mapped to [0, π] and [0, 2π].
    pub fn from_surface_quadrature(
        angles: &[(Real, Real)],
        weights: &[Real],
        radii: &[Real],
        n_quad: usize,
    ) -> Result<Self, MassPropertiesError> {
        // Jacobian of the abscissa → (θ, φ) mapping.
        let factor = 0.5 * std::f64::consts::PI * std::f64::consts::PI;

        let mut vol = 0.0;
        let (mut i11, mut i22, mut i33) = (0.0, 0.0, 0.0);
        let (mut i12, mut i13, mut i23) = (0.0, 0.0, 0.0);

        let mut count = 0;
        for i in 0..n_quad {
            for j in 0..n_quad {
                let (theta, phi) = angles[count];
                let (st, ct) = (theta.sin(), theta.cos());
                let (sp, cp) = (phi.sin(), phi.cos());
                let r = radii[count];
                let fact = 0.2 * weights[i] * weights[j] * r.powi(5) * st;
                vol += weights[i] * weights[j] * r.powi(3) * st / 3.0;
                i11 += fact * (1.0 - (cp * st) * (cp * st));
                i22 += fact * (1.0 - (sp * st) * (sp * st));
                i33 += fact * (1.0 - ct * ct);
                i12 -= fact * cp * sp * st * st;
                i13 -= fact * cp * ct * st;
                i23 -= fact * sp * ct * st;
                count += 1;
            }
        }

        vol *= factor;
        if vol <= 0.0 {
            return Err(MassPropertiesError::VolumeZero);
        }

        let scale = factor / vol;
        let tensor = Matrix::new(
            i11 * scale,
            i12 * scale,
            i13 * scale,
            i12 * scale,
            i22 * scale,
            i23 * scale,
            i13 * scale,
            i23 * scale,
            i33 * scale,
        );

        log::debug!("quadrature volume: {vol}");
        log::debug!("volume-normalized inertia tensor: {tensor:?}");

        let (mut inertia, vectors) = utils::jacobi_eigen(&tensor, MAX_JACOBI_SWEEPS)
            .ok_or(MassPropertiesError::JacobiNonConverged)?;

        let ex = vectors.column(0).into_owned();
        let ey = vectors.column(1).into_owned();
        let mut ez = vectors.column(2).into_owned();

        // Any principal moment far below the largest one is noise.
        let max = inertia.x.max(inertia.y).max(inertia.z);
        for k in 0..3 {
            if inertia[k] < EPSILON * max {
                inertia[k] = 0.0;
            }
        }

        // Enforce a right-handed eigenbasis, flipping the third vector if
        // needed.
        if ex.cross(&ey).dot(&ez) < 0.0 {
            ez = -ez;
        }

        let frame = Matrix::from_columns(&[ex, ey, ez]);
        let inertia_frame =
            Rotation::from_rotation_matrix(&Rotation3::from_matrix_unchecked(frame));

        log::debug!("principal inertia: {inertia:?}");
        log::debug!("inertia eigenbasis quaternion: {inertia_frame:?}");

        Ok(MassProperties {
            volume: vol,
            principal_inertia: inertia,
            inertia_frame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::gl_pair;
    use std::f64::consts::PI;

    #[test]
    fn unit_sphere_inertia() {
        let n_quad = 20;
        let grid: Vec<_> = (1..=n_quad).map(|k| gl_pair(n_quad, k)).collect();
        let mut angles = Vec::new();
        for i in 0..n_quad {
            for j in 0..n_quad {
                let theta = 0.5 * PI * (grid[i].position() + 1.0);
                let phi = PI * (grid[j].position() + 1.0);
                angles.push((theta, phi));
            }
        }
        let weights: Vec<_> = grid.iter().map(|p| p.weight).collect();
        let radii = vec![1.0; n_quad * n_quad];

        let props =
            MassProperties::from_surface_quadrature(&angles, &weights, &radii, n_quad).unwrap();

        assert_relative_eq!(props.volume, 4.0 * PI / 3.0, epsilon = 1.0e-10);
        // Volume-normalized sphere inertia is 2/5 r².
        assert_relative_eq!(props.principal_inertia.x, 0.4, epsilon = 1.0e-8);
        assert_relative_eq!(props.principal_inertia.y, 0.4, epsilon = 1.0e-8);
        assert_relative_eq!(props.principal_inertia.z, 0.4, epsilon = 1.0e-8);
        // The eigenbasis of an isotropic tensor is the identity (up to sign).
        assert_relative_eq!(props.inertia_frame.w.abs(), 1.0, epsilon = 1.0e-10);
    }
}
