use crate::math::Real;
use crate::shape::harmonic_shape::{coefficient_index, coefficient_len};
use crate::utils::legendre::plegendre_unchecked;
use crate::utils::gl_pair;
use std::f64::consts::PI;

/// Projects a star-shaped radial function r(θ,φ) onto the truncated
/// spherical-harmonic basis.
///
/// Returns the interleaved (Re, Im) coefficient vector for m ≥ 0 with
/// a_{n,m} = ∫ r(θ,φ)·conj(Y_n^m(θ,φ)) dΩ, evaluated on an
/// `n_quad` × `n_quad` Gauss–Legendre grid. The quadrature order must
/// resolve the highest retained degree; `n_quad ≳ 2·n_max` is a safe
/// choice for smooth surfaces.
pub fn fit_coefficients<F>(n_max: usize, n_quad: usize, radius: F) -> Vec<Real>
where
    F: Fn(Real, Real) -> Real,
{
    let pairs: Vec<_> = (1..=n_quad).map(|k| gl_pair(n_quad, k)).collect();
    // Jacobian of the abscissa → (θ, φ) mapping, as in the shape initializer.
    let jac = 0.5 * PI * PI;

    let mut coeffs = vec![0.0; coefficient_len(n_max)];
    for i in 0..n_quad {
        let theta = 0.5 * PI * (pairs[i].position() + 1.0);
        let (st, x) = (theta.sin(), theta.cos());
        for j in 0..n_quad {
            let phi = PI * (pairs[j].position() + 1.0);
            let w = jac * pairs[i].weight * pairs[j].weight * st;
            let r = radius(theta, phi);
            for n in 0..=n_max {
                for m in 0..=n {
                    let p = plegendre_unchecked(n, m, x);
                    let mphi = m as Real * phi;
                    let loc = coefficient_index(n, m);
                    coeffs[loc] += w * r * p * mphi.cos();
                    coeffs[loc + 1] -= w * r * p * mphi.sin();
                }
            }
        }
    }
    coeffs
}
