use crate::mass_properties::MassProperties;
use crate::math::{Real, Rotation, Vector};
use crate::utils::legendre::{
    norm_factor, plegendre_nn_unchecked, plegendre_recycle_unchecked, plegendre_unchecked,
    plegendre_unnorm_unchecked,
};
use na::Complex;
use std::f64::consts::PI;

/// Index of the real part of a_{n,m} (m ≥ 0) in the interleaved coefficient
/// storage; the imaginary part follows at the next index.
#[inline]
pub fn coefficient_index(n: usize, m: usize) -> usize {
    n * (n + 1) + 2 * (n - m)
}

/// Length of the interleaved coefficient vector for a degree-`n_max`
/// expansion.
#[inline]
pub fn coefficient_len(n_max: usize) -> usize {
    (n_max + 1) * (n_max + 2)
}

/// A rigid particle surface described by a truncated real spherical-harmonic
/// expansion r(θ,φ) = Σ_{n,m} a_{n,m} Y_n^m(θ,φ).
///
/// Only the m ≥ 0 coefficients are stored; m < 0 follows from
/// a_{n,−m} = (−1)^m·conj(a_{n,m}). The shape is immutable once built by
/// [`ShapeBuilder`](crate::shape::ShapeBuilder) and carries every
/// precomputed table needed by the contact test and the pair integrator.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct HarmonicShape {
    pub(super) n_max: usize,
    pub(super) n_quad: usize,
    pub(super) coeffs: Vec<Real>,
    /// (θ, φ) of every quadrature grid node, θ-major.
    pub(super) angles: Vec<(Real, Real)>,
    /// One-dimensional Gauss–Legendre weights of the `n_quad`-point rule.
    pub(super) weights: Vec<Real>,
    /// Surface radius at every grid node.
    pub(super) quad_rads: Vec<Real>,
    /// Upper bound on the surface radius, scaled by the safety factor.
    pub(super) max_rad: Real,
    /// Per-degree expansion factors α_n; α_{n_max} = 1.
    pub(super) expfacts: Vec<Real>,
    pub(super) mass_properties: MassProperties,
}

impl HarmonicShape {
    /// The truncation degree of the expansion.
    #[inline]
    pub fn n_max(&self) -> usize {
        self.n_max
    }

    /// The order of the surface quadrature rule.
    #[inline]
    pub fn n_quad(&self) -> usize {
        self.n_quad
    }

    /// The interleaved (Re, Im) coefficient storage for m ≥ 0.
    #[inline]
    pub fn coefficients(&self) -> &[Real] {
        &self.coeffs
    }

    /// The complex coefficient a_{n,m}, for any −n ≤ m ≤ n.
    ///
    /// # Panics
    /// Panics if `n > n_max` or |m| > n.
    pub fn coefficient(&self, n: usize, m: i64) -> Complex<Real> {
        assert!(n <= self.n_max && m.unsigned_abs() as usize <= n);
        let loc = coefficient_index(n, m.unsigned_abs() as usize);
        let a = Complex::new(self.coeffs[loc], self.coeffs[loc + 1]);
        if m < 0 {
            let sign = if m & 1 == 0 { 1.0 } else { -1.0 };
            sign * a.conj()
        } else {
            a
        }
    }

    /// The safety-scaled bound on the surface radius.
    #[inline]
    pub fn max_rad(&self) -> Real {
        self.max_rad
    }

    /// The per-degree expansion factors α_n (monotonically non-increasing,
    /// α_{n_max} = 1).
    #[inline]
    pub fn expansion_factors(&self) -> &[Real] {
        &self.expfacts
    }

    /// The (θ, φ) pairs of the surface quadrature grid, θ-major.
    #[inline]
    pub fn quadrature_angles(&self) -> &[(Real, Real)] {
        &self.angles
    }

    /// The one-dimensional Gauss–Legendre weights of the surface rule.
    #[inline]
    pub fn quadrature_weights(&self) -> &[Real] {
        &self.weights
    }

    /// The precomputed surface radius at every quadrature grid node.
    #[inline]
    pub fn quadrature_radii(&self) -> &[Real] {
        &self.quad_rads
    }

    /// Volume and volume-normalized inertial frame.
    #[inline]
    pub fn mass_properties(&self) -> &MassProperties {
        &self.mass_properties
    }

    /// The enclosed volume.
    #[inline]
    pub fn volume(&self) -> Real {
        self.mass_properties.volume
    }

    /// The volume-normalized principal inertia.
    #[inline]
    pub fn principal_inertia(&self) -> Vector {
        self.mass_properties.principal_inertia
    }

    /// The quaternion taking body-frame axes onto the inertia eigenbasis.
    #[inline]
    pub fn initial_orientation(&self) -> Rotation {
        self.mass_properties.inertia_frame
    }

    /// The surface radius at the given spherical direction, evaluated at the
    /// full truncation degree.
    #[inline]
    pub fn radius(&self, theta: Real, phi: Real) -> Real {
        radius_from_coeffs(&self.coeffs, self.n_max, theta, phi)
    }

    /// The surface radius together with its angular gradients
    /// (r, ∂r/∂φ, ∂r/∂θ).
    pub fn radius_and_gradients(&self, theta: Real, phi: Real) -> (Real, Real, Real) {
        radius_and_gradients_from_coeffs(&self.coeffs, self.n_max, theta, phi)
    }

    /// The surface radius and the outward, **non-unit** surface normal at
    /// the given direction, both in the body frame.
    pub fn radius_and_normal(&self, mut theta: Real, mut phi: Real) -> (Real, Vector) {
        // The gradient path divides by sin; nudge exact poles off-axis.
        if theta.sin() == 0.0 {
            theta += 1.0e-5;
        }
        if phi.sin() == 0.0 {
            phi += 1.0e-5;
        }
        let (r, rp, rt) = radius_and_gradients_from_coeffs(&self.coeffs, self.n_max, theta, phi);
        (r, surface_normal(theta, phi, r, rp, rt))
    }

    /// Tests whether a point at distance `dist` along the body-frame
    /// direction (θ, φ) lies inside the surface, evaluating the expansion
    /// degree by degree.
    ///
    /// Because α_n·r_n is a guaranteed upper bound on the full radius, the
    /// test exits at the lowest degree that already proves the point is
    /// outside. Returns the fully-converged radius on contact.
    pub fn check_contact(&self, phi: Real, theta: Real, dist: Real) -> Option<Real> {
        let coeffs = &self.coeffs;
        let n_max = self.n_max;
        let mut rad = coeffs[0] * (1.0 / (4.0 * PI)).sqrt();
        if dist > self.expfacts[0] * rad {
            return None;
        }

        let x = theta.cos();
        let mut pnm_m1 = vec![0.0; n_max + 1];
        let mut pnm_m2 = vec![0.0; n_max + 1];
        let mut pnm_nn = 0.0;

        for n in 1..=n_max {
            accumulate_degree(
                coeffs,
                n,
                x,
                phi,
                &mut rad,
                &mut pnm_m1,
                &mut pnm_m2,
                &mut pnm_nn,
            );
            if dist > self.expfacts[n] * rad {
                return None;
            }
        }
        Some(rad)
    }
}

/// Adds the degree-`n` terms of the expansion to `rad`, maintaining the two
/// rolling Legendre rows and the running diagonal value.
fn accumulate_degree(
    coeffs: &[Real],
    n: usize,
    x: Real,
    phi: Real,
    rad: &mut Real,
    pnm_m1: &mut [Real],
    pnm_m2: &mut [Real],
    pnm_nn: &mut Real,
) {
    if n == 1 {
        let p = plegendre_unchecked(1, 0, x);
        pnm_m2[0] = p;
        *rad += coeffs[coefficient_index(1, 0)] * p;
        let p = plegendre_unchecked(1, 1, x);
        pnm_m2[1] = p;
        *rad += harmonic_term(coeffs, 1, 1, phi, p);
    } else if n == 2 {
        let p = plegendre_unchecked(2, 0, x);
        pnm_m1[0] = p;
        *rad += coeffs[coefficient_index(2, 0)] * p;
        for m in (1..=2).rev() {
            let p = plegendre_unchecked(2, m, x);
            pnm_m1[m] = p;
            *rad += harmonic_term(coeffs, 2, m, phi, p);
        }
        *pnm_nn = pnm_m1[2];
    } else {
        let p = plegendre_recycle_unchecked(n, 0, x, pnm_m1[0], pnm_m2[0]);
        pnm_m2[0] = pnm_m1[0];
        pnm_m1[0] = p;
        *rad += coeffs[coefficient_index(n, 0)] * p;
        for m in 1..=(n - 2) {
            let p = plegendre_recycle_unchecked(n, m, x, pnm_m1[m], pnm_m2[m]);
            pnm_m2[m] = pnm_m1[m];
            pnm_m1[m] = p;
            *rad += harmonic_term(coeffs, n, m, phi, p);
        }
        // m = n − 1 seeds off the previous diagonal value.
        let p = x * (2.0 * (n as Real - 1.0) + 3.0).sqrt() * *pnm_nn;
        pnm_m2[n - 1] = pnm_m1[n - 1];
        pnm_m1[n - 1] = p;
        *rad += harmonic_term(coeffs, n, n - 1, phi, p);
        // m = n through the diagonal recursion.
        let p = plegendre_nn_unchecked(n, x, *pnm_nn);
        *pnm_nn = p;
        pnm_m1[n] = p;
        *rad += harmonic_term(coeffs, n, n, phi, p);
    }
}

/// Contribution of one m > 0 term; the factor 2 accounts for the ±m pair.
#[inline]
fn harmonic_term(coeffs: &[Real], n: usize, m: usize, phi: Real, p: Real) -> Real {
    let loc = coefficient_index(n, m);
    let mphi = m as Real * phi;
    (coeffs[loc] * mphi.cos() - coeffs[loc + 1] * mphi.sin()) * 2.0 * p
}

/// Full-degree surface radius for a raw coefficient vector.
pub(crate) fn radius_from_coeffs(coeffs: &[Real], n_max: usize, theta: Real, phi: Real) -> Real {
    let mut rad = coeffs[0] * (1.0 / (4.0 * PI)).sqrt();
    let x = theta.cos();
    let mut pnm_m1 = vec![0.0; n_max + 1];
    let mut pnm_m2 = vec![0.0; n_max + 1];
    let mut pnm_nn = 0.0;
    for n in 1..=n_max {
        accumulate_degree(
            coeffs,
            n,
            x,
            phi,
            &mut rad,
            &mut pnm_m1,
            &mut pnm_m2,
            &mut pnm_nn,
        );
    }
    rad
}

/// Contribution of the degree-`n` terms alone, by direct forward recursion.
/// Used by the initializer when it walks the expansion degree by degree.
pub(crate) fn degree_contribution(coeffs: &[Real], n: usize, x: Real, phi: Real) -> Real {
    let mut out = coeffs[coefficient_index(n, 0)] * plegendre_unchecked(n, 0, x);
    for m in (1..=n).rev() {
        let p = plegendre_unchecked(n, m, x);
        out += harmonic_term(coeffs, n, m, phi, p);
    }
    out
}

/// Radius and angular gradients (r, ∂r/∂φ, ∂r/∂θ) for a raw coefficient
/// vector.
///
/// The θ derivative uses the identity
/// sinθ·dP_n^m/dθ = (n+1)·cosθ·P_n^m − (n−m+1)·P_{n+1}^m on the
/// unnormalized Legendre values, rescaled by the explicit normalization
/// factor.
pub(crate) fn radius_and_gradients_from_coeffs(
    coeffs: &[Real],
    n_max: usize,
    mut theta: Real,
    mut phi: Real,
) -> (Real, Real, Real) {
    if theta.sin() == 0.0 {
        theta += 1.0e-5;
    }
    if phi.sin() == 0.0 {
        phi += 1.0e-5;
    }
    let x = theta.cos();
    let st = theta.sin();

    let mut rad = coeffs[0] * (1.0 / (4.0 * PI)).sqrt();
    let mut rad_dphi = 0.0;
    let mut rad_dtheta = 0.0;

    let mut pnm_m1 = vec![0.0; n_max + 1];
    let mut pnm_m2 = vec![0.0; n_max + 1];
    let mut pnm_nn = 0.0;

    for n in 1..=n_max {
        accumulate_degree(
            coeffs,
            n,
            x,
            phi,
            &mut rad,
            &mut pnm_m1,
            &mut pnm_m2,
            &mut pnm_nn,
        );
        let row = if n >= 2 { &pnm_m1 } else { &pnm_m2 };
        rad_dtheta += dtheta_term(coeffs, n, 0, x, st, phi);
        for m in 1..=n {
            rad_dphi += dphi_term(coeffs, n, m, phi, row[m]);
            rad_dtheta += dtheta_term(coeffs, n, m, x, st, phi);
        }
    }
    (rad, rad_dphi, rad_dtheta)
}

#[inline]
fn dphi_term(coeffs: &[Real], n: usize, m: usize, phi: Real, p_norm: Real) -> Real {
    let loc = coefficient_index(n, m);
    let mphi = m as Real * phi;
    -(coeffs[loc] * mphi.sin() + coeffs[loc + 1] * mphi.cos()) * 2.0 * p_norm * m as Real
}

#[inline]
fn dtheta_term(coeffs: &[Real], n: usize, m: usize, x: Real, st: Real, phi: Real) -> Real {
    let loc = coefficient_index(n, m);
    let mphi = m as Real * phi;
    let fnm = norm_factor(n, m);
    let scale = if m == 0 { 1.0 } else { 2.0 };
    scale
        * (fnm / st)
        * ((n as Real + 1.0) * x * plegendre_unnorm_unchecked(n, m, x)
            - (n as Real - m as Real + 1.0) * plegendre_unnorm_unchecked(n + 1, m, x))
        * (coeffs[loc + 1] * mphi.sin() - coeffs[loc] * mphi.cos())
}

/// Outward non-unit normal of the parametric surface r = r(θ,φ).
fn surface_normal(theta: Real, phi: Real, r: Real, rp: Real, rt: Real) -> Vector {
    let (st, ct) = (theta.sin(), theta.cos());
    let (sp, cp) = (phi.sin(), phi.cos());
    Vector::new(
        r * ((cp * r * st * st) + (sp * rp) - (cp * ct * st * rt)),
        r * ((r * sp * st * st) - (cp * rp) - (ct * sp * st * rt)),
        r * st * ((ct * r) + (st * rt)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeBuilder;

    fn unit_sphere(n_max: usize) -> HarmonicShape {
        let mut coeffs = vec![0.0; coefficient_len(n_max)];
        coeffs[0] = (4.0 * PI).sqrt();
        ShapeBuilder::new(n_max, 20)
            .build_from_coefficients(coeffs)
            .unwrap()
    }

    #[test]
    fn sphere_radius_is_constant() {
        let sphere = unit_sphere(8);
        for &theta in &[0.1, 0.5, 1.2, 2.4, 3.0] {
            for &phi in &[0.0, 1.0, 3.3, 6.0] {
                assert_relative_eq!(sphere.radius(theta, phi), 1.0, epsilon = 1.0e-12);
            }
        }
    }

    #[test]
    fn sphere_normal_is_radial() {
        let sphere = unit_sphere(8);
        for &theta in &[0.3, 1.0, 2.0] {
            for &phi in &[0.4, 2.0, 5.0] {
                let (r, normal) = sphere.radius_and_normal(theta, phi);
                let radial = Vector::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                );
                let unit = normal.normalize();
                assert_relative_eq!(r, 1.0, epsilon = 1.0e-10);
                assert_relative_eq!(unit, radial, epsilon = 1.0e-9);
            }
        }
    }

    #[test]
    fn sphere_gradients_vanish() {
        let sphere = unit_sphere(6);
        let (r, rp, rt) = sphere.radius_and_gradients(1.1, 0.7);
        assert_relative_eq!(r, 1.0, epsilon = 1.0e-12);
        assert_relative_eq!(rp, 0.0, epsilon = 1.0e-10);
        assert_relative_eq!(rt, 0.0, epsilon = 1.0e-10);
    }

    #[test]
    fn contact_test_matches_radius() {
        let sphere = unit_sphere(8);
        assert!(sphere.check_contact(0.3, 1.0, 0.99).is_some());
        assert!(sphere.check_contact(0.3, 1.0, 1.01).is_none());
        let r = sphere.check_contact(2.0, 2.0, 0.5).unwrap();
        assert_relative_eq!(r, 1.0, epsilon = 1.0e-12);
    }

    #[test]
    fn negative_order_coefficients_conjugate() {
        let sphere = unit_sphere(4);
        let a = sphere.coefficient(0, 0);
        assert_relative_eq!(a.re, (4.0 * PI).sqrt(), epsilon = 1.0e-14);
        assert_relative_eq!(a.im, 0.0);
        // A zero coefficient conjugates to zero regardless of sign rules.
        let b = sphere.coefficient(3, -2);
        assert_eq!(b, Complex::new(0.0, 0.0));
    }
}
