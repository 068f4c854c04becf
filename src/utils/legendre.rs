//! Associated Legendre functions, normalized for spherical harmonics.
//!
//! All normalized evaluations include the Condon–Shortley phase and the
//! orthonormalization factor √((2n+1)(n−m)!/(4π(n+m)!)), so that
//! Y_n^m(θ,φ) = P̃_n^m(cosθ)·exp(imφ) is orthonormal over the sphere.

use crate::math::Real;
use std::f64::consts::PI;

/// Error raised when a Legendre evaluation is requested outside its domain.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum DomainError {
    /// The order `m` exceeds the degree `n`.
    #[error("order m = {m} exceeds degree n = {n}")]
    OrderOutOfRange {
        /// The requested degree.
        n: usize,
        /// The offending order.
        m: usize,
    },
    /// The evaluation abscissa lies outside [−1, 1].
    #[error("abscissa x = {x} outside [-1, 1]")]
    AbscissaOutOfRange {
        /// The offending abscissa.
        x: Real,
    },
}

/// Normalized associated Legendre function P̃_n^m(x).
///
/// Computed by the forward recursion in `n` at fixed `m`, seeded at
/// P̃_m^m. Stable for all 0 ≤ m ≤ n and |x| ≤ 1.
pub fn plegendre(n: usize, m: usize, x: Real) -> Result<Real, DomainError> {
    check_domain(n, m, x)?;
    Ok(plegendre_unchecked(n, m, x))
}

/// Diagonal step P̃_n^n from P̃_{n−1}^{n−1}.
pub fn plegendre_nn(n: usize, x: Real, pnn_prev: Real) -> Result<Real, DomainError> {
    if x.abs() > 1.0 {
        return Err(DomainError::AbscissaOutOfRange { x });
    }
    Ok(plegendre_nn_unchecked(n, x, pnn_prev))
}

/// Two-term recurrence in `n` at fixed `m`, recycling the two previous rows.
///
/// `pnm_m1` is P̃_{n−1}^m and `pnm_m2` is P̃_{n−2}^m. Valid for m ≤ n − 2.
pub fn plegendre_recycle(
    n: usize,
    m: usize,
    x: Real,
    pnm_m1: Real,
    pnm_m2: Real,
) -> Result<Real, DomainError> {
    check_domain(n, m, x)?;
    Ok(plegendre_recycle_unchecked(n, m, x, pnm_m1, pnm_m2))
}

/// Unnormalized associated Legendre function P_n^m(x) (Condon–Shortley
/// included, no √ normalization). Used by the ∂r/∂θ identity together with
/// [`norm_factor`].
pub fn plegendre_unnorm(n: usize, m: usize, x: Real) -> Result<Real, DomainError> {
    check_domain(n, m, x)?;
    Ok(plegendre_unnorm_unchecked(n, m, x))
}

/// The spherical-harmonic normalization factor
/// f_{n,m} = √((2n+1)(n−m)!/(4π(n+m)!)), such that
/// P̃_n^m = f_{n,m}·P_n^m.
pub fn norm_factor(n: usize, m: usize) -> Real {
    let nn = n as Real;
    ((2.0 * nn + 1.0) * factorial(n - m) / (4.0 * PI * factorial(n + m))).sqrt()
}

/// n! as a double. Exact up to n = 22, accurate to one ulp far beyond the
/// 2·n_max range used by the harmonic kernels.
pub fn factorial(n: usize) -> Real {
    let mut f = 1.0;
    for i in 2..=n {
        f *= i as Real;
    }
    f
}

fn check_domain(n: usize, m: usize, x: Real) -> Result<(), DomainError> {
    if m > n {
        return Err(DomainError::OrderOutOfRange { n, m });
    }
    if x.abs() > 1.0 {
        return Err(DomainError::AbscissaOutOfRange { x });
    }
    Ok(())
}

pub(crate) fn plegendre_unchecked(n: usize, m: usize, x: Real) -> Real {
    let mut pmm = 1.0;
    if m > 0 {
        let omx2 = (1.0 - x) * (1.0 + x);
        let mut fact = 1.0;
        for _ in 1..=m {
            pmm *= omx2 * fact / (fact + 1.0);
            fact += 2.0;
        }
    }
    pmm = ((2.0 * m as Real + 1.0) * pmm / (4.0 * PI)).sqrt();
    if m & 1 == 1 {
        pmm = -pmm;
    }
    if n == m {
        return pmm;
    }

    let mut pmmp1 = x * (2.0 * m as Real + 3.0).sqrt() * pmm;
    if n == m + 1 {
        return pmmp1;
    }

    let mut oldfact = (2.0 * m as Real + 3.0).sqrt();
    let mut pll = 0.0;
    for ll in (m + 2)..=n {
        let (lf, mf) = (ll as Real, m as Real);
        let fact = ((4.0 * lf * lf - 1.0) / (lf * lf - mf * mf)).sqrt();
        pll = (x * pmmp1 - pmm / oldfact) * fact;
        oldfact = fact;
        pmm = pmmp1;
        pmmp1 = pll;
    }
    pll
}

pub(crate) fn plegendre_nn_unchecked(n: usize, x: Real, pnn_prev: Real) -> Real {
    let llm1 = 2.0 * (n as Real - 1.0);
    let fact = ((llm1 + 3.0) / (llm1 + 2.0)).sqrt();
    -(1.0 - x * x).sqrt() * fact * pnn_prev
}

pub(crate) fn plegendre_recycle_unchecked(
    n: usize,
    m: usize,
    x: Real,
    pnm_m1: Real,
    pnm_m2: Real,
) -> Real {
    let (lf, mf) = (n as Real, m as Real);
    let fact = ((4.0 * lf * lf - 1.0) / (lf * lf - mf * mf)).sqrt();
    let oldfact = ((4.0 * (lf - 1.0) * (lf - 1.0) - 1.0) / ((lf - 1.0) * (lf - 1.0) - mf * mf)).sqrt();
    (x * pnm_m1 - pnm_m2 / oldfact) * fact
}

pub(crate) fn plegendre_unnorm_unchecked(n: usize, m: usize, x: Real) -> Real {
    let mut pmm = 1.0;
    if m > 0 {
        let somx2 = ((1.0 - x) * (1.0 + x)).sqrt();
        let mut fact = 1.0;
        for _ in 1..=m {
            pmm *= -fact * somx2;
            fact += 2.0;
        }
    }
    if n == m {
        return pmm;
    }

    let mut pmmp1 = x * (2.0 * m as Real + 1.0) * pmm;
    if n == m + 1 {
        return pmmp1;
    }

    let mut pll = 0.0;
    for ll in (m + 2)..=n {
        let (lf, mf) = (ll as Real, m as Real);
        pll = (x * (2.0 * lf - 1.0) * pmmp1 - (lf + mf - 1.0) * pmm) / (lf - mf);
        pmm = pmmp1;
        pmmp1 = pll;
    }
    pll
}
