use crate::math::Real;
use crate::shape::{coefficient_index, coefficient_len};
use crate::utils::factorial;
use na::Complex;
use std::f64::consts::PI;

/// Errors raised while rotating a spherical-harmonic coefficient vector.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum RotationError {
    /// The Euler angle β lies outside [0, π]; normalizing it there is the
    /// caller's responsibility.
    #[error("Euler angle beta = {beta} outside [0, pi]")]
    DegenerateBeta {
        /// The offending angle.
        beta: Real,
    },
    /// The coefficient vector length does not match the table's degree.
    #[error("coefficient vector length {len} does not match degree {n_max}")]
    CoefficientLength {
        /// The provided length.
        len: usize,
        /// The table's truncation degree.
        n_max: usize,
    },
}

/// Table of Wigner d^n_{m′,m}(β) matrix elements for all degrees up to
/// `n_max`, built once by the Edmonds three-term recursion and reusable
/// across every coefficient rotation sharing the same β.
#[derive(Debug, Clone)]
pub struct WignerTable {
    n_max: usize,
    beta: Real,
    dim: usize,
    d: Vec<Real>,
}

impl WignerTable {
    /// Builds the recursion table for rotations about y by `beta` ∈ [0, π].
    ///
    /// Exact 0 or π is nudged by 1e−10 so the half-angle products stay
    /// non-degenerate.
    pub fn new(n_max: usize, beta: Real) -> Result<Self, RotationError> {
        if !beta.is_finite() || !(0.0..=PI).contains(&beta) {
            return Err(RotationError::DegenerateBeta { beta });
        }

        let mut beta = beta;
        let mut cosb = (beta / 2.0).cos();
        let mut sinb = (beta / 2.0).sin();
        if cosb == 0.0 || sinb == 0.0 {
            beta += 1.0e-10;
            cosb = (beta / 2.0).cos();
            sinb = (beta / 2.0).sin();
        }

        let dim = 2 * n_max + 1;
        let mut table = WignerTable {
            n_max,
            beta,
            dim,
            d: vec![0.0; (n_max + 1) * dim * dim],
        };

        // Seed the recursion with the closed-form n = 0 and n = 1 elements.
        for n in 0..=n_max.min(1) {
            let ni = n as i64;
            for m in -ni..=ni {
                for mp in -ni..=ni {
                    let realnum = (factorial((ni + mp) as usize)
                        * factorial((ni - mp) as usize)
                        / factorial((ni + m) as usize)
                        / factorial((ni - m) as usize))
                    .sqrt();
                    let klow = 0.max(m - mp);
                    let khigh = (ni - mp).min(ni + m);
                    let mut total = 0.0;
                    for k in klow..=khigh {
                        let mut abc = if (k + mp - m) & 1 == 0 { 1.0 } else { -1.0 };
                        abc *= factorial((ni + m) as usize)
                            / factorial(k as usize)
                            / factorial((ni + m - k) as usize);
                        abc *= factorial((ni - m) as usize)
                            / factorial((ni - mp - k) as usize)
                            / factorial((mp + k - m) as usize);
                        total += abc
                            * cosb.powi((2 * ni + m - mp - 2 * k) as i32)
                            * sinb.powi((2 * k + mp - m) as i32);
                    }
                    table.set(n, mp, m, total * realnum);
                }
            }
        }

        // Everything above follows from the three-branch Edmonds recursion.
        let ss = sinb * sinb;
        let cc = cosb * cosb;
        let sc = sinb * cosb;
        let cms = cc - ss;
        for n in 2..=n_max {
            let ni = n as i64;
            let rn = n as Real;
            for m in -ni..=ni {
                let rm = m as Real;
                for mp in -ni..=ni {
                    let rmp = mp as Real;
                    let term = if mp > -ni && mp < ni {
                        let denom = (rn + rmp) * (rn - rmp);
                        let a = cms * ((rn + rm) * (rn - rm) / denom).sqrt();
                        let b = sc * ((rn + rm) * (rn + rm - 1.0) / denom).sqrt();
                        let nb = -(sc * ((rn - rm) * (rn - rm - 1.0) / denom).sqrt());
                        a * table.prev(n, mp, m)
                            + b * table.prev(n, mp, m - 1)
                            + nb * table.prev(n, mp, m + 1)
                    } else if mp == -ni {
                        let denom = (rn - rmp) * (rn - rmp - 1.0);
                        let c = 2.0 * sc * ((rn + rm) * (rn - rm) / denom).sqrt();
                        let d = ss * ((rn + rm) * (rn + rm - 1.0) / denom).sqrt();
                        let nd = cc * ((rn - rm) * (rn - rm - 1.0) / denom).sqrt();
                        c * table.prev(n, mp + 1, m)
                            + d * table.prev(n, mp + 1, m - 1)
                            + nd * table.prev(n, mp + 1, m + 1)
                    } else {
                        let denom = (rn + rmp) * (rn + rmp - 1.0);
                        let c = -(2.0 * sc * ((rn + rm) * (rn - rm) / denom).sqrt());
                        let d = cc * ((rn + rm) * (rn + rm - 1.0) / denom).sqrt();
                        let nd = ss * ((rn - rm) * (rn - rm - 1.0) / denom).sqrt();
                        c * table.prev(n, mp - 1, m)
                            + d * table.prev(n, mp - 1, m - 1)
                            + nd * table.prev(n, mp - 1, m + 1)
                    };
                    table.set(n, mp, m, term);
                }
            }
        }

        Ok(table)
    }

    /// The truncation degree covered by this table.
    #[inline]
    pub fn n_max(&self) -> usize {
        self.n_max
    }

    /// The (possibly nudged) rotation angle β this table was built for.
    #[inline]
    pub fn beta(&self) -> Real {
        self.beta
    }

    /// The matrix element d^n_{m′,m}(β).
    ///
    /// # Panics
    /// Panics if `n > n_max` or an index exceeds the degree.
    #[inline]
    pub fn get(&self, n: usize, mp: i64, m: i64) -> Real {
        assert!(n <= self.n_max && mp.unsigned_abs() as usize <= n && m.unsigned_abs() as usize <= n);
        self.d[self.offset(n, mp, m)]
    }

    /// Rotates an interleaved coefficient vector by the ZYZ Euler angles
    /// (α, β, γ), with β fixed by this table.
    ///
    /// The rotated coefficients are
    /// a′_{n,m} = exp(imγ)·Σ_{m′} exp(im′α)·d^n_{m′,m}(β)·a_{n,m′}, with
    /// negative orders supplied by the conjugation rule.
    pub fn rotate(
        &self,
        coeffs: &[Real],
        alpha: Real,
        gamma: Real,
    ) -> Result<Vec<Real>, RotationError> {
        let expected = coefficient_len(self.n_max);
        if coeffs.len() != expected {
            return Err(RotationError::CoefficientLength {
                len: coeffs.len(),
                n_max: self.n_max,
            });
        }

        let mut out = vec![0.0; expected];
        for n in 0..=self.n_max {
            let ni = n as i64;
            for m in 0..=n {
                let mut acc = Complex::new(0.0, 0.0);
                for mp in -ni..=ni {
                    let d = self.get(n, mp, m as i64);
                    let mloc = coefficient_index(n, mp.unsigned_abs() as usize);
                    let mut anm = Complex::new(coeffs[mloc], coeffs[mloc + 1]);
                    if mp < 0 {
                        let sign = if mp & 1 == 0 { 1.0 } else { -1.0 };
                        anm = sign * anm.conj();
                    }
                    let aarg = Complex::new(0.0, mp as Real * alpha).exp();
                    acc += aarg * d * anm;
                }
                let garg = Complex::new(0.0, m as Real * gamma).exp();
                let rotated = garg * acc;
                let loc = coefficient_index(n, m);
                out[loc] = rotated.re;
                out[loc + 1] = rotated.im;
            }
        }
        Ok(out)
    }

    #[inline]
    fn offset(&self, n: usize, mp: i64, m: i64) -> usize {
        let half = self.n_max as i64;
        n * self.dim * self.dim
            + (mp + half) as usize * self.dim
            + (m + half) as usize
    }

    #[inline]
    fn set(&mut self, n: usize, mp: i64, m: i64, value: Real) {
        let at = self.offset(n, mp, m);
        self.d[at] = value;
    }

    /// Level n − 1 element, zero outside its valid index range.
    #[inline]
    fn prev(&self, n: usize, mp: i64, m: i64) -> Real {
        let lim = (n - 1) as i64;
        if mp.abs() > lim || m.abs() > lim {
            0.0
        } else {
            self.d[self.offset(n - 1, mp, m)]
        }
    }
}

/// Rotates a coefficient vector by the ZYZ Euler angles (α, β, γ),
/// building a one-shot [`WignerTable`]. Prefer keeping the table when many
/// rotations share the same β.
pub fn rotate_coefficients(
    coeffs: &[Real],
    n_max: usize,
    alpha: Real,
    beta: Real,
    gamma: Real,
) -> Result<Vec<Real>, RotationError> {
    WignerTable::new(n_max, beta)?.rotate(coeffs, alpha, gamma)
}

impl crate::shape::HarmonicShape {
    /// The coefficient vector of this shape rotated by the ZYZ Euler angles
    /// (α, β, γ). Feed the result back through a
    /// [`ShapeBuilder`](crate::shape::ShapeBuilder) to obtain the rotated
    /// shape with fresh tables.
    pub fn rotated_coefficients(
        &self,
        alpha: Real,
        beta: Real,
        gamma: Real,
    ) -> Result<Vec<Real>, RotationError> {
        rotate_coefficients(self.coefficients(), self.n_max(), alpha, beta, gamma)
    }
}
