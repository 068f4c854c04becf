use crate::mass_properties::{MassProperties, MassPropertiesError};
use crate::math::Real;
use crate::shape::harmonic_shape::{
    coefficient_index, coefficient_len, degree_contribution, radius_from_coeffs,
};
use crate::shape::HarmonicShape;
use crate::utils::gl_pair;
use std::f64::consts::PI;
use std::io::BufRead;

/// Errors raised while ingesting coefficients or initializing a shape.
#[derive(thiserror::Error, Debug)]
pub enum ShapeBuilderError {
    /// A coefficient record could not be parsed.
    #[error("invalid coefficient record at line {line}: {reason}")]
    CoefficientParse {
        /// 1-based line number of the offending record.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
    /// The file header declares more coefficients than the truncation degree
    /// can store.
    #[error(
        "header declares {declared} coefficients but a degree-{n_max} expansion stores at most {capacity}"
    )]
    ShapeFileOverflow {
        /// The count announced by the header line.
        declared: usize,
        /// The builder's truncation degree.
        n_max: usize,
        /// Number of m ≥ 0 records a degree-`n_max` expansion can hold.
        capacity: usize,
    },
    /// A raw coefficient vector had the wrong length for the truncation
    /// degree.
    #[error("coefficient vector length {len} does not match degree {n_max} (expected {expected})")]
    CoefficientLength {
        /// The provided length.
        len: usize,
        /// The builder's truncation degree.
        n_max: usize,
        /// The expected interleaved length.
        expected: usize,
    },
    /// Volume/inertia computation failed.
    #[error(transparent)]
    MassProperties(#[from] MassPropertiesError),
    /// The coefficient stream could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One-time initializer turning a spherical-harmonic coefficient stream into
/// an immutable [`HarmonicShape`] with every precomputed table the contact
/// pipeline needs.
///
/// ```
/// use spharm3d::shape::ShapeBuilder;
///
/// let file = "\
/// # unit sphere
/// 0 0 3.5449077018110318 0.0
/// ";
/// let sphere = ShapeBuilder::new(6, 20)
///     .build_from_reader(file.as_bytes())
///     .unwrap();
/// assert!((sphere.radius(1.0, 2.0) - 1.0).abs() < 1.0e-12);
/// ```
#[derive(Clone, Debug)]
pub struct ShapeBuilder {
    n_max: usize,
    n_quad: usize,
    safety_factor: Real,
}

impl ShapeBuilder {
    /// Creates a builder for expansions truncated at degree `n_max`, using
    /// an `n_quad`-point Gauss–Legendre rule per angle for the surface
    /// integrals.
    ///
    /// # Panics
    /// Panics if `n_quad` is zero.
    pub fn new(n_max: usize, n_quad: usize) -> Self {
        assert!(n_quad > 0, "the quadrature order must be positive");
        ShapeBuilder {
            n_max,
            n_quad,
            safety_factor: 1.0,
        }
    }

    /// Scales the expansion factors and the maximum radius by `factor ≥ 1`,
    /// trading earlier contact-test rejection for a looser bound.
    pub fn with_safety_factor(mut self, factor: Real) -> Self {
        self.safety_factor = factor;
        self
    }

    /// Reads a coefficient stream into interleaved (Re, Im) storage.
    ///
    /// The format is plain text: an optional header line holding the record
    /// count, `#` comments, and whitespace-separated records
    /// `n m Re(a_{n,m}) Im(a_{n,m})`. Records with m < 0 are skipped (they
    /// are implied by conjugation); reading stops at the first record with
    /// n > `n_max`.
    pub fn read_coefficients<R: BufRead>(&self, reader: R) -> Result<Vec<Real>, ShapeBuilderError> {
        let capacity = (self.n_max + 1) * (self.n_max + 2) / 2;
        let mut coeffs = vec![0.0; coefficient_len(self.n_max)];
        let mut seen_data = false;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let number = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            if !seen_data && fields.len() == 1 {
                let declared = fields[0].parse::<usize>().map_err(|e| {
                    ShapeBuilderError::CoefficientParse {
                        line: number,
                        reason: format!("bad header count `{}`: {}", fields[0], e),
                    }
                })?;
                if declared > capacity {
                    return Err(ShapeBuilderError::ShapeFileOverflow {
                        declared,
                        n_max: self.n_max,
                        capacity,
                    });
                }
                seen_data = true;
                continue;
            }
            seen_data = true;

            if fields.len() != 4 {
                return Err(ShapeBuilderError::CoefficientParse {
                    line: number,
                    reason: format!("expected 4 fields `n m re im`, found {}", fields.len()),
                });
            }

            let n = parse_field::<i64>(fields[0], "degree n", number)?;
            let m = parse_field::<i64>(fields[1], "order m", number)?;
            if n < 0 {
                return Err(ShapeBuilderError::CoefficientParse {
                    line: number,
                    reason: format!("negative degree n = {}", n),
                });
            }
            if n as usize > self.n_max {
                break;
            }
            if m < 0 {
                continue;
            }
            if m > n {
                return Err(ShapeBuilderError::CoefficientParse {
                    line: number,
                    reason: format!("order m = {} exceeds degree n = {}", m, n),
                });
            }

            let re = parse_field::<Real>(fields[2], "Re(a)", number)?;
            let im = parse_field::<Real>(fields[3], "Im(a)", number)?;
            let entry = coefficient_index(n as usize, m as usize);
            coeffs[entry] = re;
            coeffs[entry + 1] = im;
        }

        Ok(coeffs)
    }

    /// Runs the whole initialization pipeline on a coefficient stream.
    pub fn build_from_reader<R: BufRead>(
        &self,
        reader: R,
    ) -> Result<HarmonicShape, ShapeBuilderError> {
        let coeffs = self.read_coefficients(reader)?;
        self.build_from_coefficients(coeffs)
    }

    /// Runs the initialization pipeline on an interleaved coefficient
    /// vector, e.g. one produced by
    /// [`fit_coefficients`](crate::shape::fit_coefficients) or by a
    /// coefficient rotation.
    pub fn build_from_coefficients(
        &self,
        coeffs: Vec<Real>,
    ) -> Result<HarmonicShape, ShapeBuilderError> {
        let expected = coefficient_len(self.n_max);
        if coeffs.len() != expected {
            return Err(ShapeBuilderError::CoefficientLength {
                len: coeffs.len(),
                n_max: self.n_max,
                expected,
            });
        }

        let q = self.n_quad;
        let pairs: Vec<_> = (1..=q).map(|k| gl_pair(q, k)).collect();
        let weights: Vec<Real> = pairs.iter().map(|p| p.weight).collect();
        let abscissa: Vec<Real> = pairs.iter().map(|p| p.position()).collect();

        // Gauss–Legendre abscissae mapped onto θ ∈ [0, π], φ ∈ [0, 2π].
        let mut angles = Vec::with_capacity(q * q);
        for i in 0..q {
            for j in 0..q {
                angles.push((0.5 * PI * (abscissa[i] + 1.0), PI * (abscissa[j] + 1.0)));
            }
        }

        let quad_rads: Vec<Real> = angles
            .iter()
            .map(|&(theta, phi)| radius_from_coeffs(&coeffs, self.n_max, theta, phi))
            .collect();

        let mass_properties =
            MassProperties::from_surface_quadrature(&angles, &weights, &quad_rads, q)?;

        let expfacts = self.expansion_factors(&coeffs, &angles);
        let max_rad =
            self.safety_factor * quad_rads.iter().fold(0.0, |acc: Real, &r| acc.max(r));

        log::debug!(
            "shape initialized: n_max = {}, max radius = {max_rad}, expansion factor α_0 = {}",
            self.n_max,
            expfacts[0]
        );

        Ok(HarmonicShape {
            n_max: self.n_max,
            n_quad: q,
            coeffs,
            angles,
            weights,
            quad_rads,
            max_rad,
            expfacts,
            mass_properties,
        })
    }

    /// Per-degree expansion factors over the quadrature grid.
    ///
    /// For each degree the largest ratio r_{n+1}/r_n over the grid bounds
    /// how much the next degree can still grow the radius; the cumulative
    /// downward product then upper-bounds the full radius from any partial
    /// sum.
    fn expansion_factors(&self, coeffs: &[Real], angles: &[(Real, Real)]) -> Vec<Real> {
        let n_max = self.n_max;
        let mut r_n = vec![0.0; angles.len()];
        let mut ratios = vec![0.0; angles.len()];
        let mut expfacts = vec![0.0; n_max + 1];
        expfacts[n_max] = 1.0;

        for n in 0..=n_max {
            for (k, &(theta, phi)) in angles.iter().enumerate() {
                let x = theta.cos();
                r_n[k] += degree_contribution(coeffs, n, x, phi);
                if n < n_max {
                    let r_next = r_n[k] + degree_contribution(coeffs, n + 1, x, phi);
                    ratios[k] = r_next / r_n[k];
                }
            }
            if n < n_max {
                let max_ratio = ratios.iter().fold(0.0, |acc: Real, &r| acc.max(r));
                expfacts[n] = max_ratio.max(1.0);
            }
        }

        let mut factor = expfacts[n_max];
        for n in (0..n_max).rev() {
            factor *= expfacts[n] * self.safety_factor;
            expfacts[n] = factor;
        }
        expfacts[n_max] = 1.0;
        expfacts
    }
}

fn parse_field<T: std::str::FromStr>(
    field: &str,
    what: &str,
    line: usize,
) -> Result<T, ShapeBuilderError>
where
    T::Err: std::fmt::Display,
{
    field
        .parse::<T>()
        .map_err(|e| ShapeBuilderError::CoefficientParse {
            line,
            reason: format!("bad {} `{}`: {}", what, field, e),
        })
}
