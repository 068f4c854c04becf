use crate::math::{Point, Real, Rotation, Vector};
use crate::query::OverlapError;
use crate::shape::HarmonicShape;
use crate::utils::gl_pair;
use num::Zero;
use std::f64::consts::{PI, TAU};

/// Result of a pairwise overlap evaluation.
///
/// All quantities are expressed in the space frame. `force` and `torque`
/// act on the primary particle A; the partner's reaction follows Newton's
/// third law through [`OverlapResult::partner_torque`].
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapResult {
    /// The overlap volume between the two surfaces.
    pub volume: Real,
    /// The normal (volume-penalty) force on particle A.
    pub force: Vector,
    /// The torque on particle A about its center.
    pub torque: Vector,
    /// The effective contact point used to transfer the reaction torque to
    /// the partner. `None` when the net force vanished.
    pub contact_point: Option<Point>,
}

impl OverlapResult {
    /// The reaction torque on the partner particle centered at `x_b`,
    /// computed from the effective contact point. The reaction force is
    /// simply `-self.force`.
    pub fn partner_torque(&self, x_b: &Point) -> Option<Vector> {
        self.contact_point.map(|xc| self.force.cross(&(xc - x_b)))
    }
}

/// Pairwise overlap integrator between two spherical-harmonic particles.
///
/// The solver walks a spherical cap of quadrature directions on the primary
/// particle pointing at the partner, tightens the cap half-angle to the
/// outermost ring that actually touches, then accumulates the overlap
/// volume, the surface-integral vector and the torque integral by
/// Gauss–Legendre quadrature in the polar angle and a uniform trapezoid rule
/// in azimuth. The inner surface of the overlap region is found per ray by
/// bisection against the partner's progressive contact test.
#[derive(Debug, Clone)]
pub struct OverlapSolver {
    num_pole_quad: usize,
    radius_tol: Real,
    abscissa: Vec<Real>,
    weights: Vec<Real>,
}

impl Default for OverlapSolver {
    fn default() -> Self {
        OverlapSolver::new(30, 1.0e-3)
    }
}

impl OverlapSolver {
    /// Creates a solver with `num_pole_quad` Gauss–Legendre rings across the
    /// cap and a per-ray bisection tolerance of `radius_tol` relative to the
    /// primary particle's bounding radius.
    ///
    /// # Panics
    /// Panics if `num_pole_quad < 2` or `radius_tol` is not positive.
    pub fn new(num_pole_quad: usize, radius_tol: Real) -> Self {
        assert!(num_pole_quad >= 2, "at least two quadrature rings are required");
        assert!(radius_tol > 0.0, "the bisection tolerance must be positive");
        let pairs: Vec<_> = (1..=num_pole_quad).map(|k| gl_pair(num_pole_quad, k)).collect();
        OverlapSolver {
            num_pole_quad,
            radius_tol,
            abscissa: pairs.iter().map(|p| p.position()).collect(),
            weights: pairs.iter().map(|p| p.weight).collect(),
        }
    }

    /// The number of polar quadrature rings.
    #[inline]
    pub fn num_pole_quad(&self) -> usize {
        self.num_pole_quad
    }

    /// The relative bisection tolerance.
    #[inline]
    pub fn radius_tol(&self) -> Real {
        self.radius_tol
    }

    /// Evaluates the overlap between particle A (`shape_a` at `x_a` with
    /// orientation `q_a`) and particle B, returning the overlap volume and
    /// the volume-penalty force/torque on A with pair stiffness `stiffness`
    /// and exponent `exponent`.
    ///
    /// Returns `Ok(None)` when the bounding spheres are separated or no
    /// quadrature direction finds the partner — an ordinary "no contact"
    /// outcome, not an error.
    pub fn overlap(
        &self,
        shape_a: &HarmonicShape,
        shape_b: &HarmonicShape,
        x_a: &Point,
        x_b: &Point,
        q_a: &Rotation,
        q_b: &Rotation,
        stiffness: Real,
        exponent: Real,
    ) -> Result<Option<OverlapResult>, OverlapError> {
        let delta = x_b - x_a;
        let dist = delta.norm();
        let rad_a = shape_a.max_rad();
        let rad_b = shape_b.max_rad();

        if dist >= rad_a + rad_b {
            return Ok(None);
        }
        if dist <= rad_b {
            return Err(OverlapError::CenterInsideOther {
                distance: dist,
                partner_max_rad: rad_b,
            });
        }

        // Cap half-angle subtended by the partner's bounding sphere.
        let mut iang = (rad_b / dist).asin();

        // Rotation taking the north pole onto the center line, and its
        // composition into A's body frame.
        let quat_cont = contact_quaternion(&delta);
        let rot_np_sf = quat_cont;
        let rot_np_bf = q_a.inverse() * quat_cont;

        let Some(kk_count) =
            self.refine_cap_angle(shape_a, shape_b, iang, rad_b, &rot_np_bf, &rot_np_sf, x_a, x_b, q_b)
        else {
            return Ok(None);
        };

        // Tighten the cap to the ring just outside the outermost contact,
        // unless the contact already reaches the outermost ring.
        if kk_count < self.num_pole_quad {
            let cosang = iang.cos();
            iang = (self.abscissa[kk_count] * (1.0 - cosang) / 2.0 + (1.0 + cosang) / 2.0).acos();
        }

        let (volume, surf, torsum) = self.integrate_cap(
            shape_a,
            shape_b,
            iang,
            rad_a,
            rad_b,
            &rot_np_bf,
            &rot_np_sf,
            x_a,
            x_b,
            q_a,
            q_b,
        );

        if volume == 0.0 {
            return Ok(None);
        }

        // F = −m·k·V^(m−1)·S, and likewise for the torque integral.
        let pn = exponent * stiffness * volume.powf(exponent - 1.0);
        let force = -pn * surf;
        let torque = -pn * torsum;

        let fsq = force.norm_squared();
        let contact_point = if !fsq.is_zero() {
            Some(x_a - torque.cross(&force) / fsq)
        } else {
            None
        };

        Ok(Some(OverlapResult {
            volume,
            force,
            torque,
            contact_point,
        }))
    }

    /// Sweeps the cap rings from the rim inward and reports the first ring
    /// index (plus one, since contact may lie between rings) whose
    /// quadrature directions reach the partner. Directions outside the
    /// actual contact cap contribute nothing to the integral and would only
    /// dilute its resolution.
    fn refine_cap_angle(
        &self,
        shape_a: &HarmonicShape,
        shape_b: &HarmonicShape,
        iang: Real,
        rad_b: Real,
        rot_np_bf: &Rotation,
        rot_np_sf: &Rotation,
        x_a: &Point,
        x_b: &Point,
        q_b: &Rotation,
    ) -> Option<usize> {
        let n_phi = 2 * (self.num_pole_quad - 1) + 1;
        let cosang = iang.cos();

        for kk in (0..self.num_pole_quad).rev() {
            let theta_pole =
                (self.abscissa[kk] * (1.0 - cosang) / 2.0 + (1.0 + cosang) / 2.0).acos();
            for ll in 0..n_phi {
                let phi_pole = TAU * ll as Real / n_phi as Real;
                let gp = spherical_direction(theta_pole, phi_pole);

                let gp_bf = rot_np_bf * gp;
                let (theta, phi) = spherical_angles(&gp_bf, 1.0);
                let rad_body = shape_a.radius(theta, phi);

                let gp_sf = rot_np_sf * gp;
                let ix_sf = x_a + rad_body * gp_sf;

                let x_test = ix_sf - x_b;
                let dist = x_test.norm();
                if dist > rad_b {
                    continue;
                }
                let proj = q_b.inverse_transform_vector(&x_test);
                let (theta_proj, phi_proj) = spherical_angles(&proj, dist);
                if shape_b.check_contact(phi_proj, theta_proj, dist).is_some() {
                    return Some(kk + 1);
                }
            }
        }
        None
    }

    /// Quadrature over the refined cap: per direction, the outer surface of
    /// A, the inner surface of the overlap found by bisection towards B, the
    /// volume difference, and the weighted surface/torque integrands.
    fn integrate_cap(
        &self,
        shape_a: &HarmonicShape,
        shape_b: &HarmonicShape,
        iang: Real,
        rad_a: Real,
        rad_b: Real,
        rot_np_bf: &Rotation,
        rot_np_sf: &Rotation,
        x_a: &Point,
        x_b: &Point,
        q_a: &Rotation,
        q_b: &Rotation,
    ) -> (Real, Vector, Vector) {
        let n_phi = 2 * (self.num_pole_quad - 1) + 1;
        let radtol = self.radius_tol * rad_a;
        let cosang = iang.cos();
        let fac = ((1.0 - cosang) / 2.0) * (TAU / n_phi as Real);

        let mut vol_overlap = 0.0;
        let mut surf = Vector::zeros();
        let mut torsum = Vector::zeros();

        for kk in (0..self.num_pole_quad).rev() {
            let theta_pole =
                (self.abscissa[kk] * (1.0 - cosang) / 2.0 + (1.0 + cosang) / 2.0).acos();
            for ll in 0..n_phi {
                let phi_pole = TAU * ll as Real / n_phi as Real;
                let gp = spherical_direction(theta_pole, phi_pole);

                let gp_sf = rot_np_sf * gp;
                let gp_bf = rot_np_bf * gp;
                let (mut theta_bf, phi_bf) = spherical_angles(&gp_bf, 1.0);
                // The normal scaling divides by sin θ; keep off the poles.
                if theta_bf.sin() == 0.0 {
                    theta_bf += 1.0e-5;
                }
                let st_bf = theta_bf.sin();

                let (rad_body, norm_bf) = shape_a.radius_and_normal(theta_bf, phi_bf);
                let ix_sf = x_a + rad_body * gp_sf;

                let x_test = ix_sf - x_b;
                let dist = x_test.norm();
                if dist > rad_b {
                    continue;
                }
                let proj = q_b.inverse_transform_vector(&x_test);
                let (theta_proj, phi_proj) = spherical_angles(&proj, dist);
                if shape_b.check_contact(phi_proj, theta_proj, dist).is_none() {
                    continue;
                }

                // Bisection along the radial ray for the point on B's
                // surface.
                let mut upper = rad_body;
                let mut lower = 0.0;
                let mut rad_sample = 0.5 * (upper + lower);
                while upper - lower > radtol {
                    let jx_sf = x_a + rad_sample * gp_sf;
                    let vec = jx_sf - x_b;
                    let d = vec.norm();
                    let inside = if d > rad_b {
                        false
                    } else {
                        let proj = q_b.inverse_transform_vector(&vec);
                        let (theta_s, phi_s) = spherical_angles(&proj, d);
                        shape_b.check_contact(phi_s, theta_s, d).is_some()
                    };
                    if inside {
                        upper = rad_sample;
                    } else {
                        lower = rad_sample;
                    }
                    rad_sample = 0.5 * (upper + lower);
                }

                vol_overlap += self.weights[kk] * (rad_body.powi(3) - rad_sample.powi(3));

                // w_k · n / sin θ, rotated to the space frame.
                let norm_sf = q_a * (norm_bf * (self.weights[kk] / st_bf));
                surf += norm_sf;
                let u = ix_sf - x_a;
                torsum += u.cross(&norm_sf);
            }
        }

        (vol_overlap * fac / 3.0, surf * fac, torsum * fac)
    }
}

/// The quaternion rotating the north pole (0, 0, 1) onto `dir`.
fn contact_quaternion(dir: &Vector) -> Rotation {
    Rotation::rotation_between(&Vector::z(), dir)
        .unwrap_or_else(|| Rotation::from_axis_angle(&Vector::x_axis(), PI))
}

#[inline]
fn spherical_direction(theta: Real, phi: Real) -> Vector {
    Vector::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos())
}

/// (θ, φ) of a vector with known norm, φ wrapped to [0, 2π).
#[inline]
fn spherical_angles(v: &Vector, norm: Real) -> (Real, Real) {
    let mut phi = v.y.atan2(v.x);
    if phi < 0.0 {
        phi += TAU;
    }
    let theta = (v.z / norm).clamp(-1.0, 1.0).acos();
    (theta, phi)
}
