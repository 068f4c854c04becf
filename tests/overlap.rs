use approx::assert_relative_eq;
use spharm3d::math::{Point, Real, Rotation, UnitVector, Vector};
use spharm3d::query::OverlapSolver;
use spharm3d::shape::{coefficient_len, fit_coefficients, HarmonicShape, ShapeBuilder};
use std::f64::consts::PI;

fn unit_sphere(n_max: usize) -> HarmonicShape {
    let mut coeffs = vec![0.0; coefficient_len(n_max)];
    coeffs[0] = (4.0 * PI).sqrt();
    ShapeBuilder::new(n_max, 20)
        .build_from_coefficients(coeffs)
        .unwrap()
}

fn fitted_ellipsoid(a: Real, b: Real, c: Real, n_max: usize) -> HarmonicShape {
    let radius = move |theta: Real, phi: Real| {
        let (st, ct) = (theta.sin(), theta.cos());
        let (sp, cp) = (phi.sin(), phi.cos());
        1.0 / ((st * cp / a).powi(2) + (st * sp / b).powi(2) + (ct / c).powi(2)).sqrt()
    };
    let coeffs = fit_coefficients(n_max, 4 * n_max, radius);
    ShapeBuilder::new(n_max, 30)
        .build_from_coefficients(coeffs)
        .unwrap()
}

#[test]
fn ellipsoid_sphere_axial_contact() {
    let ellipsoid = fitted_ellipsoid(1.0, 1.0, 2.0, 10);
    let sphere = unit_sphere(8);
    let solver = OverlapSolver::default();
    let q = Rotation::identity();

    // The ellipsoid pole reaches z = 2, the sphere bottom z = 1.5.
    let result = solver
        .overlap(
            &ellipsoid,
            &sphere,
            &Point::origin(),
            &Point::new(0.0, 0.0, 2.5),
            &q,
            &q,
            1.0,
            1.5,
        )
        .unwrap()
        .expect("axial configuration must overlap");

    assert!(result.volume > 0.0);
    // The force is axial and repulsive.
    assert!(result.force.z < 0.0);
    assert!(result.force.xy().norm() < 1.0e-4 * result.force.norm().max(1.0));
    // An axisymmetric contact transfers no torque.
    assert!(result.torque.norm() < 1.0e-4 * (1.0 + result.force.norm()));
}

#[test]
fn distant_ellipsoids_return_exactly_zero() {
    let ellipsoid = fitted_ellipsoid(1.0, 1.0, 2.0, 8);
    let solver = OverlapSolver::default();
    let q = Rotation::identity();
    let gap = 3.0 * ellipsoid.max_rad();

    let result = solver
        .overlap(
            &ellipsoid,
            &ellipsoid,
            &Point::origin(),
            &Point::new(gap, 0.0, 0.0),
            &q,
            &q,
            1.0,
            1.5,
        )
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn overlap_is_rotation_equivariant() {
    let ellipsoid = fitted_ellipsoid(1.0, 1.0, 1.5, 8);
    let sphere = unit_sphere(8);
    let solver = OverlapSolver::default();

    let x_a = Point::new(0.2, -0.1, 0.3);
    let x_b = Point::new(0.2, 1.9, 0.6);
    let q_a = Rotation::from_axis_angle(&Vector::x_axis(), 0.7);
    let q_b = Rotation::identity();

    let base = solver
        .overlap(&ellipsoid, &sphere, &x_a, &x_b, &q_a, &q_b, 1.0, 1.5)
        .unwrap()
        .expect("base configuration must overlap");

    let axis = UnitVector::new_normalize(Vector::new(1.0, 2.0, -0.5));
    let rot = Rotation::from_axis_angle(&axis, 1.2)
        * Rotation::from_axis_angle(&Vector::z_axis(), -0.4);

    let moved = solver
        .overlap(
            &ellipsoid,
            &sphere,
            &(rot * x_a),
            &(rot * x_b),
            &(rot * q_a),
            &(rot * q_b),
            1.0,
            1.5,
        )
        .unwrap()
        .expect("rotated configuration must overlap");

    assert_relative_eq!(base.volume, moved.volume, max_relative = 1.0e-5);
    assert_relative_eq!(rot * base.force, moved.force, epsilon = 1.0e-5 * (1.0 + base.force.norm()));
    assert_relative_eq!(
        rot * base.torque,
        moved.torque,
        epsilon = 1.0e-5 * (1.0 + base.torque.norm())
    );
}

#[test]
fn reaction_terms_balance_forces() {
    let ellipsoid = fitted_ellipsoid(1.0, 1.2, 1.5, 8);
    let sphere = unit_sphere(8);
    let solver = OverlapSolver::default();

    let x_a = Point::origin();
    let x_b = Point::new(1.4, 0.9, 1.1);
    let q_a = Rotation::from_axis_angle(&Vector::y_axis(), 0.5);
    let q_b = Rotation::identity();

    let result = solver
        .overlap(&ellipsoid, &sphere, &x_a, &x_b, &q_a, &q_b, 1.0, 1.5)
        .unwrap()
        .expect("configuration must overlap");

    // The reaction force on B is −F; its torque comes from the effective
    // contact point.
    let torque_b = result.partner_torque(&x_b).expect("nonzero force");
    let xc = result.contact_point.unwrap();

    // Torque on A about the contact point equals τ_A − (x_c − x_A) × F = 0
    // by construction of x_c up to the force-parallel component.
    let residual = result.torque - (xc - x_a).cross(&result.force);
    let parallel = residual.dot(&result.force.normalize());
    assert_relative_eq!(
        residual.norm(),
        parallel.abs(),
        max_relative = 1.0e-6,
        epsilon = 1.0e-10 * (1.0 + result.torque.norm())
    );

    // And τ_B is exactly F × (x_c − x_B).
    assert_relative_eq!(
        torque_b,
        result.force.cross(&(xc - x_b)),
        epsilon = 1.0e-12
    );
}
