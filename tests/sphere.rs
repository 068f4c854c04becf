use approx::assert_relative_eq;
use spharm3d::math::{Point, Real, Rotation, Vector};
use spharm3d::query::{OverlapError, OverlapSolver};
use spharm3d::shape::{coefficient_len, HarmonicShape, ShapeBuilder};
use std::f64::consts::PI;

fn unit_sphere(n_max: usize, n_quad: usize) -> HarmonicShape {
    let mut coeffs = vec![0.0; coefficient_len(n_max)];
    coeffs[0] = (4.0 * PI).sqrt();
    ShapeBuilder::new(n_max, n_quad)
        .build_from_coefficients(coeffs)
        .unwrap()
}

/// Analytical lens volume of two equal spheres of radius `r` at center
/// distance `d`.
fn sphere_sphere_overlap(r: Real, d: Real) -> Real {
    PI * (4.0 * r + d) * (2.0 * r - d) * (2.0 * r - d) / 12.0
}

#[test]
fn sphere_tables_are_trivial() {
    let sphere = unit_sphere(8, 20);
    assert_relative_eq!(sphere.volume(), 4.0 * PI / 3.0, epsilon = 1.0e-10);
    assert_relative_eq!(sphere.max_rad(), 1.0, epsilon = 1.0e-10);
    for &r in sphere.quadrature_radii() {
        assert_relative_eq!(r, 1.0, epsilon = 1.0e-10);
    }
    // An isotropic inertia tensor: all principal values 2/5·r², identity
    // eigenframe up to sign.
    let inertia = sphere.principal_inertia();
    assert_relative_eq!(inertia.x, 0.4, epsilon = 1.0e-8);
    assert_relative_eq!(inertia.y, 0.4, epsilon = 1.0e-8);
    assert_relative_eq!(inertia.z, 0.4, epsilon = 1.0e-8);
    assert_relative_eq!(sphere.initial_orientation().w.abs(), 1.0, epsilon = 1.0e-10);
}

#[test]
fn sphere_sphere_overlap_matches_lens_formula() {
    let sphere = unit_sphere(8, 20);
    let solver = OverlapSolver::default();

    let x_a = Point::origin();
    let x_b = Point::new(1.9, 0.0, 0.0);
    let q = Rotation::identity();

    let result = solver
        .overlap(&sphere, &sphere, &x_a, &x_b, &q, &q, 1.0, 1.5)
        .unwrap()
        .expect("overlapping spheres must touch");

    let expected = sphere_sphere_overlap(1.0, 1.9);
    assert_relative_eq!(result.volume, expected, max_relative = 2.0e-2);

    // The directed surface integral of the contact cap of a unit sphere is
    // π·sin²θ_c with cosθ_c = d/2.
    let cos_c: Real = 0.95;
    let s_x = PI * (1.0 - cos_c * cos_c);
    let expected_force = 1.5 * result.volume.sqrt() * s_x;
    assert!(result.force.x < 0.0, "force must push A away from B");
    assert_relative_eq!(result.force.norm(), expected_force, max_relative = 3.0e-2);
    assert_relative_eq!(result.force.y, 0.0, epsilon = 1.0e-6);
    assert_relative_eq!(result.force.z, 0.0, epsilon = 1.0e-6);

    // Head-on sphere contact transfers no torque.
    assert!(result.torque.norm() < 1.0e-6);
    let partner = result.partner_torque(&x_b).unwrap();
    assert!(partner.norm() < 1.0e-6);
}

#[test]
fn separated_spheres_do_not_interact() {
    let sphere = unit_sphere(8, 20);
    let solver = OverlapSolver::default();
    let q = Rotation::identity();

    let result = solver
        .overlap(
            &sphere,
            &sphere,
            &Point::origin(),
            &Point::new(2.1, 0.0, 0.0),
            &q,
            &q,
            1.0,
            1.5,
        )
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn concentric_spheres_are_rejected() {
    let sphere = unit_sphere(8, 20);
    let solver = OverlapSolver::default();
    let q = Rotation::identity();

    let err = solver
        .overlap(
            &sphere,
            &sphere,
            &Point::origin(),
            &Point::new(0.5, 0.0, 0.0),
            &q,
            &q,
            1.0,
            1.5,
        )
        .unwrap_err();
    assert!(matches!(err, OverlapError::CenterInsideOther { .. }));
}

#[test]
fn tighter_bisection_tolerance_converges_to_the_same_volume() {
    let sphere = unit_sphere(8, 20);
    let q = Rotation::identity();
    let x_a = Point::origin();
    let x_b = Point::new(1.9, 0.0, 0.0);

    let coarse = OverlapSolver::new(30, 1.0e-3)
        .overlap(&sphere, &sphere, &x_a, &x_b, &q, &q, 1.0, 1.5)
        .unwrap()
        .unwrap();
    let fine = OverlapSolver::new(30, 1.0e-6)
        .overlap(&sphere, &sphere, &x_a, &x_b, &q, &q, 1.0, 1.5)
        .unwrap()
        .unwrap();

    assert_relative_eq!(coarse.volume, fine.volume, max_relative = 1.0e-2);

    let radial = Vector::new(1.0, 0.0, 0.0);
    assert!(coarse.force.angle(&-radial) < 1.0e-3);
    assert!(fine.force.angle(&-radial) < 1.0e-3);
}
