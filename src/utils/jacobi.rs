//! Cyclic Jacobi eigendecomposition of symmetric 3×3 matrices.

use crate::math::{Matrix, Real, Vector};

/// Diagonalizes a symmetric 3×3 matrix by cyclic Jacobi rotations.
///
/// Returns the eigenvalues and the matrix whose columns are the matching
/// eigenvectors, or `None` if the off-diagonal mass did not vanish within
/// `max_sweeps` sweeps. Eigenvalues are not sorted.
pub fn jacobi_eigen(mat: &Matrix, max_sweeps: usize) -> Option<(Vector, Matrix)> {
    let mut a = *mat;
    let mut v = Matrix::identity();
    let mut b = Vector::new(a[(0, 0)], a[(1, 1)], a[(2, 2)]);
    let mut d = b;
    let mut z = Vector::zeros();

    for sweep in 1..=max_sweeps {
        let sm = a[(0, 1)].abs() + a[(0, 2)].abs() + a[(1, 2)].abs();
        if sm == 0.0 {
            return Some((d, v));
        }

        let tresh = if sweep < 4 { 0.2 * sm / 9.0 } else { 0.0 };

        for ip in 0..2 {
            for iq in (ip + 1)..3 {
                let g = 100.0 * a[(ip, iq)].abs();
                if sweep > 4 && d[ip].abs() + g == d[ip].abs() && d[iq].abs() + g == d[iq].abs() {
                    a[(ip, iq)] = 0.0;
                } else if a[(ip, iq)].abs() > tresh {
                    let mut h = d[iq] - d[ip];
                    let t = if h.abs() + g == h.abs() {
                        a[(ip, iq)] / h
                    } else {
                        let theta = 0.5 * h / a[(ip, iq)];
                        let mut t = 1.0 / (theta.abs() + (1.0 + theta * theta).sqrt());
                        if theta < 0.0 {
                            t = -t;
                        }
                        t
                    };

                    let c = 1.0 / (1.0 + t * t).sqrt();
                    let s = t * c;
                    let tau = s / (1.0 + c);
                    h = t * a[(ip, iq)];
                    z[ip] -= h;
                    z[iq] += h;
                    d[ip] -= h;
                    d[iq] += h;
                    a[(ip, iq)] = 0.0;

                    for j in 0..ip {
                        rotate(&mut a, s, tau, j, ip, j, iq);
                    }
                    for j in (ip + 1)..iq {
                        rotate(&mut a, s, tau, ip, j, j, iq);
                    }
                    for j in (iq + 1)..3 {
                        rotate(&mut a, s, tau, ip, j, iq, j);
                    }
                    for j in 0..3 {
                        rotate(&mut v, s, tau, j, ip, j, iq);
                    }
                }
            }
        }

        for i in 0..3 {
            b[i] += z[i];
            d[i] = b[i];
            z[i] = 0.0;
        }
    }
    None
}

#[inline]
fn rotate(m: &mut Matrix, s: Real, tau: Real, i: usize, j: usize, k: usize, l: usize) {
    let g = m[(i, j)];
    let h = m[(k, l)];
    m[(i, j)] = g - s * (h + g * tau);
    m[(k, l)] = h + s * (g - h * tau);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_known_spectrum() {
        let m = Matrix::new(2.0, 1.0, 0.0, 1.0, 2.0, 0.0, 0.0, 0.0, 5.0);
        let (vals, vecs) = jacobi_eigen(&m, 50).unwrap();

        let mut sorted: Vec<Real> = vals.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_relative_eq!(sorted[0], 1.0, epsilon = 1.0e-12);
        assert_relative_eq!(sorted[1], 3.0, epsilon = 1.0e-12);
        assert_relative_eq!(sorted[2], 5.0, epsilon = 1.0e-12);

        // Columns must reconstruct the input: m v_i = λ_i v_i.
        for i in 0..3 {
            let vi = vecs.column(i).into_owned();
            assert_relative_eq!(m * vi, vals[i] * vi, epsilon = 1.0e-10);
        }
    }

    #[test]
    fn identity_is_a_fixed_point() {
        let m = Matrix::identity();
        let (vals, vecs) = jacobi_eigen(&m, 50).unwrap();
        assert_relative_eq!(vals, Vector::new(1.0, 1.0, 1.0), epsilon = 1.0e-15);
        assert_relative_eq!(vecs, Matrix::identity(), epsilon = 1.0e-15);
    }
}
