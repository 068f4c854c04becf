//! Numerical kernels shared by the shape, mass-properties and query modules.

pub use self::gauss_legendre::{gl_pair, QuadPair};
pub use self::jacobi::jacobi_eigen;
pub use self::legendre::{
    factorial, norm_factor, plegendre, plegendre_nn, plegendre_recycle, plegendre_unnorm,
    DomainError,
};

pub mod gauss_legendre;
pub mod jacobi;
pub mod legendre;
