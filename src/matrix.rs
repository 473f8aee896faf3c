//! Weighted quadratic forms used by all point set reductions.
//!
//! A weighted covariance of centered points X with weights W is X.diag(W).X'.
//! The diagonal is represented by a vector and the products are accumulated by rank one updates.

use na::constraint::{DimEq, ShapeConstraint};
use na::storage::{Storage, StorageMut};
use na::{Dim, Matrix, RealField, SquareMatrix, Vector};
use nalgebra as na;

/// Computes the quadratic form `mat = alpha * lhs * mid * lhs.transpose() + beta * mat`.
///
/// 'mid' is a diagonal matrix represented by a Vector.
///
/// # Examples:
///
/// ```
/// use nalgebra::{Matrix2, Matrix2x3, Matrix3, Vector3};
/// use sigma_filter::matrix::quadform_tr;
///
/// let mut mat = Matrix2::identity();
/// let lhs = Matrix2x3::new(1.0, 2.0, 3.0,
///                          4.0, 5.0, 6.0);
/// let mid = Vector3::new(0.1, 0.2, 0.3);
/// let expected = lhs * Matrix3::from_diagonal(&mid) * lhs.transpose() * 10.0 + mat * 5.0;
///
/// quadform_tr(&mut mat, 10.0, &lhs, &mid, 5.0);
/// approx::assert_relative_eq!(mat, expected, epsilon = 1e-12);
/// ```
pub fn quadform_tr<N: RealField, D1, S, R3, C3, S3, D4, S4>(
    mat: &mut SquareMatrix<N, D1, S>,
    alpha: N,
    lhs: &Matrix<N, R3, C3, S3>,
    mid: &Vector<N, D4, S4>,
    beta: N,
) where
    D1: Dim,
    S: StorageMut<N, D1, D1>,
    R3: Dim,
    C3: Dim,
    D4: Dim,
    S3: Storage<N, R3, C3>,
    S4: Storage<N, D4>,
    ShapeConstraint: DimEq<D1, R3> + DimEq<C3, D4>,
{
    cross_quadform_tr(mat, alpha, lhs, mid, lhs, beta)
}

/// Computes the weighted cross product `mat = alpha * lhs * mid * rhs.transpose() + beta * mat`.
///
/// 'mid' is a diagonal matrix represented by a Vector, lhs and rhs have one column per element of mid.
pub fn cross_quadform_tr<N: RealField, R1, C1, S1, R2, C2, S2, D3, S3, R4, C4, S4>(
    mat: &mut Matrix<N, R1, C1, S1>,
    alpha: N,
    lhs: &Matrix<N, R2, C2, S2>,
    mid: &Vector<N, D3, S3>,
    rhs: &Matrix<N, R4, C4, S4>,
    beta: N,
) where
    R1: Dim,
    C1: Dim,
    S1: StorageMut<N, R1, C1>,
    R2: Dim,
    C2: Dim,
    S2: Storage<N, R2, C2>,
    D3: Dim,
    S3: Storage<N, D3>,
    R4: Dim,
    C4: Dim,
    S4: Storage<N, R4, C4>,
    ShapeConstraint: DimEq<R1, R2> + DimEq<C1, R4> + DimEq<C2, D3> + DimEq<C4, D3>,
{
    if mid.nrows() == 0 {
        *mat *= beta;
        return;
    }

    mat.ger(alpha * mid[0], &lhs.column(0), &rhs.column(0), beta);

    for j in 1..mid.nrows() {
        mat.ger(alpha * mid[j], &lhs.column(j), &rhs.column(j), N::one());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use na::{Matrix2x3, Matrix3, Vector3};

    #[test]
    fn cross_quadform_matches_dense_product() {
        let lhs = Matrix2x3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        let rhs = Matrix3::new(0.5, -1.0, 2.0, 1.5, 0.0, -0.5, 1.0, 1.0, 1.0);
        let mid = Vector3::new(0.25, 0.5, 2.0);

        let mut mat = Matrix2x3::zeros();
        cross_quadform_tr(&mut mat, 1.0, &lhs, &mid, &rhs, 0.0);

        let expected = lhs * Matrix3::from_diagonal(&mid) * rhs.transpose();
        approx::assert_relative_eq!(mat, expected, epsilon = 1e-12);
    }
}
