#![allow(non_snake_case)]

//! Upper triangular Cholesky factorisation of positive semi-definite matrices.
//!
//! M = UC.UC' where UC is upper triangular.
//! Semi-definite matrices are factorised, a zero diagonal element of UC marks a singular direction.
//! The factor is the covariance square root used to spread sigma points.

use nalgebra as na;
use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixN, RealField};

use super::rcond;
use crate::error::{FilterError, Result};

/// In place upper triangular Cholesky factor of a positive definite or semi-definite matrix M.
///
/// Pivots within the round-off tolerance eps.max|diag(M)| are taken as zero, see [`UCfactor_tol`].
pub fn UCfactor<N: RealField, D: Dim>(M: &mut MatrixN<N, D>) -> N
where
    DefaultAllocator: Allocator<N, D, D>,
{
    let tolerance = N::default_epsilon() * max_abs_diagonal(M);
    UCfactor_tol(M, tolerance)
}

/// In place upper triangular Cholesky factor with an explicit pivot tolerance.
///
/// Reference: A+G p.218
///
/// Input: M, strict lower triangle of M is ignored in computation.
/// A pivot d with |d| <= tolerance is zero, its column must then vanish to within the tolerance.
///
/// Output: M as UC.UC' factor, upper_triangle(M) = UC, strict lower triangle zeroed.
///
/// Return: reciprocal condition number, -1 if negative, 0 if semi-definite (including zero)
pub fn UCfactor_tol<N: RealField, D: Dim>(M: &mut MatrixN<N, D>, tolerance: N) -> N
where
    DefaultAllocator: Allocator<N, D, D>,
{
    // |M[i,j]|^2 <= M[i,i].M[j,j] for a PSD matrix
    let column_limit = tolerance * (max_abs_diagonal(M) + tolerance);

    let n = M.nrows();
    for j in (0..n).rev() {
        let mut d = M[(j, j)];

        if d > tolerance {
            // Positive definite
            d = d.sqrt();
            M[(j, j)] = d;
            d = N::one() / d;

            for i in 0..j {
                let e = d * M[(i, j)];
                M[(i, j)] = e;
                for k in 0..=i {
                    let t = e * M[(k, j)];
                    M[(k, i)] -= t;
                }
            }
        } else if d >= -tolerance {
            // Semi-definite, the column above must be zero
            for i in 0..j {
                let e = M[(i, j)];
                if e * e > column_limit {
                    return -N::one();
                }
                M[(i, j)] = N::zero();
            }
            M[(j, j)] = N::zero();
        } else {
            // Negative or NaN
            return -N::one();
        }
    }

    M.fill_lower_triangle(N::zero(), 1);

    UCrcond(M)
}

/// Largest absolute diagonal element, the scale of round-off in a factorisation.
pub fn max_abs_diagonal<N: RealField, D: Dim>(M: &MatrixN<N, D>) -> N
where
    DefaultAllocator: Allocator<N, D, D>,
{
    (0..M.nrows()).fold(N::zero(), |m, i| m.max(M[(i, i)].abs()))
}

/// Estimate the reciprocal condition number for inversion of the original PSD matrix for which UC is the factor UC.UC'.
///
/// The rcond of the original matrix is the square of the rcond of diagonal(UC), the sign is propagated.
pub fn UCrcond<N: RealField, D: Dim>(UC: &MatrixN<N, D>) -> N
where
    DefaultAllocator: Allocator<N, D, D>,
{
    let rcond = rcond::rcond_symetric(UC);
    if rcond < N::zero() {
        -(rcond * rcond)
    } else {
        rcond * rcond
    }
}

/// Square root S of a covariance such that S.S' = covariance.
///
/// Only the upper triangle of the covariance is used.
/// Fails if the covariance is not positive semi-definite.
pub fn covariance_square_root<N: RealField, D: Dim>(covariance: &MatrixN<N, D>) -> Result<MatrixN<N, D>>
where
    DefaultAllocator: Allocator<N, D, D>,
{
    let tolerance = N::default_epsilon() * max_abs_diagonal(covariance);
    covariance_square_root_tol(covariance, tolerance)
}

/// Square root S of a covariance, pivots with |d| <= tolerance are taken as zero.
pub fn covariance_square_root_tol<N: RealField, D: Dim>(covariance: &MatrixN<N, D>, tolerance: N) -> Result<MatrixN<N, D>>
where
    DefaultAllocator: Allocator<N, D, D>,
{
    let mut UC = covariance.clone();
    let rcond = UCfactor_tol(&mut UC, tolerance);
    if rcond >= N::zero() {
        Ok(UC)
    } else {
        Err(FilterError::NotPsd("square root factorisation"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use na::{DMatrix, Matrix2, Matrix3};

    #[test]
    fn factor_reconstructs_matrix() {
        let m = Matrix3::new(4., 2., 0.6, 2., 3., 0.4, 0.6, 0.4, 1.);
        let s = covariance_square_root(&m).unwrap();
        approx::assert_relative_eq!(s * s.transpose(), m, epsilon = 1e-12);
        assert_eq!(s[(1, 0)], 0.);
        assert_eq!(s[(2, 1)], 0.);
    }

    #[test]
    fn factor_of_identity_is_identity() {
        let s = covariance_square_root(&DMatrix::<f64>::identity(3, 3)).unwrap();
        assert_eq!(s, DMatrix::identity(3, 3));
    }

    #[test]
    fn semi_definite_is_factorised() {
        let m = Matrix2::new(1., 0., 0., 0.);
        let mut uc = m;
        let rcond = UCfactor(&mut uc);
        assert_eq!(rcond, 0.);
        approx::assert_relative_eq!(uc * uc.transpose(), m);
    }

    #[test]
    fn round_off_pivots_are_zero() {
        // Zero up to round-off, one pivot slightly negative
        let m = Matrix2::new(3e-17, -1e-17, -1e-17, -2e-17);
        assert_eq!(
            covariance_square_root(&m),
            Err(FilterError::NotPsd("square root factorisation"))
        );
        let s = covariance_square_root_tol(&m, 1e-15).unwrap();
        assert_eq!(s, Matrix2::zeros());
    }

    #[test]
    fn negative_is_rejected() {
        let m = Matrix2::new(1., 2., 2., 1.);
        assert_eq!(
            covariance_square_root(&m),
            Err(FilterError::NotPsd("square root factorisation"))
        );
    }
}
