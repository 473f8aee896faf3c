//! Numerical comparison of reciprocal condition numbers.
//!
//! The condition number is estimated from the diagonal of a matrix or factor.
//! The maximum diagonal element is taken as the norm of the matrix and the minimum as the norm of its inverse,
//! therefore rcond = min/max.
//!
//! Conventions:
//!  0 for a semi-definite or an empty matrix,
//!  0 when both min and max are infinite,
//!  < 0 for a negative matrix (a diagonal element < 0) or any NaN element.

use nalgebra::{allocator::Allocator, DefaultAllocator, Dim, MatrixMN, RealField, VectorN};

/// Reciprocal condition number of a diagonal matrix passed as a vector.
pub fn rcond_vec<N: RealField, R: Dim>(dv: &VectorN<N, R>) -> N
where
    DefaultAllocator: Allocator<N, R>,
{
    rcond_of(dv.iter().cloned())
}

/// Reciprocal condition number of the diagonal of a symmetric matrix or a triangular factor.
pub fn rcond_symetric<N: RealField, R: Dim, C: Dim>(sm: &MatrixMN<N, R, C>) -> N
where
    DefaultAllocator: Allocator<N, R, C>,
{
    let n = sm.nrows().min(sm.ncols());
    rcond_of((0..n).map(|i| sm[(i, i)]))
}

fn rcond_of<N: RealField>(mut diagonal: impl Iterator<Item = N>) -> N {
    let first = match diagonal.next() {
        Some(d) => d,
        // Special case an empty matrix
        None => return N::zero(),
    };
    if first != first {
        return -N::one();
    }

    let mut mind = first;
    let mut maxd = first;
    for d in diagonal {
        if d != d {
            // NaN
            return -N::one();
        }
        if d < mind {
            mind = d;
        }
        if d > maxd {
            maxd = d;
        }
    }

    rcond_min_max(mind, maxd)
}

fn rcond_min_max<N: RealField>(mind: N, maxd: N) -> N {
    if mind < N::zero() {
        // matrix is negative, mind does not represent a rcond
        mind
    } else {
        debug_assert!(mind <= maxd);
        let rcond = mind / maxd;
        if rcond != rcond {
            // NaN, singular due to (mind == maxd) == (zero or infinity)
            N::zero()
        } else {
            rcond
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix2, Vector3};

    #[test]
    fn rcond_is_min_over_max() {
        approx::assert_relative_eq!(rcond_vec(&Vector3::new(2., 8., 4.)), 0.25);
        approx::assert_relative_eq!(rcond_symetric(&Matrix2::new(1., 7., 7., 4.)), 0.25);
    }

    #[test]
    fn rcond_conventions() {
        assert_eq!(rcond_vec(&Vector3::new(0., 0., 0.)), 0.);
        assert!(rcond_vec(&Vector3::new(1., -1., 2.)) < 0.);
        assert!(rcond_vec(&Vector3::new(1., f64::NAN, 2.)) < 0.);
        assert_eq!(rcond_symetric(&nalgebra::DMatrix::<f64>::zeros(0, 0)), 0.);
    }
}
