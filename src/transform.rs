//! Point set transforms.
//!
//! A [`PointSetTransform`] represents a Gaussian by a deterministic [`PointSet`].
//! [`UnscentedTransform`] is the Julier-Uhlmann 'Unscented' transform with the scaled weights of Wan and van der Merwe.
//!
//! # Augmented Gaussians
//!
//! A transform can place a Gaussian as one diagonal block of a larger 'augmented' Gaussian
//! of `global_dimension`, starting at dimension `offset`:
//!
//! ```text
//!     [ P  0  0 ]
//!     [ 0  Q  0 ]    global_dimension = dim(P) + dim(Q) + dim(R)
//!     [ 0  0  R ]    offset(P) = 0, offset(Q) = dim(P), offset(R) = dim(P) + dim(Q)
//! ```
//!
//! The number of points is that of the augmented Gaussian. Only the points spread along the block's own
//! dimensions differ from the block's mean, all others are the mean. Transforming P, Q and R separately
//! therefore yields three point sets whose point i together form point i of the augmented Gaussian.

use na::{allocator::Allocator, DefaultAllocator, Dim, RealField};
use nalgebra as na;
use num_traits::pow;

use crate::error::{FilterError, Result};
use crate::models::Gaussian;
use crate::point_set::{PointSet, Weight};

/// Transform of a Gaussian into a point set.
pub trait PointSetTransform<N: RealField> {
    /// Number of points generated for a Gaussian of `dimension`.
    fn number_of_points(dimension: usize) -> usize;

    /// Number of points for the dimension D if it is fixed, 0 if D is only known at run time.
    fn fixed_number_of_points<D: Dim>() -> usize {
        D::try_to_usize().map_or(0, Self::number_of_points)
    }

    /// Transforms the Gaussian into the point set.
    fn forward<D: Dim, C: Dim>(&self, gaussian: &Gaussian<N, D>, point_set: &mut PointSet<N, D, C>) -> Result<()>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, D, C> + Allocator<N, C>,
    {
        self.forward_augmented(gaussian, gaussian.dimension(), 0, point_set)
    }

    /// Transforms the Gaussian as the block at `offset` of an augmented Gaussian of `global_dimension`.
    ///
    /// A point set with a fixed count must hold exactly the required number of points, a dynamic one is resized.
    fn forward_augmented<D: Dim, C: Dim>(
        &self,
        gaussian: &Gaussian<N, D>,
        global_dimension: usize,
        offset: usize,
        point_set: &mut PointSet<N, D, C>,
    ) -> Result<()>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, D, C> + Allocator<N, C>;
}

/// Unscented transform parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnscentedTransform<N: RealField> {
    /// Spread of the points around the mean
    pub alpha: N,
    /// Prior knowledge of the distribution, 2 is optimal for a Gaussian
    pub beta: N,
    /// Secondary (higher order) scaling
    pub kappa: N,
}

impl<N: RealField> Default for UnscentedTransform<N> {
    /// alpha = 1, beta = 2, kappa = 0
    fn default() -> Self {
        UnscentedTransform {
            alpha: N::one(),
            beta: N::one() + N::one(),
            kappa: N::zero(),
        }
    }
}

impl<N: RealField> UnscentedTransform<N> {
    pub fn new(alpha: N, beta: N, kappa: N) -> Self {
        UnscentedTransform { alpha, beta, kappa }
    }

    /// lambda = alpha^2 (dim + kappa) - dim
    pub fn lambda_scalar(&self, dim: N) -> N {
        pow(self.alpha, 2) * (dim + self.kappa) - dim
    }

    /// Scale of the covariance square root, sqrt(dim + lambda)
    pub fn gamma_factor(&self, dim: N) -> N {
        (dim + self.lambda_scalar(dim)).sqrt()
    }

    pub fn weight_mean_0(&self, dim: N) -> N {
        let lambda = self.lambda_scalar(dim);
        lambda / (dim + lambda)
    }

    pub fn weight_cov_0(&self, dim: N) -> N {
        self.weight_mean_0(dim) + (N::one() - pow(self.alpha, 2) + self.beta)
    }

    pub fn weight_mean_i(&self, dim: N) -> N {
        N::one() / ((N::one() + N::one()) * (dim + self.lambda_scalar(dim)))
    }

    pub fn weight_cov_i(&self, dim: N) -> N {
        self.weight_mean_i(dim)
    }
}

impl<N: RealField> PointSetTransform<N> for UnscentedTransform<N> {
    fn number_of_points(dimension: usize) -> usize {
        2 * dimension + 1
    }

    fn forward_augmented<D: Dim, C: Dim>(
        &self,
        gaussian: &Gaussian<N, D>,
        global_dimension: usize,
        offset: usize,
        point_set: &mut PointSet<N, D, C>,
    ) -> Result<()>
    where
        DefaultAllocator: Allocator<N, D, D> + Allocator<N, D> + Allocator<N, D, C> + Allocator<N, C>,
    {
        let point_count = Self::number_of_points(global_dimension);
        if let Some(fixed) = C::try_to_usize() {
            if fixed != point_count {
                return Err(FilterError::SizeMismatch {
                    expected: fixed,
                    actual: point_count,
                });
            }
        }
        let local_dimension = gaussian.dimension();
        if offset + local_dimension > global_dimension {
            return Err(FilterError::InvalidOffset {
                offset,
                local: local_dimension,
                global: global_dimension,
            });
        }
        if point_set.dimension() != local_dimension {
            return Err(FilterError::DimensionMismatch {
                expected: point_set.dimension(),
                actual: local_dimension,
            });
        }

        point_set.resize(point_count)?;

        let dim: N = na::convert(global_dimension as f64);
        let sigma = gaussian.square_root() * self.gamma_factor(dim);
        let mean = gaussian.mean();

        point_set.set_point(0, mean, Weight::new(self.weight_mean_0(dim), self.weight_cov_0(dim)))?;

        let weight_i = Weight::new(self.weight_mean_i(dim), self.weight_cov_i(dim));
        let block = offset + 1..=offset + local_dimension;
        for i in 1..=global_dimension {
            if block.contains(&i) {
                let sigma_col = sigma.column(i - offset - 1);
                point_set.set_point(i, &(mean + &sigma_col), weight_i)?;
                point_set.set_point(global_dimension + i, &(mean - &sigma_col), weight_i)?;
            } else {
                // Another block's direction
                point_set.set_point(i, mean, weight_i)?;
                point_set.set_point(global_dimension + i, mean, weight_i)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameters() {
        let ut = UnscentedTransform::<f64>::default();
        assert_eq!(ut, UnscentedTransform::new(1., 2., 0.));
    }

    #[test]
    fn scalars_of_worked_example() {
        let ut = UnscentedTransform::<f64>::default();
        approx::assert_abs_diff_eq!(ut.lambda_scalar(2.), 0.);
        approx::assert_abs_diff_eq!(ut.gamma_factor(2.), 2f64.sqrt());
        approx::assert_abs_diff_eq!(ut.weight_mean_0(2.), 0.);
        approx::assert_abs_diff_eq!(ut.weight_cov_0(2.), 2.);
        approx::assert_abs_diff_eq!(ut.weight_mean_i(2.), 0.25);
        approx::assert_abs_diff_eq!(ut.weight_cov_i(2.), 0.25);
    }

    #[test]
    fn number_of_points() {
        assert_eq!(UnscentedTransform::<f64>::number_of_points(0), 1);
        assert_eq!(UnscentedTransform::<f64>::number_of_points(3), 7);
        assert_eq!(UnscentedTransform::<f64>::fixed_number_of_points::<na::U2>(), 5);
        assert_eq!(UnscentedTransform::<f64>::fixed_number_of_points::<na::Dynamic>(), 0);
    }
}
