//! Weighted point sets.
//!
//! A [`PointSet`] is a discrete approximation of a Gaussian by weighted points, e.g. sigma points.
//! Each point carries a mean weight and a covariance weight.
//!
//! Points are stored as the columns of a D x C matrix. The point count C is a nalgebra dimension:
//! a fixed count (U5) is fixed at compile time and cannot be resized,
//! a `Dynamic` count is resized on demand.
//! The same holds for the point dimension D, so filter code is generic over both.

use na::storage::Storage;
use na::{allocator::Allocator, DefaultAllocator, Dim, Dynamic, MatrixMN, MatrixN, RealField, VectorN, U1};
use nalgebra as na;

use crate::error::{FilterError, Result};
use crate::matrix;

/// Weight pair of a point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Weight<N> {
    /// Weight of the point in the mean
    pub w_mean: N,
    /// Weight of the point in the covariance
    pub w_cov: N,
}

impl<N: RealField> Weight<N> {
    pub fn new(w_mean: N, w_cov: N) -> Self {
        Weight { w_mean, w_cov }
    }
}

/// A point and its weights.
#[derive(Clone, PartialEq)]
pub struct WeightedPoint<N: RealField, D: Dim>
where
    DefaultAllocator: Allocator<N, D>,
{
    pub point: VectorN<N, D>,
    pub weight: Weight<N>,
}

/// Ordered set of weighted points of dimension D and point count C.
#[derive(Clone, PartialEq)]
pub struct PointSet<N: RealField, D: Dim, C: Dim = Dynamic>
where
    DefaultAllocator: Allocator<N, D, C> + Allocator<N, C>,
{
    points: MatrixMN<N, D, C>,
    weights_mean: VectorN<N, C>,
    weights_cov: VectorN<N, C>,
}

impl<N: RealField, D: Dim, C: Dim> PointSet<N, D, C>
where
    DefaultAllocator: Allocator<N, D, C> + Allocator<N, C> + Allocator<N, D>,
{
    /// Zero points with zero weights.
    pub fn new(d: D, c: C) -> Self {
        PointSet {
            points: MatrixMN::zeros_generic(d, c),
            weights_mean: VectorN::zeros_generic(c, U1),
            weights_cov: VectorN::zeros_generic(c, U1),
        }
    }

    /// Zero points with a point count given at run time.
    ///
    /// A fixed point count must equal `count`.
    pub fn with_count(d: D, count: usize) -> Result<Self> {
        Ok(Self::new(d, count_dim::<C>(count)?))
    }

    /// True if the point count is fixed and cannot be resized.
    pub fn is_fixed() -> bool {
        C::try_to_usize().is_some()
    }

    /// Number of points
    pub fn count(&self) -> usize {
        self.points.ncols()
    }

    /// Dimension of each point
    pub fn dimension(&self) -> usize {
        self.points.nrows()
    }

    /// Changes the number of points. Points and weights are zeroed if the count changes.
    ///
    /// Fails for a fixed point set unless `count` is its fixed count.
    pub fn resize(&mut self, count: usize) -> Result<()> {
        if count == self.count() {
            return Ok(());
        }
        if let Some(fixed) = C::try_to_usize() {
            return Err(FilterError::ResizeFixed {
                fixed,
                requested: count,
            });
        }
        let c = C::from_usize(count);
        self.points = MatrixMN::zeros_generic(self.points.data.shape().0, c);
        self.weights_mean = VectorN::zeros_generic(c, U1);
        self.weights_cov = VectorN::zeros_generic(c, U1);
        Ok(())
    }

    fn check_index(&self, i: usize) -> Result<()> {
        if i < self.count() {
            Ok(())
        } else {
            Err(FilterError::OutOfBounds {
                index: i,
                size: Some(self.count()),
            })
        }
    }

    fn check_dimension(&self, point: &VectorN<N, D>) -> Result<()> {
        if point.nrows() == self.dimension() {
            Ok(())
        } else {
            Err(FilterError::DimensionMismatch {
                expected: self.dimension(),
                actual: point.nrows(),
            })
        }
    }

    /// Sets point i and its weights.
    pub fn set_point(&mut self, i: usize, point: &VectorN<N, D>, weight: Weight<N>) -> Result<()> {
        self.check_index(i)?;
        self.check_dimension(point)?;
        self.points.set_column(i, point);
        self.weights_mean[i] = weight.w_mean;
        self.weights_cov[i] = weight.w_cov;
        Ok(())
    }

    /// Sets point i keeping its weights.
    pub fn set_point_only(&mut self, i: usize, point: &VectorN<N, D>) -> Result<()> {
        self.check_index(i)?;
        self.check_dimension(point)?;
        self.points.set_column(i, point);
        Ok(())
    }

    pub fn set_weight(&mut self, i: usize, weight: Weight<N>) -> Result<()> {
        self.check_index(i)?;
        self.weights_mean[i] = weight.w_mean;
        self.weights_cov[i] = weight.w_cov;
        Ok(())
    }

    pub fn point(&self, i: usize) -> Result<VectorN<N, D>> {
        self.check_index(i)?;
        Ok(self.points.column(i).into_owned())
    }

    pub fn weight(&self, i: usize) -> Result<Weight<N>> {
        self.check_index(i)?;
        Ok(Weight::new(self.weights_mean[i], self.weights_cov[i]))
    }

    pub fn weighted_point(&self, i: usize) -> Result<WeightedPoint<N, D>> {
        Ok(WeightedPoint {
            point: self.point(i)?,
            weight: self.weight(i)?,
        })
    }

    /// All points as the columns of a matrix.
    pub fn points(&self) -> &MatrixMN<N, D, C> {
        &self.points
    }

    pub fn mean_weights_vector(&self) -> &VectorN<N, C> {
        &self.weights_mean
    }

    pub fn covariance_weights_vector(&self) -> &VectorN<N, C> {
        &self.weights_cov
    }

    /// Weighted mean of the points, Sum w_mean[i] * point[i]
    pub fn mean(&self) -> VectorN<N, D> {
        &self.points * &self.weights_mean
    }

    /// Points with the weighted mean subtracted, [point[0]-mean ... point[n]-mean]
    pub fn centered_points(&self) -> MatrixMN<N, D, C> {
        let mean = self.mean();
        let mut centered = self.points.clone();
        for j in 0..centered.ncols() {
            let mut column = centered.column_mut(j);
            column -= &mean;
        }
        centered
    }

    /// Weighted covariance of the points, X.diag(w_cov).X' with X the centered points.
    pub fn covariance(&self) -> MatrixN<N, D>
    where
        DefaultAllocator: Allocator<N, D, D>,
    {
        let d = self.points.data.shape().0;
        let mut covariance = MatrixN::zeros_generic(d, d);
        matrix::quadform_tr(&mut covariance, N::one(), &self.centered_points(), &self.weights_cov, N::zero());
        covariance
    }

    /// Weighted cross covariance with the points of another set, X.diag(w_cov).Y'.
    ///
    /// The covariance weights of this set are used, the sets must have the same point count.
    pub fn cross_covariance<ZD: Dim>(&self, other: &PointSet<N, ZD, C>) -> Result<MatrixMN<N, D, ZD>>
    where
        DefaultAllocator: Allocator<N, ZD, C> + Allocator<N, ZD> + Allocator<N, D, ZD>,
    {
        if other.count() != self.count() {
            return Err(FilterError::SizeMismatch {
                expected: self.count(),
                actual: other.count(),
            });
        }
        let mut cross = MatrixMN::zeros_generic(self.points.data.shape().0, other.points.data.shape().0);
        matrix::cross_quadform_tr(
            &mut cross,
            N::one(),
            &self.centered_points(),
            &self.weights_cov,
            &other.centered_points(),
            N::zero(),
        );
        Ok(cross)
    }
}

/// The point count dimension for `count` points.
pub fn count_dim<C: Dim>(count: usize) -> Result<C> {
    match C::try_to_usize() {
        Some(fixed) if fixed != count => Err(FilterError::SizeMismatch {
            expected: fixed,
            actual: count,
        }),
        _ => Ok(C::from_usize(count)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use na::{DVector, Vector2, U2, U3};

    #[test]
    fn fixed_set_cannot_resize() {
        let mut set = PointSet::<f64, U2, U3>::new(U2, U3);
        assert!(PointSet::<f64, U2, U3>::is_fixed());
        assert!(set.resize(3).is_ok());
        assert_eq!(set.resize(5), Err(FilterError::ResizeFixed { fixed: 3, requested: 5 }));
        assert_eq!(set.count(), 3);
    }

    #[test]
    fn dynamic_set_resizes() {
        let mut set = PointSet::<f64, U2>::new(U2, Dynamic::new(1));
        assert!(!PointSet::<f64, U2>::is_fixed());
        set.resize(5).unwrap();
        assert_eq!(set.count(), 5);
        assert_eq!(set.dimension(), 2);
    }

    #[test]
    fn out_of_bounds_write_is_rejected_before_mutation() {
        let mut set = PointSet::<f64, U2, U3>::new(U2, U3);
        let before = set.clone();
        assert_eq!(
            set.set_point(3, &Vector2::new(1., 1.), Weight::new(1., 1.)),
            Err(FilterError::OutOfBounds { index: 3, size: Some(3) })
        );
        assert!(set == before);
    }

    #[test]
    fn wrong_point_dimension_is_rejected() {
        let mut set = PointSet::<f64, Dynamic>::new(Dynamic::new(2), Dynamic::new(3));
        assert_eq!(
            set.set_point(0, &DVector::zeros(3), Weight::new(1., 1.)),
            Err(FilterError::DimensionMismatch { expected: 2, actual: 3 })
        );
    }

    #[test]
    fn mean_and_centered_points() {
        let mut set = PointSet::<f64, U2, U3>::new(U2, U3);
        set.set_point(0, &Vector2::new(1., 2.), Weight::new(0.5, 0.5)).unwrap();
        set.set_point(1, &Vector2::new(3., 2.), Weight::new(0.25, 0.25)).unwrap();
        set.set_point(2, &Vector2::new(-1., 6.), Weight::new(0.25, 0.25)).unwrap();

        let mean = set.mean();
        approx::assert_relative_eq!(mean, Vector2::new(1., 3.));

        let centered = set.centered_points();
        approx::assert_relative_eq!(centered.column(1).into_owned(), Vector2::new(2., -1.));
        approx::assert_relative_eq!(centered * set.mean_weights_vector(), Vector2::zeros());
    }

    #[test]
    fn count_dim_checks_fixed_count() {
        assert_eq!(count_dim::<U3>(3), Ok(U3));
        assert_eq!(count_dim::<U3>(5), Err(FilterError::SizeMismatch { expected: 3, actual: 5 }));
        assert_eq!(count_dim::<Dynamic>(5).map(|c| c.value()), Ok(5));
    }
}
