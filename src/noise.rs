#![allow(non_snake_case)]

//! Noise models.
//!
//! The filter always draws its noise sigma points from a standard normal (zero mean, unit covariance).
//! Models use these structs to map the standard normal noise onto their own noise covariance.

use na::storage::Storage;
use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixMN, MatrixN, RealField, VectorN, U1};
use nalgebra as na;

use crate::error::{FilterError, Result};
use crate::linalg::cholesky;
use crate::matrix;

/// Uncorrelated noise.
///
/// Noise represented as the noise variance vector.
#[derive(PartialEq, Clone)]
pub struct UncorrelatedNoise<N: RealField, QD: Dim>
where
    DefaultAllocator: Allocator<N, QD>,
{
    /// Noise variance
    pub q: VectorN<N, QD>,
}

/// Correlated noise.
///
/// Noise represented as the noise covariance matrix.
#[derive(PartialEq, Clone)]
pub struct CorrelatedNoise<N: RealField, D: Dim>
where
    DefaultAllocator: Allocator<N, D, D>,
{
    /// Noise covariance
    pub Q: MatrixN<N, D>,
}

/// Coupled noise.
///
/// Noise represented as the noise variance vector and a noise coupling matrix.
/// The noise covariance is G.q.G'.
#[derive(PartialEq, Clone)]
pub struct CoupledNoise<N: RealField, D: Dim, QD: Dim>
where
    DefaultAllocator: Allocator<N, D, QD> + Allocator<N, QD>,
{
    /// Noise variance
    pub q: VectorN<N, QD>,
    /// Noise coupling
    pub G: MatrixMN<N, D, QD>,
}

impl<N: RealField, QD: Dim> CorrelatedNoise<N, QD>
where
    DefaultAllocator: Allocator<N, QD, QD> + Allocator<N, QD>,
{
    /// Creates a CorrelatedNoise from an UncorrelatedNoise.
    pub fn from_uncorrelated(uncorrelated: &UncorrelatedNoise<N, QD>) -> Self {
        CorrelatedNoise {
            Q: MatrixN::from_diagonal(&uncorrelated.q),
        }
    }
}

impl<N: RealField, D: Dim> CorrelatedNoise<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// Creates a CorrelatedNoise from a CoupledNoise.
    pub fn from_coupled<QD: Dim>(coupled: &CoupledNoise<N, D, QD>) -> Self
    where
        DefaultAllocator: Allocator<N, D, QD> + Allocator<N, QD>,
    {
        let d = coupled.G.data.shape().0;
        let mut Q = MatrixN::zeros_generic(d, d);
        matrix::quadform_tr(&mut Q, N::one(), &coupled.G, &coupled.q, N::zero());
        CorrelatedNoise { Q }
    }
}

impl<N: RealField, D: Dim> CoupledNoise<N, D, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// Creates a CoupledNoise from a CorrelatedNoise.
    ///
    /// The CorrelatedNoise must be PSD. The coupling is its upper triangular square root and 'q' is always a vector of 1s.
    pub fn from_correlated(correlated: &CorrelatedNoise<N, D>) -> Result<Self> {
        let G = cholesky::covariance_square_root(&correlated.Q)
            .map_err(|_| FilterError::NotPsd("Q not PSD"))?;

        Ok(CoupledNoise {
            q: VectorN::repeat_generic(G.data.shape().0, U1, N::one()),
            G,
        })
    }
}

impl<N: RealField, D: Dim, QD: Dim> CoupledNoise<N, D, QD>
where
    DefaultAllocator: Allocator<N, D, QD> + Allocator<N, QD> + Allocator<N, D>,
{
    /// Dimension of the noise source.
    pub fn noise_dim(&self) -> QD {
        self.q.data.shape().0
    }

    /// Maps a standard normal noise vector onto this noise, G.sqrt(q).v
    pub fn map_standard_normal(&self, v: &VectorN<N, QD>) -> VectorN<N, D> {
        let scaled = v.zip_map(&self.q, |vi, qi| vi * qi.sqrt());
        &self.G * scaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use na::{Matrix2, Matrix2x1, Vector1, Vector2};

    #[test]
    fn coupled_to_correlated() {
        let coupled = CoupledNoise {
            q: Vector1::new(4.),
            G: Matrix2x1::new(1., 0.5),
        };
        let correlated = CorrelatedNoise::from_coupled(&coupled);
        approx::assert_relative_eq!(correlated.Q, Matrix2::new(4., 2., 2., 1.));
    }

    #[test]
    fn correlated_round_trip_through_coupling() {
        let correlated = CorrelatedNoise {
            Q: Matrix2::new(2., 0.3, 0.3, 0.5),
        };
        let coupled = CoupledNoise::from_correlated(&correlated).unwrap();
        approx::assert_relative_eq!(coupled.q, Vector2::new(1., 1.));
        approx::assert_relative_eq!(CorrelatedNoise::from_coupled(&coupled).Q, correlated.Q, epsilon = 1e-12);
    }

    #[test]
    fn uncorrelated_is_diagonal() {
        let correlated = CorrelatedNoise::from_uncorrelated(&UncorrelatedNoise {
            q: Vector2::new(3., 5.),
        });
        assert_eq!(correlated.Q, Matrix2::new(3., 0., 0., 5.));
    }

    #[test]
    fn standard_normal_is_scaled_by_variance() {
        let coupled = CoupledNoise {
            q: Vector1::new(4.),
            G: Matrix2x1::new(1., 0.5),
        };
        approx::assert_relative_eq!(coupled.map_standard_normal(&Vector1::new(1.5)), Vector2::new(3., 1.5));
    }
}
