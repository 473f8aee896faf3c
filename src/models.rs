//! Gaussian state representation and system models.
//!
//! The state is represented by a [`Gaussian`] belief.
//! Process and observation models are defined as traits. Both map a state and a standard normal noise vector,
//! so noise need not be additive; a model applies its own noise covariance to the noise it is given.
//!
//! [`AdditiveProcessModel`] and [`AdditiveObservationModel`] adapt plain functions with additive noise.

use std::marker::PhantomData;

use na::storage::Storage;
use na::{allocator::Allocator, DefaultAllocator, Dim, MatrixN, RealField, VectorN, U1};
use nalgebra as na;
use rand_core::RngCore;
use rand_distr::{Distribution, StandardNormal};

use crate::error::{FilterError, Result};
use crate::linalg::cholesky;
use crate::noise::CoupledNoise;

/// Gaussian belief.
///
/// Mean vector and covariance (symmetric positive semi-definite) matrix.
/// A square root S of the covariance with S.S' = covariance is kept with the covariance and
/// refactorised whenever the covariance is set.
/// Only the upper triangle of a covariance that is set is used, the lower triangle is mirrored from it.
#[derive(PartialEq, Clone)]
pub struct Gaussian<N: RealField, D: Dim>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    mean: VectorN<N, D>,
    covariance: MatrixN<N, D>,
    square_root: MatrixN<N, D>,
}

impl<N: RealField, D: Dim> Gaussian<N, D>
where
    DefaultAllocator: Allocator<N, D, D> + Allocator<N, D>,
{
    /// Standard normal: zero mean and identity covariance.
    pub fn new_standard(d: D) -> Self {
        Gaussian {
            mean: VectorN::zeros_generic(d, U1),
            covariance: MatrixN::identity_generic(d, d),
            square_root: MatrixN::identity_generic(d, d),
        }
    }

    /// Zero mean and zero covariance.
    pub fn new_zero(d: D) -> Self {
        Gaussian {
            mean: VectorN::zeros_generic(d, U1),
            covariance: MatrixN::zeros_generic(d, d),
            square_root: MatrixN::zeros_generic(d, d),
        }
    }

    /// Gaussian from its first two moments.
    ///
    /// The covariance must be PSD.
    pub fn from_moments(mean: VectorN<N, D>, mut covariance: MatrixN<N, D>) -> Result<Self> {
        if covariance.nrows() != mean.nrows() {
            return Err(FilterError::DimensionMismatch {
                expected: mean.nrows(),
                actual: covariance.nrows(),
            });
        }
        let square_root = cholesky::covariance_square_root(&covariance)?;
        covariance.fill_lower_triangle_with_upper_triangle();
        Ok(Gaussian {
            mean,
            covariance,
            square_root,
        })
    }

    pub fn dim(&self) -> D {
        self.mean.data.shape().0
    }

    pub fn dimension(&self) -> usize {
        self.mean.nrows()
    }

    pub fn mean(&self) -> &VectorN<N, D> {
        &self.mean
    }

    pub fn covariance(&self) -> &MatrixN<N, D> {
        &self.covariance
    }

    /// Upper triangular covariance square root.
    pub fn square_root(&self) -> &MatrixN<N, D> {
        &self.square_root
    }

    pub fn set_mean(&mut self, mean: VectorN<N, D>) -> Result<()> {
        if mean.nrows() != self.dimension() {
            return Err(FilterError::DimensionMismatch {
                expected: self.dimension(),
                actual: mean.nrows(),
            });
        }
        self.mean = mean;
        Ok(())
    }

    /// Sets and refactorises the covariance.
    ///
    /// On error the Gaussian is unchanged.
    pub fn set_covariance(&mut self, covariance: MatrixN<N, D>) -> Result<()> {
        let tolerance = N::default_epsilon() * cholesky::max_abs_diagonal(&covariance);
        self.set_covariance_tol(covariance, tolerance)
    }

    /// Sets both moments, the covariance is validated before anything is changed.
    pub fn set_moments(&mut self, mean: VectorN<N, D>, covariance: MatrixN<N, D>) -> Result<()> {
        let tolerance = N::default_epsilon() * cholesky::max_abs_diagonal(&covariance);
        self.set_moments_tol(mean, covariance, tolerance)
    }

    /// Sets both moments, covariance pivots with |d| <= tolerance are factorised as zero.
    ///
    /// The tolerance absorbs the round-off of a covariance computed as a difference, e.g. X - K.S.K'.
    pub fn set_moments_tol(&mut self, mean: VectorN<N, D>, covariance: MatrixN<N, D>, tolerance: N) -> Result<()> {
        if mean.nrows() != self.dimension() {
            return Err(FilterError::DimensionMismatch {
                expected: self.dimension(),
                actual: mean.nrows(),
            });
        }
        self.set_covariance_tol(covariance, tolerance)?;
        self.mean = mean;
        Ok(())
    }

    fn set_covariance_tol(&mut self, mut covariance: MatrixN<N, D>, tolerance: N) -> Result<()> {
        if covariance.nrows() != self.dimension() {
            return Err(FilterError::DimensionMismatch {
                expected: self.dimension(),
                actual: covariance.nrows(),
            });
        }
        self.square_root = cholesky::covariance_square_root_tol(&covariance, tolerance)?;
        covariance.fill_lower_triangle_with_upper_triangle();
        self.covariance = covariance;
        Ok(())
    }

    /// Reciprocal condition number of the covariance, 0 if singular.
    pub fn rcond(&self) -> N {
        cholesky::UCrcond(&self.square_root)
    }

    /// Draws a sample: mean + S.z with z standard normal.
    pub fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> VectorN<N, D>
    where
        StandardNormal: Distribution<N>,
    {
        let z = VectorN::<N, D>::from_fn_generic(self.dim(), U1, |_, _| StandardNormal.sample(rng));
        &self.mean + &self.square_root * z
    }
}

/// A process model.
///
/// Predicts the state after `delta_time` given the state, a standard normal noise vector and an input.
pub trait ProcessModel<N: RealField>
where
    DefaultAllocator: Allocator<N, Self::State> + Allocator<N, Self::Noise> + Allocator<N, Self::Input>,
{
    type State: Dim;
    type Noise: Dim;
    type Input: Dim;

    fn state_dimension(&self) -> Self::State;
    fn noise_dimension(&self) -> Self::Noise;
    fn input_dimension(&self) -> Self::Input;

    fn predict_state(
        &self,
        delta_time: N,
        state: &VectorN<N, Self::State>,
        noise: &VectorN<N, Self::Noise>,
        input: &VectorN<N, Self::Input>,
    ) -> VectorN<N, Self::State>;
}

/// An observation model.
///
/// Predicts the observation of a state given a standard normal noise vector.
pub trait ObservationModel<N: RealField, D: Dim>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, Self::Observation> + Allocator<N, Self::Noise>,
{
    type Observation: Dim;
    type Noise: Dim;

    fn observation_dimension(&self) -> Self::Observation;
    fn noise_dimension(&self) -> Self::Noise;

    fn predict_observation(
        &self,
        state: &VectorN<N, D>,
        noise: &VectorN<N, Self::Noise>,
        delta_time: N,
    ) -> VectorN<N, Self::Observation>;
}

/// Process model from a prediction function with additive noise.
///
/// x' = f(dt, x, u) + G.sqrt(q).v
pub struct AdditiveProcessModel<N, D, QD, UD, F>
where
    N: RealField,
    D: Dim,
    QD: Dim,
    UD: Dim,
    DefaultAllocator: Allocator<N, D, QD> + Allocator<N, QD>,
{
    f: F,
    noise: CoupledNoise<N, D, QD>,
    input_dim: UD,
}

impl<N, D, QD, UD, F> AdditiveProcessModel<N, D, QD, UD, F>
where
    N: RealField,
    D: Dim,
    QD: Dim,
    UD: Dim,
    F: Fn(N, &VectorN<N, D>, &VectorN<N, UD>) -> VectorN<N, D>,
    DefaultAllocator: Allocator<N, D, QD> + Allocator<N, QD> + Allocator<N, D> + Allocator<N, UD>,
{
    pub fn new(f: F, noise: CoupledNoise<N, D, QD>, input_dim: UD) -> Self {
        AdditiveProcessModel { f, noise, input_dim }
    }

    pub fn noise(&self) -> &CoupledNoise<N, D, QD> {
        &self.noise
    }
}

impl<N, D, QD, UD, F> ProcessModel<N> for AdditiveProcessModel<N, D, QD, UD, F>
where
    N: RealField,
    D: Dim,
    QD: Dim,
    UD: Dim,
    F: Fn(N, &VectorN<N, D>, &VectorN<N, UD>) -> VectorN<N, D>,
    DefaultAllocator: Allocator<N, D, QD> + Allocator<N, QD> + Allocator<N, D> + Allocator<N, UD>,
{
    type State = D;
    type Noise = QD;
    type Input = UD;

    fn state_dimension(&self) -> D {
        self.noise.G.data.shape().0
    }

    fn noise_dimension(&self) -> QD {
        self.noise.noise_dim()
    }

    fn input_dimension(&self) -> UD {
        self.input_dim
    }

    fn predict_state(&self, delta_time: N, state: &VectorN<N, D>, noise: &VectorN<N, QD>, input: &VectorN<N, UD>) -> VectorN<N, D> {
        (self.f)(delta_time, state, input) + self.noise.map_standard_normal(noise)
    }
}

/// Observation model from an observation function with additive noise.
///
/// z = h(x) + G.sqrt(q).v
pub struct AdditiveObservationModel<N, D, ZD, RD, H>
where
    N: RealField,
    D: Dim,
    ZD: Dim,
    RD: Dim,
    DefaultAllocator: Allocator<N, ZD, RD> + Allocator<N, RD>,
{
    h: H,
    noise: CoupledNoise<N, ZD, RD>,
    _state: PhantomData<D>,
}

impl<N, D, ZD, RD, H> AdditiveObservationModel<N, D, ZD, RD, H>
where
    N: RealField,
    D: Dim,
    ZD: Dim,
    RD: Dim,
    H: Fn(&VectorN<N, D>) -> VectorN<N, ZD>,
    DefaultAllocator: Allocator<N, ZD, RD> + Allocator<N, RD> + Allocator<N, D> + Allocator<N, ZD>,
{
    pub fn new(h: H, noise: CoupledNoise<N, ZD, RD>) -> Self {
        AdditiveObservationModel {
            h,
            noise,
            _state: PhantomData,
        }
    }

    pub fn noise(&self) -> &CoupledNoise<N, ZD, RD> {
        &self.noise
    }
}

impl<N, D, ZD, RD, H> ObservationModel<N, D> for AdditiveObservationModel<N, D, ZD, RD, H>
where
    N: RealField,
    D: Dim,
    ZD: Dim,
    RD: Dim,
    H: Fn(&VectorN<N, D>) -> VectorN<N, ZD>,
    DefaultAllocator: Allocator<N, ZD, RD> + Allocator<N, RD> + Allocator<N, D> + Allocator<N, ZD>,
{
    type Observation = ZD;
    type Noise = RD;

    fn observation_dimension(&self) -> ZD {
        self.noise.G.data.shape().0
    }

    fn noise_dimension(&self) -> RD {
        self.noise.noise_dim()
    }

    fn predict_observation(&self, state: &VectorN<N, D>, noise: &VectorN<N, RD>, _delta_time: N) -> VectorN<N, ZD> {
        (self.h)(state) + self.noise.map_standard_normal(noise)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use na::{Dynamic, Matrix2, Vector2, U2};

    #[test]
    fn standard_gaussian_has_identity_root() {
        let g = Gaussian::<f64, _>::new_standard(U2);
        assert_eq!(g.dimension(), 2);
        assert_eq!(*g.square_root(), Matrix2::identity());
        assert_eq!(g.rcond(), 1.);
    }

    #[test]
    fn set_covariance_refactorises() {
        let mut g = Gaussian::<f64, _>::new_zero(Dynamic::new(2));
        g.set_covariance(na::DMatrix::from_row_slice(2, 2, &[4., 1., 1., 2.])).unwrap();
        let s = g.square_root();
        approx::assert_relative_eq!(s * s.transpose(), g.covariance().clone(), epsilon = 1e-12);
    }

    #[test]
    fn rejected_covariance_leaves_gaussian_unchanged() {
        let mut g = Gaussian::from_moments(Vector2::new(1., 2.), Matrix2::new(2., 0., 0., 1.)).unwrap();
        let before = g.clone();
        assert!(g.set_moments(Vector2::new(5., 5.), Matrix2::new(1., 2., 2., 1.)).is_err());
        assert!(g == before);
    }

    #[test]
    fn lower_triangle_is_mirrored_from_upper() {
        let mut g = Gaussian::<f64, _>::new_zero(U2);
        g.set_covariance(Matrix2::new(4., 1., 7., 2.)).unwrap();
        assert_eq!(*g.covariance(), Matrix2::new(4., 1., 1., 2.));
        let s = g.square_root();
        approx::assert_relative_eq!(s * s.transpose(), *g.covariance(), epsilon = 1e-12);

        let g = Gaussian::from_moments(Vector2::new(0., 0.), Matrix2::new(2., 0.5, -3., 1.)).unwrap();
        assert_eq!(g.covariance()[(1, 0)], 0.5);
    }

    #[test]
    fn mismatched_dynamic_mean_is_rejected() {
        let mut g = Gaussian::<f64, _>::new_standard(Dynamic::new(2));
        assert_eq!(
            g.set_mean(na::DVector::zeros(3)),
            Err(FilterError::DimensionMismatch { expected: 2, actual: 3 })
        );
    }
}
