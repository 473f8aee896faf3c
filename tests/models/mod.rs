//! Stub models for testing filters with fixed and dynamic dimensions.
//!
//! Models observe or predict with standard normal noise scaled by their own noise variance.

#![allow(dead_code)]

use na::base::storage::Storage;
use na::{allocator::Allocator, DefaultAllocator, Dim, Matrix, MatrixMN, RealField, VectorN, U1};
use nalgebra as na;

use sigma_filter::models::{ObservationModel, ProcessModel};

/// Process model that leaves the state unchanged and ignores its noise.
pub struct IdentityProcess<D: Dim> {
    pub dim: D,
}

impl<D: Dim> ProcessModel<f64> for IdentityProcess<D>
where
    DefaultAllocator: Allocator<f64, D>,
{
    type State = D;
    type Noise = U1;
    type Input = U1;

    fn state_dimension(&self) -> D {
        self.dim
    }

    fn noise_dimension(&self) -> U1 {
        U1
    }

    fn input_dimension(&self) -> U1 {
        U1
    }

    fn predict_state(&self, _delta_time: f64, state: &VectorN<f64, D>, _noise: &VectorN<f64, U1>, _input: &VectorN<f64, U1>) -> VectorN<f64, D> {
        state.clone()
    }
}

/// Observes the first state element with non-additive multiplicative noise: x[0] * (1 + sigma v).
pub struct ScaledObservation<D: Dim> {
    pub dim: D,
    pub sigma: f64,
}

impl<D: Dim> ObservationModel<f64, D> for ScaledObservation<D>
where
    DefaultAllocator: Allocator<f64, D>,
{
    type Observation = U1;
    type Noise = U1;

    fn observation_dimension(&self) -> U1 {
        U1
    }

    fn noise_dimension(&self) -> U1 {
        U1
    }

    fn predict_observation(&self, state: &VectorN<f64, D>, noise: &VectorN<f64, U1>, _delta_time: f64) -> VectorN<f64, U1> {
        VectorN::<f64, U1>::new(state[0] * (1. + self.sigma * noise[0]))
    }
}

/// Create a Dynamic or Static copy.
pub fn new_copy<N: RealField, R: Dim, C: Dim, R1: Dim, C1: Dim, S1: Storage<N, R1, C1>>(
    r: R,
    c: C,
    m: Matrix<N, R1, C1, S1>,
) -> MatrixMN<N, R, C>
where
    DefaultAllocator: Allocator<N, R, C>,
{
    MatrixMN::<N, R, C>::from_iterator_generic(r, c, m.iter().cloned())
}
