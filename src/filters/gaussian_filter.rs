//! Sigma point Gaussian filter.
//!
//! A discrete Bayesian filter that represents the state by a [`Gaussian`] and propagates it through
//! non-linear process and observation models with a [`PointSetTransform`], e.g. the Unscented Kalman Filter.
//!
//! Process and observation noise need not be additive. The filter transforms the augmented Gaussian of
//! state, process noise and observation noise:
//!
//! ```text
//!     [ P  0  0 ]  ->  X_r   state points
//!     [ 0  Q  0 ]  ->  X_Q   process noise points
//!     [ 0  0  R ]  ->  X_R   observation noise points
//! ```
//!
//! Q and R are standard normals, models scale the noise themselves, so X_Q and X_R are computed once at construction.
//! Point i of X_r, X_Q and X_R together are point i of the augmented Gaussian.

use log::{debug, trace};
use na::storage::Storage;
use na::{allocator::Allocator, DefaultAllocator, Dim, Dynamic, MatrixMN, MatrixN, RealField, VectorN, U1};
use nalgebra as na;

use crate::error::{FilterError, Result};
use crate::linalg::cholesky;
use crate::matrix;
use crate::models::{Gaussian, ObservationModel, ProcessModel};
use crate::point_set::PointSet;
use crate::transform::PointSetTransform;

/// Inflation of the innovation variance for outlying observations.
///
/// For every observation element with |innovation| > threshold the innovation variance cov_yy[k,k]
/// is increased by inv_sigma. This reduces the gain for that element; it is a heuristic, values are
/// application specific.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutlierGuard<N> {
    pub threshold: N,
    pub inv_sigma: N,
}

/// Scratch point sets and the diagnostics of the last update.
///
/// Exclusively owned by one filter, every predict and update overwrites it in place.
#[derive(Clone)]
struct Workspace<N: RealField, D: Dim, ZD: Dim, C: Dim>
where
    DefaultAllocator: Allocator<N, D, C> + Allocator<N, ZD, C> + Allocator<N, C> + Allocator<N, ZD> + Allocator<N, ZD, ZD>,
{
    /// X_r
    state_points: PointSet<N, D, C>,
    /// X_y
    observation_points: PointSet<N, ZD, C>,
    prediction: VectorN<N, ZD>,
    innovation: VectorN<N, ZD>,
    innovation_covariance: MatrixN<N, ZD>,
}

/// Gaussian filter with a point set transform.
///
/// The filter owns its models, transform and a scratch workspace, so one filter instance must not be used for
/// two filtering operations at once. Independent filters share nothing.
pub struct GaussianFilter<N, P, O, T, C = Dynamic>
where
    N: RealField,
    P: ProcessModel<N>,
    O: ObservationModel<N, P::State>,
    T: PointSetTransform<N>,
    C: Dim,
    DefaultAllocator: Allocator<N, P::State>
        + Allocator<N, P::State, P::State>
        + Allocator<N, P::Noise>
        + Allocator<N, P::Input>
        + Allocator<N, O::Observation>
        + Allocator<N, O::Observation, O::Observation>
        + Allocator<N, O::Noise>
        + Allocator<N, P::State, O::Observation>
        + Allocator<N, P::State, C>
        + Allocator<N, P::Noise, C>
        + Allocator<N, O::Observation, C>
        + Allocator<N, O::Noise, C>
        + Allocator<N, C>,
{
    process_model: P,
    observation_model: O,
    point_set_transform: T,
    /// dim(P) + dim(Q) + dim(R)
    global_dimension: usize,
    outlier_guard: Option<OutlierGuard<N>>,
    /// X_Q
    process_noise_points: PointSet<N, P::Noise, C>,
    /// X_R
    observation_noise_points: PointSet<N, O::Noise, C>,
    workspace: Workspace<N, P::State, O::Observation, C>,
}

impl<N, P, O, T, C> GaussianFilter<N, P, O, T, C>
where
    N: RealField,
    P: ProcessModel<N>,
    O: ObservationModel<N, P::State>,
    T: PointSetTransform<N>,
    C: Dim,
    DefaultAllocator: Allocator<N, P::State>
        + Allocator<N, P::State, P::State>
        + Allocator<N, P::Noise>
        + Allocator<N, P::Noise, P::Noise>
        + Allocator<N, P::Input>
        + Allocator<N, O::Observation>
        + Allocator<N, O::Observation, O::Observation>
        + Allocator<N, O::Noise>
        + Allocator<N, O::Noise, O::Noise>
        + Allocator<N, P::State, O::Observation>
        + Allocator<N, P::State, C>
        + Allocator<N, P::Noise, C>
        + Allocator<N, O::Observation, C>
        + Allocator<N, O::Noise, C>
        + Allocator<N, C>,
{
    /// Creates a filter and pre-computes the noise points.
    ///
    /// A fixed point count C must equal the number of points the transform requires for the augmented Gaussian.
    pub fn new(process_model: P, observation_model: O, point_set_transform: T) -> Result<Self> {
        let state_dim = process_model.state_dimension();
        let process_noise_dim = process_model.noise_dimension();
        let observation_noise_dim = observation_model.noise_dimension();
        let observation_dim = observation_model.observation_dimension();

        let global_dimension = state_dim.value() + process_noise_dim.value() + observation_noise_dim.value();
        let point_count = T::number_of_points(global_dimension);

        // X_Q from the marginal Q at offset dim(P)
        let mut process_noise_points = PointSet::with_count(process_noise_dim, point_count)?;
        point_set_transform.forward_augmented(
            &Gaussian::new_standard(process_noise_dim),
            global_dimension,
            state_dim.value(),
            &mut process_noise_points,
        )?;

        // X_R from the marginal R at offset dim(P) + dim(Q)
        let mut observation_noise_points = PointSet::with_count(observation_noise_dim, point_count)?;
        point_set_transform.forward_augmented(
            &Gaussian::new_standard(observation_noise_dim),
            global_dimension,
            state_dim.value() + process_noise_dim.value(),
            &mut observation_noise_points,
        )?;

        let workspace = Workspace {
            state_points: PointSet::with_count(state_dim, point_count)?,
            observation_points: PointSet::with_count(observation_dim, point_count)?,
            prediction: VectorN::zeros_generic(observation_dim, U1),
            innovation: VectorN::zeros_generic(observation_dim, U1),
            innovation_covariance: MatrixN::zeros_generic(observation_dim, observation_dim),
        };

        debug!(
            "gaussian filter: state {} process noise {} observation noise {} observation {}, {} points",
            state_dim.value(),
            process_noise_dim.value(),
            observation_noise_dim.value(),
            observation_dim.value(),
            point_count
        );

        Ok(GaussianFilter {
            process_model,
            observation_model,
            point_set_transform,
            global_dimension,
            outlier_guard: None,
            process_noise_points,
            observation_noise_points,
            workspace,
        })
    }

    pub fn with_outlier_guard(mut self, guard: OutlierGuard<N>) -> Self {
        self.outlier_guard = Some(guard);
        self
    }

    pub fn set_outlier_guard(&mut self, guard: Option<OutlierGuard<N>>) {
        self.outlier_guard = guard;
    }

    pub fn outlier_guard(&self) -> Option<&OutlierGuard<N>> {
        self.outlier_guard.as_ref()
    }

    pub fn process_model(&self) -> &P {
        &self.process_model
    }

    pub fn observation_model(&self) -> &O {
        &self.observation_model
    }

    pub fn point_set_transform(&self) -> &T {
        &self.point_set_transform
    }

    /// Dimension of the augmented Gaussian, dim(P) + dim(Q) + dim(R).
    pub fn global_dimension(&self) -> usize {
        self.global_dimension
    }

    /// Number of points of every point set of the filter.
    pub fn point_count(&self) -> usize {
        self.workspace.state_points.count()
    }

    /// Predicted observation of the last update.
    pub fn last_prediction(&self) -> &VectorN<N, O::Observation> {
        &self.workspace.prediction
    }

    /// Innovation of the last update, observation - prediction.
    pub fn last_innovation(&self) -> &VectorN<N, O::Observation> {
        &self.workspace.innovation
    }

    /// Innovation covariance cov_yy of the last update, including any outlier inflation.
    pub fn last_innovation_covariance(&self) -> &MatrixN<N, O::Observation> {
        &self.workspace.innovation_covariance
    }

    /// State prediction.
    ///
    /// predicted = mean and covariance of f(X_r[i], X_Q[i], input) for the points X_r of the prior.
    pub fn predict(
        &mut self,
        delta_time: N,
        input: &VectorN<N, P::Input>,
        prior: &Gaussian<N, P::State>,
        predicted: &mut Gaussian<N, P::State>,
    ) -> Result<()> {
        let (mean, covariance) = self.predict_moments(delta_time, input, prior)?;
        predicted.set_moments(mean, covariance)
    }

    /// Observation update.
    ///
    /// posterior = predicted corrected by the innovation of observation y with the Kalman gain.
    pub fn update(
        &mut self,
        y: &VectorN<N, O::Observation>,
        predicted: &Gaussian<N, P::State>,
        posterior: &mut Gaussian<N, P::State>,
    ) -> Result<()> {
        let (mean, covariance, tolerance) = self.update_moments(y, predicted)?;
        posterior.set_moments_tol(mean, covariance, tolerance)
    }

    /// Prediction followed by an update.
    ///
    /// On error the posterior is unchanged.
    pub fn predict_and_update(
        &mut self,
        delta_time: N,
        input: &VectorN<N, P::Input>,
        y: &VectorN<N, O::Observation>,
        prior: &Gaussian<N, P::State>,
        posterior: &mut Gaussian<N, P::State>,
    ) -> Result<()> {
        let (mean, covariance) = self.predict_moments(delta_time, input, prior)?;
        let predicted = Gaussian::from_moments(mean, covariance)?;
        let (mean, covariance, tolerance) = self.update_moments(y, &predicted)?;
        posterior.set_moments_tol(mean, covariance, tolerance)
    }

    fn predict_moments(
        &mut self,
        delta_time: N,
        input: &VectorN<N, P::Input>,
        prior: &Gaussian<N, P::State>,
    ) -> Result<(VectorN<N, P::State>, MatrixN<N, P::State>)> {
        let ws = &mut self.workspace;
        self.point_set_transform
            .forward_augmented(prior, self.global_dimension, 0, &mut ws.state_points)?;

        // X_r[i] = f(X_r[i], X_Q[i], u)
        let point_count = ws.state_points.count();
        for i in 0..point_count {
            let x_i = self.process_model.predict_state(
                delta_time,
                &ws.state_points.point(i)?,
                &self.process_noise_points.point(i)?,
                input,
            );
            ws.state_points.set_point_only(i, &x_i)?;
        }
        trace!("predict: {} points of global dimension {}", point_count, self.global_dimension);

        // C = Sum W[i] (X_r[i] - mu)(X_r[i] - mu)'
        let d = prior.dim();
        let mut covariance = MatrixN::zeros_generic(d, d);
        matrix::quadform_tr(
            &mut covariance,
            N::one(),
            &ws.state_points.centered_points(),
            ws.state_points.covariance_weights_vector(),
            N::zero(),
        );

        Ok((ws.state_points.mean(), covariance))
    }

    /// Posterior mean and covariance, with the round-off tolerance of the covariance.
    fn update_moments(
        &mut self,
        y: &VectorN<N, O::Observation>,
        predicted: &Gaussian<N, P::State>,
    ) -> Result<(VectorN<N, P::State>, MatrixN<N, P::State>, N)> {
        let ws = &mut self.workspace;
        if y.nrows() != ws.observation_points.dimension() {
            return Err(FilterError::DimensionMismatch {
                expected: ws.observation_points.dimension(),
                actual: y.nrows(),
            });
        }

        self.point_set_transform
            .forward_augmented(predicted, self.global_dimension, 0, &mut ws.state_points)?;

        // X_y[i] = h(X_r[i], X_R[i])
        let point_count = ws.state_points.count();
        for i in 0..point_count {
            let y_i = self.observation_model.predict_observation(
                &ws.state_points.point(i)?,
                &self.observation_noise_points.point(i)?,
                N::zero(),
            );
            ws.observation_points
                .set_point(i, &y_i, ws.state_points.weight(i)?)?;
        }

        let weights = ws.state_points.covariance_weights_vector();
        let centered_x = ws.state_points.centered_points();
        let centered_y = ws.observation_points.centered_points();

        let prediction = ws.observation_points.mean();
        let innovation = y - &prediction;

        let x_dim = centered_x.data.shape().0;
        let y_dim = centered_y.data.shape().0;
        let mut cov_xx = MatrixN::zeros_generic(x_dim, x_dim);
        matrix::quadform_tr(&mut cov_xx, N::one(), &centered_x, weights, N::zero());
        let mut cov_yy = MatrixN::zeros_generic(y_dim, y_dim);
        matrix::quadform_tr(&mut cov_yy, N::one(), &centered_y, weights, N::zero());
        let mut cov_xy = MatrixMN::zeros_generic(x_dim, y_dim);
        matrix::cross_quadform_tr(&mut cov_xy, N::one(), &centered_x, weights, &centered_y, N::zero());

        if let Some(guard) = &self.outlier_guard {
            for k in 0..innovation.nrows() {
                if innovation[k].abs() > guard.threshold {
                    cov_yy[(k, k)] += guard.inv_sigma;
                    debug!("outlier guard: innovation {} = {:?} inflated by {:?}", k, innovation[k], guard.inv_sigma);
                }
            }
        }

        // Kalman gain, cov_xy.inv(cov_yy)
        let (cov_yy_inv, rcond_yy) = inverse_innovation_covariance(&cov_yy)?;
        let gain = &cov_xy * cov_yy_inv;

        let mean = ws.state_points.mean() + &gain * &innovation;
        // Round-off of cov_xx - K.cov_yy.K' scales with cov_xx and the condition of cov_yy
        let point_scale: N = na::convert(point_count as f64);
        let tolerance = N::default_epsilon() * point_scale * cholesky::max_abs_diagonal(&cov_xx) / rcond_yy;
        // cov_xx - K.cov_yy.K'
        let mut covariance = cov_xx;
        covariance.quadform_tr(-N::one(), &gain, &cov_yy, N::one());

        trace!("update: {} points of global dimension {}", point_count, self.global_dimension);

        ws.prediction = prediction;
        ws.innovation = innovation;
        ws.innovation_covariance = cov_yy;

        Ok((mean, covariance, tolerance))
    }
}

/// Inverse of a symmetric positive definite innovation covariance and its reciprocal condition number.
///
/// Fails if the covariance is not PD or its reciprocal condition number is not above machine epsilon.
fn inverse_innovation_covariance<N: RealField, ZD: Dim>(cov_yy: &MatrixN<N, ZD>) -> Result<(MatrixN<N, ZD>, N)>
where
    DefaultAllocator: Allocator<N, ZD, ZD>,
{
    let factor = cov_yy
        .clone()
        .cholesky()
        .ok_or(FilterError::Singular("innovation covariance not PD"))?;
    let rcond = cholesky::UCrcond(&factor.l());
    if rcond > N::default_epsilon() {
        Ok((factor.inverse(), rcond))
    } else {
        Err(FilterError::Singular("innovation covariance ill-conditioned"))
    }
}
