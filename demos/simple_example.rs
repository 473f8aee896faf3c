//! Operation of a sigma point filter in a simple example.
//!
//! An Unscented Kalman filter tracking position and velocity from range observations.

use na::{Matrix1, Matrix2, Matrix2x1, Vector1, Vector2, U2};
use nalgebra as na;

use sigma_filter::filters::gaussian_filter::GaussianFilter;
use sigma_filter::models::{AdditiveObservationModel, AdditiveProcessModel, Gaussian};
use sigma_filter::noise::CoupledNoise;
use sigma_filter::transform::UnscentedTransform;

fn main() {
    env_logger::init();

    // Constant velocity prediction with a noisy velocity
    let my_predict_model = AdditiveProcessModel::new(
        |dt: f64, x: &Vector2<f64>, _u: &Vector1<f64>| Vector2::new(x[0] + dt * x[1], x[1]),
        CoupledNoise {
            q: Vector1::new(0.01),
            G: Matrix2x1::new(0., 1.),
        },
        na::U1,
    );
    // Observe the distance from a beacon at -10
    let my_observe_model = AdditiveObservationModel::new(
        |x: &Vector2<f64>| Vector1::new((x[0] + 10.).abs()),
        CoupledNoise {
            q: Vector1::new(0.04),
            G: Matrix1::new(1.),
        },
    );

    let mut filter: GaussianFilter<f64, _, _, _> =
        GaussianFilter::new(my_predict_model, my_observe_model, UnscentedTransform::default()).unwrap();

    // Setup the initial state and covariance
    let mut estimate = Gaussian::from_moments(
        Vector2::new(0., 1.), // initialy at 0 moving at 1
        Matrix2::new(1., 0., 0., 0.5),
    )
    .unwrap();
    println!("Initial x{:.2} X{:.3}", estimate.mean(), estimate.covariance());

    let mut posterior = Gaussian::new_zero(U2);
    for step in 1..=5 {
        // We appear to be moving a little faster
        let z = Vector1::new(10. + 1.2 * step as f64);
        filter
            .predict_and_update(1., &Vector1::new(0.), &z, &estimate, &mut posterior)
            .unwrap();
        estimate = posterior.clone();
        println!(
            "Step {} innovation {:.3} x{:.2} X{:.3}",
            step,
            filter.last_innovation()[0],
            estimate.mean(),
            estimate.covariance()
        );
    }
}
