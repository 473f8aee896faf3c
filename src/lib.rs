//!
//! Sigma point Gaussian filtering.
//!
//! A Gaussian filter represents its belief about the hidden state of a system by a Gaussian.
//! With non-linear process and observation models the Gaussian is propagated by transforming it into a
//! deterministic set of weighted points, pushing every point through the model and recovering the mean and
//! covariance from the transformed points. No Jacobians are needed.
//!
//! The [`transform::UnscentedTransform`] generates 2D+1 sigma points. It can place a Gaussian as one block of an
//! 'augmented' Gaussian so that process and observation noise are treated as extra state dimensions,
//! which allows models with non-additive noise.
//! The [`filters::gaussian_filter::GaussianFilter`] implements the predict and update recursion.
//!
//! All vectors and matrices are nalgebra types generic in their dimensions. Fixed dimensions (U2, U5) are stack
//! allocated, `Dynamic` dimensions are allocated at run time.
//!
//! # Licensing
//!
//! Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction,
//! including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software,
//! and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
//!
//! The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
//!
//! THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//! FITNESS FOR A PARTICULAR PURPOSE AND NON INFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY,
//! WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

pub mod error;
pub mod filters;
pub mod linalg;
pub mod matrix;
pub mod models;
pub mod noise;
pub mod point_set;
pub mod transform;

pub use error::{FilterError, Result};
