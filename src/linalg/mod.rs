//! Linear algebra support for covariance square roots and condition estimates.

pub mod cholesky;
pub mod rcond;
