//! Errors of point set construction, sigma point transforms and filtering.
//!
//! Size and bounds errors are contract violations of the caller, they abort the current operation.
//! Numerical errors report covariances that cannot be factorised or inverted.

use thiserror::Error;

/// Filter error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Incompatible number of points of the fixed-size point set: holds {expected}, transform requires {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Cannot resize a fixed-size point set of {fixed} points to {requested} points")]
    ResizeFixed { fixed: usize, requested: usize },

    #[error("{}", out_of_bounds(.index, .size))]
    OutOfBounds { index: usize, size: Option<usize> },

    #[error("Dimension mismatch: expected local dimension {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Gaussian block [{offset}, {offset} + {local}) exceeds global dimension {global}")]
    InvalidOffset { offset: usize, local: usize, global: usize },

    #[error("Covariance not PSD: {0}")]
    NotPsd(&'static str),

    #[error("Singular matrix: {0}")]
    Singular(&'static str),
}

/// Result type of fallible filter operations
pub type Result<T> = core::result::Result<T, FilterError>;

fn out_of_bounds(index: &usize, size: &Option<usize>) -> String {
    match size {
        Some(size) => format!("Index[{}] out of bounds [0, {})", index, size),
        None => format!("Index[{}] out of bounds", index),
    }
}

#[cfg(test)]
mod tests {
    use super::FilterError;

    #[test]
    fn out_of_bounds_message_with_index() {
        let e = FilterError::OutOfBounds { index: 10, size: None };
        assert!(e.to_string().contains("Index[10] out of bounds"));
    }

    #[test]
    fn out_of_bounds_message_with_range() {
        let e = FilterError::OutOfBounds { index: 10, size: Some(8) };
        assert!(e.to_string().contains("Index[10] out of bounds [0, 8)"));
    }

    #[test]
    fn size_mismatch_names_both_counts() {
        let message = FilterError::SizeMismatch { expected: 3, actual: 5 }.to_string();
        assert!(message.contains("holds 3"));
        assert!(message.contains("requires 5"));
    }
}
