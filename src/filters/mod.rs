//! Filters built on the point set transforms.

pub mod gaussian_filter;
