//! Curve construction and sphere fitting.
//!
//! Responsibilities:
//!
//! - turn tabulated (R, Z, CRD) samples into continuous curves
//! - estimate the best-fit sphere of a sampled curve
//! - derive slope angles for aspherical and spherical curves

pub mod bfs;
pub mod interpolator;

pub use bfs::*;
pub use interpolator::*;
