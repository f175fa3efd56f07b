//! Mathematical utilities: splines, sphere geometry, grids and least squares.

pub mod grid;
pub mod ols;
pub mod sphere;
pub mod spline;

pub use grid::*;
pub use ols::*;
pub use spline::*;
