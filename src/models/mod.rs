//! Analytic surface models.

pub mod asphere;
