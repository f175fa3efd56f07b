//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - project configuration (`FocalSurf`, `AsphereFormula`, `ProjectRegistry`)
//! - tabulated samples (`CurveSamples`)
//! - analysis outputs (`BfsResult`, `SurfaceAnalysis`, `CurveFile`, etc.)

pub mod types;

pub use types::*;
