//! `focal-surf` library crate.
//!
//! The binary (`fsurf`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the interpolation and BFS fitting can be reused outside the CLI

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
