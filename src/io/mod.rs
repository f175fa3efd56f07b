//! Input/output helpers.
//!
//! - focal-plane table ingest + validation (`ingest`)
//! - project registry + data directory (`projects`)
//! - grid / point-cloud text exports (`export`)
//! - curve JSON read/write (`curve`)

pub mod curve;
pub mod export;
pub mod ingest;
pub mod projects;

pub use curve::*;
pub use export::*;
pub use ingest::*;
pub use projects::*;
