//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during analysis
//! - exported to JSON/text
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Default number of grid points between the axis and the vignetting radius.
pub const DEFAULT_GRID_POINTS: usize = 500;

/// Default data directory (relative to the working directory).
pub const DEFAULT_DATA_DIR: &str = "Data_focal_planes";

/// Unit used when reporting slope angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[value(name = "deg")]
    Degrees,
    #[value(name = "rad")]
    Radians,
}

impl AngleUnit {
    /// Convert an angle given in radians into this unit.
    pub fn from_radians(self, value: f64) -> f64 {
        match self {
            AngleUnit::Degrees => value.to_degrees(),
            AngleUnit::Radians => value,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AngleUnit::Degrees => "deg",
            AngleUnit::Radians => "rad",
        }
    }
}

/// One project's tabulated optical data.
///
/// `r`, `z` and `crd` are parallel; `slope` / `bfs_slope` are the optional
/// precomputed columns some exports carry (radians).
#[derive(Debug, Clone, Default)]
pub struct CurveSamples {
    pub r: Vec<f64>,
    pub z: Vec<f64>,
    pub crd: Vec<f64>,
    pub slope: Option<Vec<f64>>,
    pub bfs_slope: Option<Vec<f64>>,
}

impl CurveSamples {
    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }

    /// Largest tabulated radius (0 when empty).
    pub fn r_max(&self) -> f64 {
        self.r.iter().copied().fold(0.0, f64::max)
    }
}

/// Even asphere sag formula.
///
/// ```text
/// z(r) = c r² / (1 + sqrt(1 - (1 + k) c² r²)) + a4 r⁴ + a6 r⁶ + ...
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsphereFormula {
    /// Vertex curvature `c = 1/R` (1/mm).
    pub curvature: f64,
    /// Conic constant `k`.
    #[serde(default)]
    pub conic: f64,
    /// Even polynomial terms, starting at `r⁴`.
    #[serde(default)]
    pub coefficients: Vec<f64>,
}

/// Per-project focal surface configuration.
///
/// Immutable for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocalSurf {
    pub name: String,
    /// Vignetting radius (mm): the grid runs over `[0, vig_r]`.
    pub vig_r: f64,
    /// Reference best-fit sphere radius published for the project (mm).
    #[serde(default)]
    pub bfs: Option<f64>,
    /// Tabulated data file, relative to the data directory.
    #[serde(default)]
    pub data_file: Option<String>,
    #[serde(default)]
    pub asphere: Option<AsphereFormula>,
}

impl FocalSurf {
    /// Whether an analytic R→Z formula is available.
    pub fn asph_formula(&self) -> bool {
        self.asphere.is_some()
    }

    /// Analytic R→Z evaluator, if the project has one.
    pub fn asph_r2z(&self) -> Option<impl Fn(f64) -> Result<f64, crate::error::SurfaceError> + '_> {
        self.asphere.as_ref().map(|f| move |r: f64| f.sag(r))
    }

    /// Data file name, defaulting to `<name>.txt`.
    pub fn data_file_name(&self) -> String {
        self.data_file
            .clone()
            .unwrap_or_else(|| format!("{}.txt", self.name))
    }
}

/// The set of known projects (`projects.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRegistry {
    pub projects: Vec<FocalSurf>,
}

impl ProjectRegistry {
    /// Case-insensitive lookup by project name.
    pub fn find(&self, name: &str) -> Option<&FocalSurf> {
        self.projects
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn names(&self) -> Vec<String> {
        self.projects.iter().map(|p| p.name.clone()).collect()
    }
}

/// Output of the best-fit-sphere estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BfsResult {
    /// Sphere radius (mm). Negative when the surface curves toward `+z`.
    pub radius: f64,
    /// Curvature `1/radius` (1/mm).
    pub curvature: f64,
    /// RMS of `z - z_sphere` over the fitted samples (mm).
    pub rms: f64,
    /// Gauss–Newton iterations used.
    pub iterations: usize,
}

/// Summary of the aspherical-minus-BFS error curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub rms: f64,
    pub max_abs: f64,
    pub peak_to_valley: f64,
}

/// Everything derived by one analysis run.
#[derive(Debug, Clone)]
pub struct SurfaceAnalysis {
    pub surf: FocalSurf,
    pub samples: CurveSamples,
    pub angle_unit: AngleUnit,
    /// Uniform grid over `[0, vig_r]`.
    pub r: Vec<f64>,
    /// Interpolated (and possibly extrapolated) sag.
    pub z: Vec<f64>,
    /// Analytic sag on the same grid, when the project has a formula.
    pub z_analytic: Option<Vec<f64>>,
    /// CRD over the grid points inside the tabulated domain.
    pub crd: Vec<(f64, f64)>,
    pub bfs: BfsResult,
    pub bfs_analytic: Option<BfsResult>,
    pub z_bfs: Vec<f64>,
    /// `z - z_bfs`.
    pub error: Vec<f64>,
    pub error_stats: ErrorStats,
    /// Slope angle of the aspherical curve, in `angle_unit`.
    pub slope: Vec<f64>,
    /// Slope angle of the BFS, in `angle_unit`.
    pub slope_bfs: Vec<f64>,
    /// Slope angle of the analytic formula, in `angle_unit`.
    pub slope_analytic: Option<Vec<f64>>,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub project: String,
    pub data_dir: PathBuf,
    pub grid_points: usize,
    pub angle_unit: AngleUnit,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_grid: Option<PathBuf>,
    pub export_cloud: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
}

/// A saved analysis (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub project: String,
    pub vig_r: f64,
    pub bfs_mm: f64,
    #[serde(default)]
    pub bfs_analytic_mm: Option<f64>,
    pub angle_unit: AngleUnit,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub r: Vec<f64>,
    pub z: Vec<f64>,
    pub z_bfs: Vec<f64>,
    pub error: Vec<f64>,
    pub slope: Vec<f64>,
    pub slope_bfs: Vec<f64>,
    #[serde(default)]
    pub z_analytic: Option<Vec<f64>>,
}
