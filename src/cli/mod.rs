//! Command-line parsing for the focal surface analyzer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the interpolation/fitting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{AngleUnit, DEFAULT_GRID_POINTS};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "fsurf",
    version,
    about = "Focal surface curve interpolation and best-fit-sphere analysis"
)]
pub struct Cli {
    /// Log filter (e.g. `info`, `debug`, `focal_surf=trace`).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interpolate one project's table, fit its BFS, print diagnostics and optionally plot/export.
    Analyze(AnalyzeArgs),
    /// Compare the focal surfaces of several projects (and optionally one project's slopes).
    Compare(CompareArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `fsurf analyze`, but renders
    /// results in a terminal UI using Ratatui.
    Tui(TuiArgs),
}

/// Where project definitions and tables are read from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Directory holding `projects.json` and the focal-plane tables.
    ///
    /// Falls back to `$FOCAL_DATA_DIR`, then `Data_focal_planes`.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Number of points of the uniform radial grid.
    #[arg(long, default_value_t = DEFAULT_GRID_POINTS)]
    pub grid_points: usize,

    /// Unit of the reported slopes.
    #[arg(long, value_enum, default_value_t = AngleUnit::Degrees)]
    pub angle_unit: AngleUnit,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Project name as listed in `projects.json`.
    #[arg(short = 'p', long)]
    pub project: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Render ASCII plots in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the uniform grid (r, z, z_bfs, error, slopes) as text columns.
    #[arg(long = "export-grid", value_name = "TXT")]
    pub export_grid: Option<PathBuf>,

    /// Export the curve as an `x y z` point cloud for CAD import.
    #[arg(long = "export-cloud", value_name = "TXT")]
    pub export_cloud: Option<PathBuf>,

    /// Export the analysis (BFS + grid) to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CompareArgs {
    /// Projects to compare (repeatable). All registered projects when omitted.
    #[arg(short = 'p', long = "project")]
    pub projects: Vec<String>,

    /// Also compare aspherical and BFS slopes for this project.
    #[arg(long, value_name = "PROJECT")]
    pub slope_project: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for plotting a saved curve.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Curve JSON file produced by `fsurf analyze --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// Project shown first. Defaults to the first registered project.
    #[arg(short = 'p', long)]
    pub project: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,
}
