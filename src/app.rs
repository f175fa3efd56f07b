//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - runs the focal surface analysis or comparison
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming};

use crate::cli::{AnalyzeArgs, Command, CompareArgs, PlotArgs, TuiArgs};
use crate::domain::AnalysisConfig;
use crate::error::AppError;
use crate::io::projects::resolve_data_dir;

pub mod pipeline;

/// Entry point for the `fsurf` binary.
pub fn run() -> Result<(), AppError> {
    // `fsurf` and `fsurf -p MUST` behave like `fsurf tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let tui = matches!(cli.command, Command::Tui(_));
    // Flushes file output on drop; keep it alive for the whole run.
    let _logger = setup_logging(&cli.log_level, tui)?;

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Compare(args) => handle_compare(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
    }
}

/// Start the global logger.
///
/// CLI runs log to stderr. The TUI owns the terminal, so it logs to rotating
/// files under `logs/` instead.
pub fn setup_logging(level: &str, tui: bool) -> Result<LoggerHandle, AppError> {
    let logger = Logger::try_with_str(level)
        .map_err(|e| AppError::new(2, format!("Invalid log level '{level}': {e}")))?;
    let logger = if tui {
        logger
            .log_to_file(FileSpec::default().directory("logs"))
            .duplicate_to_stderr(Duplicate::None)
            .rotate(Criterion::Size(1024 * 1024), Naming::Timestamps, Cleanup::KeepLogFiles(5))
    } else {
        logger.log_to_stderr()
    };
    logger
        .start()
        .map_err(|e| AppError::new(2, format!("Logger initialization failed: {e}")))
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args);
    let run = pipeline::run_analysis(&config)?;

    println!("{}", crate::report::format_run_summary(&run));

    if config.plot {
        let plot = crate::plot::render_analysis_plots(&run.analysis, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_grid {
        crate::io::export::write_grid_txt(path, &run.analysis)?;
    }
    if let Some(path) = &config.export_cloud {
        crate::io::export::write_point_cloud_txt(path, &run.analysis)?;
    }
    if let Some(path) = &config.export_curve {
        crate::io::curve::write_curve_json(path, &run.analysis)?;
    }

    Ok(())
}

fn handle_compare(args: CompareArgs) -> Result<(), AppError> {
    let data_dir = resolve_data_dir(args.source.data_dir.as_deref());
    let cmp = pipeline::run_compare(
        &data_dir,
        &args.projects,
        args.slope_project.as_deref(),
        args.source.angle_unit,
    )?;

    println!("{}", crate::report::format_compare(&cmp));
    if !args.no_plot {
        println!("{}", crate::plot::render_compare_plots(&cmp, args.width, args.height));
    }
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    crate::tui::run(args)
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = crate::io::curve::read_curve_json(&args.curve)?;
    let plot = crate::plot::render_curve_file_plot(&curve, args.width, args.height);
    println!("{plot}");
    Ok(())
}

pub fn analysis_config_from_args(args: &AnalyzeArgs) -> AnalysisConfig {
    AnalysisConfig {
        project: args.project.clone(),
        data_dir: resolve_data_dir(args.source.data_dir.as_deref()),
        grid_points: args.source.grid_points,
        angle_unit: args.source.angle_unit,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_grid: args.export_grid.clone(),
        export_cloud: args.export_cloud.clone(),
        export_curve: args.export_curve.clone(),
    }
}

/// Rewrite argv so `fsurf` defaults to `fsurf tui`.
///
/// Rules:
/// - `fsurf`                      -> `fsurf tui`
/// - `fsurf -p MUST ...`          -> `fsurf tui -p MUST ...`
/// - `fsurf --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "analyze" | "compare" | "plot" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
