//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of one analysis:
//! - project constants (name, vigR)
//! - BFS radii (tabulated and analytic)
//! - the evaluated grid columns for quick re-plotting
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{CurveFile, CurveGrid, SurfaceAnalysis};
use crate::error::AppError;

/// Build the serializable form of an analysis.
pub fn curve_file_from_analysis(analysis: &SurfaceAnalysis) -> CurveFile {
    CurveFile {
        tool: "fsurf".to_string(),
        generated_at: Utc::now(),
        project: analysis.surf.name.clone(),
        vig_r: analysis.surf.vig_r,
        bfs_mm: analysis.bfs.radius,
        bfs_analytic_mm: analysis.bfs_analytic.map(|b| b.radius),
        angle_unit: analysis.angle_unit,
        grid: CurveGrid {
            r: analysis.r.clone(),
            z: analysis.z.clone(),
            z_bfs: analysis.z_bfs.clone(),
            error: analysis.error.clone(),
            slope: analysis.slope.clone(),
            slope_bfs: analysis.slope_bfs.clone(),
            z_analytic: analysis.z_analytic.clone(),
        },
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, analysis: &SurfaceAnalysis) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, &curve_file_from_analysis(analysis))
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;

    log::info!("Wrote curve JSON: {}", path.display());
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid curve JSON: {e}")))?;

    let n = curve.grid.r.len();
    let columns = [
        curve.grid.z.len(),
        curve.grid.z_bfs.len(),
        curve.grid.error.len(),
        curve.grid.slope.len(),
        curve.grid.slope_bfs.len(),
    ];
    if columns.iter().any(|&len| len != n)
        || curve.grid.z_analytic.as_ref().is_some_and(|v| v.len() != n)
    {
        return Err(AppError::new(2, "Invalid curve JSON: grid columns differ in length."));
    }
    Ok(curve)
}
