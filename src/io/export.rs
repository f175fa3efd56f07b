//! Export analysis grids to plain text.
//!
//! Two layouts:
//! - the analysis grid, one row per radius, for spreadsheets and scripts
//! - the profile point cloud `x y z` with `(r, z, 0)`, for CAD import

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::SurfaceAnalysis;
use crate::error::AppError;

/// Write the analysis grid as whitespace-separated columns.
pub fn write_grid_txt(path: &Path, analysis: &SurfaceAnalysis) -> Result<(), AppError> {
    let mut out = create(path)?;
    let unit = analysis.angle_unit.label();

    let mut header = format!("# r z z_bfs error slope[{unit}] slope_bfs[{unit}]");
    if analysis.z_analytic.is_some() {
        header.push_str(" z_analytic");
    }
    writeln!(out, "# project={} vig_r={} bfs={:.6}", analysis.surf.name, analysis.surf.vig_r, analysis.bfs.radius)
        .map_err(write_err)?;
    writeln!(out, "{header}").map_err(write_err)?;

    for i in 0..analysis.r.len() {
        write!(
            out,
            "{:.6} {:.9} {:.9} {:.9} {:.9} {:.9}",
            analysis.r[i],
            analysis.z[i],
            analysis.z_bfs[i],
            analysis.error[i],
            analysis.slope[i],
            analysis.slope_bfs[i],
        )
        .map_err(write_err)?;
        if let Some(za) = &analysis.z_analytic {
            write!(out, " {:.9}", za[i]).map_err(write_err)?;
        }
        writeln!(out).map_err(write_err)?;
    }

    out.flush().map_err(write_err)?;
    log::info!("Wrote grid: {}", path.display());
    Ok(())
}

/// Write the aspherical profile as a 3D point cloud in the `y = 0` plane
/// (`x = r`, `y = z`, `z = 0`), matching the sketch plane the CAD side expects.
pub fn write_point_cloud_txt(path: &Path, analysis: &SurfaceAnalysis) -> Result<(), AppError> {
    let mut out = create(path)?;
    for (r, z) in analysis.r.iter().zip(analysis.z.iter()) {
        writeln!(out, "{r:.6} {z:.9} 0.000000").map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;
    log::info!("Wrote point cloud: {}", path.display());
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>, AppError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))
}

fn write_err(e: std::io::Error) -> AppError {
    AppError::new(2, format!("Failed to write export: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::analyze_surface;
    use crate::domain::{AngleUnit, AsphereFormula, CurveSamples, FocalSurf};

    fn analysis(with_formula: bool) -> SurfaceAnalysis {
        let r: Vec<f64> = (0..11).map(|i| i as f64 * 30.0).collect();
        let z = r.iter().map(|x| (25e6 - x * x).sqrt() - 5000.0).collect();
        let samples = CurveSamples {
            r,
            z,
            crd: vec![0.0; 11],
            slope: None,
            bfs_slope: None,
        };
        let surf = FocalSurf {
            name: "EXP".to_string(),
            vig_r: 300.0,
            bfs: None,
            data_file: None,
            asphere: with_formula.then(|| AsphereFormula {
                curvature: -1.0 / 5000.0,
                conic: 0.0,
                coefficients: Vec::new(),
            }),
        };
        analyze_surface(&surf, &samples, 7, AngleUnit::Degrees).unwrap()
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("fsurf-export-{}-{name}", std::process::id()))
    }

    #[test]
    fn grid_has_one_row_per_radius() {
        let path = temp_path("grid.txt");
        write_grid_txt(&path, &analysis(true)).unwrap();
        let txt = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let lines: Vec<&str> = txt.lines().collect();
        assert!(lines[0].starts_with("# project=EXP"));
        assert!(lines[1].ends_with("z_analytic"));
        assert_eq!(lines.len(), 2 + 7);
        let last: Vec<f64> = lines[8].split_whitespace().map(|v| v.parse().unwrap()).collect();
        assert_eq!(last.len(), 7);
        assert_eq!(last[0], 300.0);
    }

    #[test]
    fn point_cloud_lies_in_the_sketch_plane() {
        let path = temp_path("cloud.txt");
        write_point_cloud_txt(&path, &analysis(false)).unwrap();
        let txt = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(txt.lines().count(), 7);
        for line in txt.lines() {
            let cols: Vec<f64> = line.split_whitespace().map(|v| v.parse().unwrap()).collect();
            assert_eq!(cols.len(), 3);
            assert_eq!(cols[2], 0.0);
            assert!(cols[1] <= 0.0);
        }
    }
}
