//! Shared analysis pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! project lookup -> table ingest -> interpolation -> grid -> BFS -> derived curves
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::{Path, PathBuf};

use crate::domain::{AnalysisConfig, AngleUnit, CurveSamples, FocalSurf, SurfaceAnalysis};
use crate::error::{AppError, SurfaceError};
use crate::fit::{CurveInterpolator, bfs_sag_curve, bfs_slope_angles, fit_bfs, slope_angles};
use crate::io::ingest::{IngestedTable, read_focal_plane_data};
use crate::io::projects::{data_path, load_project, load_registry};
use crate::math::lin_space;
use crate::report::compute_error_stats;

/// All computed outputs of a single `fsurf analyze` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub analysis: SurfaceAnalysis,
    pub data_path: PathBuf,
    pub table: IngestedTable,
}

/// Where the BFS shown for a project comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BfsSource {
    /// Published value from the project registry.
    Reference,
    /// Fitted on the tabulated samples.
    Fitted,
}

/// One project's entry in a comparison.
#[derive(Debug, Clone)]
pub struct CompareEntry {
    pub surf: FocalSurf,
    pub samples: CurveSamples,
    pub bfs: f64,
    pub bfs_source: BfsSource,
}

/// Tabulated slope of the aspherical curve vs its BFS for one project.
#[derive(Debug, Clone)]
pub struct SlopeComparison {
    pub project: String,
    pub r: Vec<f64>,
    pub slope: Vec<f64>,
    pub bfs_slope: Vec<f64>,
    pub angle_unit: AngleUnit,
}

/// Output of `fsurf compare`.
#[derive(Debug, Clone)]
pub struct CompareOutput {
    pub entries: Vec<CompareEntry>,
    pub slope: Option<SlopeComparison>,
}

/// Execute the full analysis for the configured project.
pub fn run_analysis(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    let surf = load_project(&config.data_dir, &config.project)?;
    log::info!("Project loaded: {}", surf.name);
    run_analysis_for(surf, &config.data_dir, config.grid_points, config.angle_unit)
}

/// Execute the analysis for an already resolved project.
pub fn run_analysis_for(
    surf: FocalSurf,
    data_dir: &Path,
    grid_points: usize,
    angle_unit: AngleUnit,
) -> Result<RunOutput, AppError> {
    let path = data_path(data_dir, &surf);
    let table = read_focal_plane_data(&path)?;
    let analysis = analyze_surface(&surf, &table.samples, grid_points, angle_unit)?;
    Ok(RunOutput {
        analysis,
        data_path: path,
        table,
    })
}

/// Derive every curve of the analysis from one project's samples.
pub fn analyze_surface(
    surf: &FocalSurf,
    samples: &CurveSamples,
    grid_points: usize,
    angle_unit: AngleUnit,
) -> Result<SurfaceAnalysis, SurfaceError> {
    // 1) Continuous curves from the table.
    let interp = CurveInterpolator::from_samples(samples)?;

    // 2) Uniform grid up to the vignetting radius.
    let r = lin_space(0.0, surf.vig_r, grid_points)?;
    let (_, r_tab_max) = interp.r2z.domain();
    if surf.vig_r > r_tab_max {
        log::warn!(
            "{}: vigR={} exceeds the tabulated range (R<={}); Z is extrapolated",
            surf.name,
            surf.vig_r,
            r_tab_max
        );
    }
    let z = interp.r2z.eval_many(&r)?;
    let z_analytic = match surf.asph_r2z() {
        Some(r2z) => Some(r.iter().map(|&x| r2z(x)).collect::<Result<Vec<_>, _>>()?),
        None => None,
    };

    // 3) Best-fit spheres.
    let bfs = fit_bfs(&r, &z)?;
    let bfs_analytic = z_analytic.as_deref().map(|za| fit_bfs(&r, za)).transpose()?;
    match &bfs_analytic {
        Some(a) => log::info!("BFS = {:.3} mm | BFS (analytic) = {:.3} mm", bfs.radius, a.radius),
        None => log::info!("BFS = {:.3} mm", bfs.radius),
    }

    // 4) Derived curves.
    let z_bfs = bfs_sag_curve(bfs.radius, &r)?;
    let error: Vec<f64> = z.iter().zip(z_bfs.iter()).map(|(a, b)| a - b).collect();
    let error_stats = compute_error_stats(&error);

    let derivatives = r
        .iter()
        .map(|&x| interp.r2z.derivative(x))
        .collect::<Result<Vec<_>, _>>()?;
    let slope = slope_angles(&derivatives, angle_unit);
    let slope_bfs = bfs_slope_angles(bfs.radius, &r, angle_unit)?;
    let slope_analytic = match &surf.asphere {
        Some(formula) => {
            let derivatives = r.iter().map(|&x| formula.slope(x)).collect::<Result<Vec<_>, _>>()?;
            Some(slope_angles(&derivatives, angle_unit))
        }
        None => None,
    };
    let crd = interp.crd_within_domain(&r);

    Ok(SurfaceAnalysis {
        surf: surf.clone(),
        samples: samples.clone(),
        angle_unit,
        r,
        z,
        z_analytic,
        crd,
        bfs,
        bfs_analytic,
        z_bfs,
        error,
        error_stats,
        slope,
        slope_bfs,
        slope_analytic,
    })
}

/// Load several projects for side-by-side comparison.
///
/// `slope_project` selects the project whose aspherical and BFS slopes are
/// compared; tabulated `Slope`/`BFS_Slope` columns are used when present.
pub fn run_compare(
    data_dir: &Path,
    projects: &[String],
    slope_project: Option<&str>,
    angle_unit: AngleUnit,
) -> Result<CompareOutput, AppError> {
    let registry = load_registry(data_dir)?;
    let names: Vec<String> = if projects.is_empty() {
        registry.names()
    } else {
        projects.to_vec()
    };

    let mut entries = Vec::with_capacity(names.len());
    for name in &names {
        let surf = registry
            .find(name)
            .cloned()
            .ok_or_else(|| AppError::new(2, format!("Unknown project '{name}'.")))?;
        let table = read_focal_plane_data(&data_path(data_dir, &surf))?;
        let (bfs, bfs_source) = match surf.bfs {
            Some(b) => (b, BfsSource::Reference),
            None => (fit_bfs(&table.samples.r, &table.samples.z)?.radius, BfsSource::Fitted),
        };
        log::info!("Project loaded: {} (BFS = {:.0} mm)", surf.name, bfs);
        entries.push(CompareEntry {
            surf,
            samples: table.samples,
            bfs,
            bfs_source,
        });
    }

    let slope = match slope_project {
        Some(name) => {
            let entry = entries
                .iter()
                .find(|e| e.surf.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    AppError::new(2, format!("Slope project '{name}' is not part of the comparison."))
                })?;
            Some(slope_comparison(entry, angle_unit)?)
        }
        None => None,
    };

    Ok(CompareOutput { entries, slope })
}

/// Slope curves at the tabulated radii, preferring the tabulated columns.
pub fn slope_comparison(entry: &CompareEntry, angle_unit: AngleUnit) -> Result<SlopeComparison, SurfaceError> {
    let samples = &entry.samples;
    let slope = match &samples.slope {
        Some(col) => col.iter().map(|v| angle_unit.from_radians(*v)).collect(),
        None => {
            let interp = CurveInterpolator::from_samples(samples)?;
            let derivatives = samples
                .r
                .iter()
                .map(|&x| interp.r2z.derivative(x))
                .collect::<Result<Vec<_>, _>>()?;
            slope_angles(&derivatives, angle_unit)
        }
    };
    let bfs_slope = match &samples.bfs_slope {
        Some(col) => col.iter().map(|v| angle_unit.from_radians(*v)).collect(),
        None => bfs_slope_angles(entry.bfs, &samples.r, angle_unit)?,
    };

    Ok(SlopeComparison {
        project: entry.surf.name.clone(),
        r: samples.r.clone(),
        slope,
        bfs_slope,
        angle_unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AsphereFormula;

    fn sphere_table(radius: f64, r_max: f64, n: usize) -> CurveSamples {
        let r: Vec<f64> = (0..n).map(|i| i as f64 * r_max / (n as f64 - 1.0)).collect();
        let z = r.iter().map(|x| (radius * radius - x * x).sqrt() - radius).collect();
        let crd = r.iter().map(|x| 1e-3 * x).collect();
        CurveSamples {
            r,
            z,
            crd,
            slope: None,
            bfs_slope: None,
        }
    }

    fn surf(vig_r: f64) -> FocalSurf {
        FocalSurf {
            name: "TEST".to_string(),
            vig_r,
            bfs: None,
            data_file: None,
            asphere: None,
        }
    }

    #[test]
    fn spherical_table_has_negligible_error() {
        let samples = sphere_table(3000.0, 400.0, 41);
        let a = analyze_surface(&surf(400.0), &samples, 200, AngleUnit::Degrees).unwrap();

        assert_eq!(a.r.len(), 200);
        assert!(((a.bfs.radius - 3000.0) / 3000.0).abs() < 1e-6, "bfs={}", a.bfs.radius);
        assert!(a.error_stats.max_abs < 1e-5, "max_abs={}", a.error_stats.max_abs);
        for (s, sb) in a.slope.iter().zip(a.slope_bfs.iter()) {
            assert!((s - sb).abs() < 1e-3);
        }
        assert_eq!(a.crd.len(), 200);
        assert!(a.z_analytic.is_none());
    }

    #[test]
    fn grid_beyond_table_extrapolates_z_and_clips_crd() {
        let samples = sphere_table(3000.0, 400.0, 41);
        let a = analyze_surface(&surf(420.0), &samples, 43, AngleUnit::Radians).unwrap();
        assert_eq!(a.z.len(), 43);
        assert!(a.crd.len() < 43);
        assert!(a.crd.iter().all(|(r, _)| *r <= 400.0));
    }

    #[test]
    fn analytic_formula_gets_its_own_bfs() {
        let samples = sphere_table(3000.0, 400.0, 41);
        let mut s = surf(400.0);
        s.asphere = Some(AsphereFormula {
            curvature: -1.0 / 2500.0,
            conic: 0.0,
            coefficients: Vec::new(),
        });
        let a = analyze_surface(&s, &samples, 100, AngleUnit::Degrees).unwrap();
        let analytic = a.bfs_analytic.unwrap();
        assert!((analytic.radius - 2500.0).abs() < 1e-3, "analytic bfs={}", analytic.radius);
        assert_eq!(a.z_analytic.as_ref().map(Vec::len), Some(100));
        let slope = a.slope_analytic.unwrap();
        assert_eq!(slope[0], 0.0);
        assert!(slope[99] < 0.0);
    }

    #[test]
    fn too_few_samples_fail_before_fitting() {
        let samples = sphere_table(3000.0, 400.0, 3);
        let err = analyze_surface(&surf(400.0), &samples, 100, AngleUnit::Degrees).unwrap_err();
        assert!(matches!(err, SurfaceError::InsufficientData { .. }));
    }

    #[test]
    fn slope_comparison_prefers_tabulated_columns() {
        let mut samples = sphere_table(3000.0, 400.0, 11);
        samples.slope = Some(vec![0.01; 11]);
        let entry = CompareEntry {
            surf: surf(400.0),
            samples,
            bfs: 3000.0,
            bfs_source: BfsSource::Fitted,
        };
        let cmp = slope_comparison(&entry, AngleUnit::Degrees).unwrap();
        assert!((cmp.slope[3] - 0.01_f64.to_degrees()).abs() < 1e-12);
        assert_eq!(cmp.bfs_slope[0], 0.0);
        assert!(cmp.bfs_slope[10] < 0.0);
    }
}
