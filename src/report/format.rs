//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the numerical code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::{BfsSource, CompareOutput, RunOutput, SlopeComparison};
use crate::domain::SurfaceAnalysis;

/// Format the full run summary (dataset stats + BFS + error diagnostics).
pub fn format_run_summary(run: &RunOutput) -> String {
    let a = &run.analysis;
    let mut out = String::new();

    out.push_str("=== fsurf - focal surface analysis ===\n");
    out.push_str(&format!("Project: {}\n", a.surf.name));
    out.push_str(&format!("Data: {}\n", run.data_path.display()));
    out.push_str(&format!(
        "Samples: n={} | R=[{:.3}, {:.3}] mm | rows skipped={}\n",
        a.samples.len(),
        a.samples.r.first().copied().unwrap_or(0.0),
        a.samples.r_max(),
        run.table.row_errors.len(),
    ));
    out.push_str(&format!("Grid: n={} | r=[0, {:.3}] mm (vigR)\n", a.r.len(), a.surf.vig_r));

    out.push_str(&format_bfs_block(a));
    out.push_str(&format_error_block(a));

    if let Some((r_max, crd_max)) = a
        .crd
        .iter()
        .copied()
        .max_by(|x, y| x.1.abs().partial_cmp(&y.1.abs()).unwrap_or(std::cmp::Ordering::Equal))
    {
        out.push_str(&format!("CRD: max |CRD|={:.6} at r={:.3} mm\n", crd_max.abs(), r_max));
    }
    out.push('\n');

    out
}

fn format_bfs_block(a: &SurfaceAnalysis) -> String {
    let mut out = String::from("\nBest fit sphere:\n");
    out.push_str(&format!(
        "- BFS = {:.3} mm (rms={:.6} mm, iters={})\n",
        a.bfs.radius, a.bfs.rms, a.bfs.iterations
    ));
    if let Some(analytic) = &a.bfs_analytic {
        out.push_str(&format!(
            "- BFS = {:.3} mm (analytic formula, rms={:.6} mm)\n",
            analytic.radius, analytic.rms
        ));
    }
    if let Some(reference) = a.surf.bfs {
        out.push_str(&format!("- reference BFS = {reference:.3} mm\n"));
    }
    out
}

fn format_error_block(a: &SurfaceAnalysis) -> String {
    let s = &a.error_stats;
    let unit = a.angle_unit.label();
    let max_slope_diff = a
        .slope
        .iter()
        .zip(a.slope_bfs.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0_f64, f64::max);

    let mut out = String::from("\nAsph - BFS:\n");
    out.push_str(&format!(
        "- Z error: rms={:.6} mm | max={:.6} mm | PV={:.6} mm\n",
        s.rms, s.max_abs, s.peak_to_valley
    ));
    out.push_str(&format!("- slope difference: max={max_slope_diff:.6} {unit}\n"));
    out
}

/// Format the multi-project comparison table.
pub fn format_compare(cmp: &CompareOutput) -> String {
    let mut out = String::new();
    out.push_str("Focal plane comparison:\n");
    out.push_str(
        format!(
            "{:<16} {:>10} {:>12} {:>12} {:<10}\n",
            "project", "vigR", "Z(vigR)", "BFS", "source"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!("{:-<16} {:-<10} {:-<12} {:-<12} {:-<10}\n", "", "", "", "", "").trim_end(),
    );
    out.push('\n');

    for e in &cmp.entries {
        let z_edge = e.samples.z.last().copied().unwrap_or(f64::NAN);
        let source = match e.bfs_source {
            BfsSource::Reference => "reference",
            BfsSource::Fitted => "fitted",
        };
        out.push_str(
            format!(
                "{:<16} {:>10.3} {:>12.4} {:>12.0} {:<10}\n",
                truncate(&e.surf.name, 16),
                e.surf.vig_r,
                z_edge,
                e.bfs,
                source
            )
            .trim_end(),
        );
        out.push('\n');
    }

    if let Some(slope) = &cmp.slope {
        out.push('\n');
        out.push_str(&format_slope_summary(slope));
    }
    out
}

fn format_slope_summary(s: &SlopeComparison) -> String {
    let unit = s.angle_unit.label();
    let mut out = format!("Slope ({}) [{unit}]:\n", s.project);
    let (Some(last_slope), Some(last_bfs)) = (s.slope.last(), s.bfs_slope.last()) else {
        return out;
    };
    let max_diff = s
        .slope
        .iter()
        .zip(s.bfs_slope.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0_f64, f64::max);
    out.push_str(&format!("- Asph at edge: {last_slope:.6}\n"));
    out.push_str(&format!("- BFS at edge : {last_bfs:.6}\n"));
    out.push_str(&format!("- max |Asph - BFS|: {max_diff:.6}\n"));
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::{CompareEntry, analyze_surface};
    use crate::domain::{AngleUnit, CurveSamples, FocalSurf};
    use crate::io::ingest::IngestedTable;

    fn samples() -> CurveSamples {
        let r: Vec<f64> = (0..11).map(|i| i as f64 * 40.0).collect();
        let z = r.iter().map(|x| (4e6 - x * x).sqrt() - 2000.0).collect();
        let crd = r.iter().map(|x| 1e-4 * x).collect();
        CurveSamples {
            r,
            z,
            crd,
            slope: None,
            bfs_slope: None,
        }
    }

    fn surf(name: &str, bfs: Option<f64>) -> FocalSurf {
        FocalSurf {
            name: name.to_string(),
            vig_r: 400.0,
            bfs,
            data_file: None,
            asphere: None,
        }
    }

    #[test]
    fn run_summary_lists_bfs_and_error() {
        let s = samples();
        let analysis = analyze_surface(&surf("MUST", Some(1999.0)), &s, 50, AngleUnit::Degrees).unwrap();
        let run = RunOutput {
            analysis,
            data_path: "Data_focal_planes/MUST.txt".into(),
            table: IngestedTable {
                samples: s,
                row_errors: Vec::new(),
                rows_read: 11,
            },
        };
        let txt = format_run_summary(&run);
        assert!(txt.contains("Project: MUST"));
        assert!(txt.contains("- BFS = 2000.0") || txt.contains("- BFS = 1999.9"));
        assert!(txt.contains("reference BFS = 1999.000 mm"));
        assert!(txt.contains("slope difference"));
    }

    #[test]
    fn compare_table_marks_bfs_source() {
        let cmp = CompareOutput {
            entries: vec![
                CompareEntry {
                    surf: surf("MUST", Some(11067.0)),
                    samples: samples(),
                    bfs: 11067.0,
                    bfs_source: BfsSource::Reference,
                },
                CompareEntry {
                    surf: surf("A-very-long-project-name", None),
                    samples: samples(),
                    bfs: 2000.0,
                    bfs_source: BfsSource::Fitted,
                },
            ],
            slope: None,
        };
        let txt = format_compare(&cmp);
        let lines: Vec<&str> = txt.lines().collect();
        assert!(lines[3].starts_with("MUST"));
        assert!(lines[3].ends_with("reference"));
        assert!(lines[4].starts_with("A-very-long-pro."));
        assert!(lines[4].ends_with("fitted"));
    }
}
