//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each series is drawn as a polyline with its own glyph; later series are
//! drawn first so the first series stays on top where lines overlap.

use crate::app::pipeline::{CompareOutput, SlopeComparison};
use crate::domain::{CurveFile, SurfaceAnalysis};

/// One polyline to draw.
#[derive(Debug, Clone)]
pub struct PlotSeries {
    pub label: String,
    pub glyph: char,
    pub points: Vec<(f64, f64)>,
}

impl PlotSeries {
    pub fn new(label: impl Into<String>, glyph: char, xs: &[f64], ys: &[f64]) -> Self {
        Self {
            label: label.into(),
            glyph,
            points: xs.iter().copied().zip(ys.iter().copied()).collect(),
        }
    }
}

const GLYPHS: [char; 6] = ['*', '+', 'o', 'x', '#', '%'];

/// Render the aspherical curve vs BFS plot and the error plot of an analysis.
pub fn render_analysis_plots(analysis: &SurfaceAnalysis, width: usize, height: usize) -> String {
    let mut curves = vec![
        PlotSeries::new("Aspherical curve", '*', &analysis.r, &analysis.z),
        PlotSeries::new("BFS", '-', &analysis.r, &analysis.z_bfs),
    ];
    if let Some(za) = &analysis.z_analytic {
        curves.push(PlotSeries::new("Analytic", '.', &analysis.r, za));
    }

    let mut out = String::new();
    out.push_str("Focal plane aspherical curve and Best Fit Sphere\n");
    out.push_str(&render_ascii_plot(&curves, width, height, "r [mm]", "z [mm]"));
    out.push('\n');
    out.push_str("Z error between aspherical curve and BFS\n");
    out.push_str(&render_ascii_plot(
        &[PlotSeries::new("Asph - BFS", '*', &analysis.r, &analysis.error)],
        width,
        height,
        "r [mm]",
        "error [mm]",
    ));
    out
}

/// Render a plot from a saved curve JSON file.
pub fn render_curve_file_plot(curve: &CurveFile, width: usize, height: usize) -> String {
    let mut series = vec![
        PlotSeries::new("Aspherical curve", '*', &curve.grid.r, &curve.grid.z),
        PlotSeries::new(format!("BFS = {:.0} mm", curve.bfs_mm), '-', &curve.grid.r, &curve.grid.z_bfs),
    ];
    if let Some(za) = &curve.grid.z_analytic {
        series.push(PlotSeries::new("Analytic", '.', &curve.grid.r, za));
    }
    let mut out = format!("{} (generated {})\n", curve.project, curve.generated_at.format("%Y-%m-%d %H:%M"));
    out.push_str(&render_ascii_plot(&series, width, height, "r [mm]", "z [mm]"));
    out
}

/// Render the multi-project comparison (`-Z` vs `R`) and, when present, the slope plot.
pub fn render_compare_plots(cmp: &CompareOutput, width: usize, height: usize) -> String {
    let series: Vec<PlotSeries> = cmp
        .entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let neg_z: Vec<f64> = e.samples.z.iter().map(|z| -z).collect();
            PlotSeries::new(
                format!("{} - BFS = {:.0} mm", e.surf.name, e.bfs),
                GLYPHS[i % GLYPHS.len()],
                &e.samples.r,
                &neg_z,
            )
        })
        .collect();

    let mut out = String::from("Focal plane comparison\n");
    out.push_str(&render_ascii_plot(&series, width, height, "R [mm]", "Z [mm]"));
    if let Some(slope) = &cmp.slope {
        out.push('\n');
        out.push_str(&render_slope_plot(slope, width, height));
    }
    out
}

fn render_slope_plot(s: &SlopeComparison, width: usize, height: usize) -> String {
    let asph: Vec<f64> = s.slope.iter().map(|v| -v).collect();
    let bfs: Vec<f64> = s.bfs_slope.iter().map(|v| -v).collect();
    let mut out = format!("Slope - {}\n", s.project);
    out.push_str(&render_ascii_plot(
        &[
            PlotSeries::new("Asph", '*', &s.r, &asph),
            PlotSeries::new("BFS", '-', &s.r, &bfs),
        ],
        width,
        height,
        "R [mm]",
        &format!("slope [{}]", s.angle_unit.label()),
    ));
    out
}

/// Render series onto a fixed-size character grid with a one-line header and legend.
pub fn render_ascii_plot(
    series: &[PlotSeries],
    width: usize,
    height: usize,
    x_label: &str,
    y_label: &str,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = range(series.iter().flat_map(|s| s.points.iter().map(|p| p.0))).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(series.iter().flat_map(|s| s.points.iter().map(|p| p.1))).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    for s in series.iter().rev() {
        draw_curve(&mut grid, &s.points, s.glyph, x_min, x_max, y_min, y_max);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {x_label}=[{x_min:.3}, {x_max:.3}] | {y_label}=[{y_min:.4}, {y_max:.4}]\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    let legend: Vec<String> = series.iter().map(|s| format!("{} {}", s.glyph, s.label)).collect();
    out.push_str(&legend.join("  "));
    out.push('\n');

    out
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else if min.is_finite() {
        Some((min - 0.5, min + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    glyph: char,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        if !(x.is_finite() && y.is_finite()) {
            prev = None;
            continue;
        }
        let xx = map_x(x, x_min, x_max, width);
        let yy = map_y(y, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, xx, yy, glyph),
            None => grid[yy][xx] = glyph,
        }
        prev = Some((xx, yy));
    }
}

/// Integer line drawing (Bresenham-ish). Overwrites cells, so call order
/// decides which series ends up on top.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_golden_snapshot_small() {
        let series = [
            PlotSeries::new("rising", '*', &[0.0, 9.0], &[0.0, 10.0]),
            PlotSeries::new("flat", '-', &[0.0, 9.0], &[0.0, 0.0]),
        ];
        let txt = render_ascii_plot(&series, 10, 5, "r", "z");
        let expected = concat!(
            "Plot: r=[0.000, 9.000] | z=[-0.5000, 10.5000]\n",
            "        **\n",
            "      **\n",
            "    **\n",
            "  **\n",
            "**--------\n",
            "* rising  - flat\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn first_series_is_drawn_on_top() {
        let series = [
            PlotSeries::new("a", 'a', &[0.0, 1.0], &[1.0, 1.0]),
            PlotSeries::new("b", 'b', &[0.0, 1.0], &[1.0, 1.0]),
        ];
        let txt = render_ascii_plot(&series, 10, 5, "x", "y");
        assert!(!txt.lines().skip(1).take(5).any(|l| l.contains('b')));
    }
}
