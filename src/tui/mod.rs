//! Ratatui-based terminal UI.
//!
//! The TUI cycles through the registered projects and renders, for the
//! selected one, the aspherical curve with its BFS, the Z error or the slopes.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::pipeline::{RunOutput, run_analysis_for};
use crate::cli::TuiArgs;
use crate::domain::{AngleUnit, ProjectRegistry, SurfaceAnalysis};
use crate::error::AppError;
use crate::io::projects::{load_registry, resolve_data_dir};

mod plotters_chart;

use plotters_chart::{ChartLine, SurfacePlottersChart};

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    // Load before touching the terminal so registry errors print normally.
    let mut app = App::new(&args)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// What the chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Curve,
    Error,
    Slope,
}

impl View {
    fn next(self) -> Self {
        match self {
            View::Curve => View::Error,
            View::Error => View::Slope,
            View::Slope => View::Curve,
        }
    }

    fn title(self) -> &'static str {
        match self {
            View::Curve => "Aspherical curve and BFS",
            View::Error => "Z error (Asph - BFS)",
            View::Slope => "Slope",
        }
    }
}

struct App {
    data_dir: PathBuf,
    registry: ProjectRegistry,
    selected: usize,
    grid_points: usize,
    angle_unit: AngleUnit,
    view: View,
    show_analytic: bool,
    status: String,
    run: Option<RunOutput>,
}

impl App {
    fn new(args: &TuiArgs) -> Result<Self, AppError> {
        let data_dir = resolve_data_dir(args.source.data_dir.as_deref());
        let registry = load_registry(&data_dir)?;
        let selected = match &args.project {
            Some(name) => registry
                .projects
                .iter()
                .position(|p| p.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    AppError::new(
                        2,
                        format!("Unknown project '{name}'. Available: {}", registry.names().join(", ")),
                    )
                })?,
            None => 0,
        };

        let mut app = Self {
            data_dir,
            registry,
            selected,
            grid_points: args.source.grid_points,
            angle_unit: args.source.angle_unit,
            view: View::Curve,
            show_analytic: true,
            status: String::new(),
            run: None,
        };
        app.reload();
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => self.select(-1),
            KeyCode::Down | KeyCode::Char('j') => self.select(1),
            KeyCode::Char('v') | KeyCode::Tab => {
                self.view = self.view.next();
                self.status = format!("view: {}", self.view.title());
            }
            KeyCode::Char('a') => {
                self.show_analytic = !self.show_analytic;
                self.status = format!("analytic overlay: {}", if self.show_analytic { "on" } else { "off" });
            }
            KeyCode::Char('u') => {
                self.angle_unit = match self.angle_unit {
                    AngleUnit::Degrees => AngleUnit::Radians,
                    AngleUnit::Radians => AngleUnit::Degrees,
                };
                self.reload();
            }
            KeyCode::Char('e') => self.export_grid(),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        false
    }

    fn select(&mut self, delta: isize) {
        let n = self.registry.projects.len();
        if n == 0 {
            return;
        }
        self.selected = (self.selected as isize + delta).rem_euclid(n as isize) as usize;
        self.reload();
    }

    /// Recompute the analysis for the selected project.
    ///
    /// Failures land in the status line so a broken table doesn't end the session.
    fn reload(&mut self) {
        let Some(surf) = self.registry.projects.get(self.selected).cloned() else {
            self.run = None;
            self.status = "No projects registered.".to_string();
            return;
        };
        let name = surf.name.clone();
        match run_analysis_for(surf, &self.data_dir, self.grid_points, self.angle_unit) {
            Ok(run) => {
                self.status = format!("{name}: BFS = {:.0} mm", run.analysis.bfs.radius);
                self.run = Some(run);
            }
            Err(err) => {
                log::warn!("{name}: {err}");
                self.status = format!("{name}: {err}");
                self.run = None;
            }
        }
    }

    fn export_grid(&mut self) {
        let Some(run) = &self.run else {
            self.status = "Nothing to export.".to_string();
            return;
        };
        let path = PathBuf::from(format!("{}_grid.txt", run.analysis.surf.name));
        self.status = match crate::io::export::write_grid_txt(&path, &run.analysis) {
            Ok(()) => format!("Wrote {}", path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("fsurf", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" | data: {}", self.data_dir.display())),
        ]));

        if let Some(run) = &self.run {
            let a = &run.analysis;
            lines.push(Line::from(Span::styled(
                format!(
                    "project: {} | vigR: {:.3} mm | n={} | grid={}",
                    a.surf.name,
                    a.surf.vig_r,
                    a.samples.len(),
                    a.r.len()
                ),
                Style::default().fg(Color::Gray),
            )));
            let mut bfs = format!(
                "BFS = {:.3} mm | rms err={:.6} mm | PV={:.6} mm",
                a.bfs.radius, a.error_stats.rms, a.error_stats.peak_to_valley
            );
            if let Some(analytic) = &a.bfs_analytic {
                bfs.push_str(&format!(" | BFS (analytic) = {:.3} mm", analytic.radius));
            }
            lines.push(Line::from(Span::styled(bfs, Style::default().fg(Color::Gray))));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(24)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_projects(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title(self.view.title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(run) = &self.run else {
            let msg = Paragraph::new("No analysis for this project.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let series = chart_series(&run.analysis, self.view, self.show_analytic);
        let lines: Vec<ChartLine<'_>> = series
            .lines
            .iter()
            .map(|(points, color)| ChartLine {
                points,
                color: *color,
            })
            .collect();

        let (chart_rect, insets) = chart_layout(inner);
        let widget = SurfacePlottersChart {
            lines: &lines,
            points: &series.points,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
        };
        frame.render_widget(widget, chart_rect);

        if let Some(insets) = insets {
            let y_label = match self.view {
                View::Curve => "z (mm)".to_string(),
                View::Error => "err (mm)".to_string(),
                View::Slope => format!("slope ({})", run.analysis.angle_unit.label()),
            };
            draw_axis_ticks(frame, inner, chart_rect, insets, series.x_bounds, series.y_bounds, &y_label);
        }
    }

    fn draw_projects(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .registry
            .projects
            .iter()
            .map(|p| ListItem::new(p.name.clone()))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Projects").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ project  v view  a analytic  u unit  e export  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Data for one chart view.
struct ChartSeries {
    lines: Vec<(Vec<(f64, f64)>, RGBColor)>,
    points: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

const CURVE_COLOR: RGBColor = RGBColor(0, 255, 255);
const BFS_COLOR: RGBColor = RGBColor(255, 200, 0);
const ANALYTIC_COLOR: RGBColor = RGBColor(255, 0, 255);

fn zip(xs: &[f64], ys: &[f64]) -> Vec<(f64, f64)> {
    xs.iter().copied().zip(ys.iter().copied()).collect()
}

/// Build chart series for Plotters.
fn chart_series(a: &SurfaceAnalysis, view: View, show_analytic: bool) -> ChartSeries {
    let mut lines = Vec::new();
    let mut points = Vec::new();
    match view {
        View::Curve => {
            lines.push((zip(&a.r, &a.z_bfs), BFS_COLOR));
            if show_analytic {
                if let Some(za) = &a.z_analytic {
                    lines.push((zip(&a.r, za), ANALYTIC_COLOR));
                }
            }
            lines.push((zip(&a.r, &a.z), CURVE_COLOR));
            points = zip(&a.samples.r, &a.samples.z)
                .into_iter()
                .filter(|(r, _)| *r <= a.surf.vig_r)
                .collect();
        }
        View::Error => {
            lines.push((zip(&a.r, &a.error), CURVE_COLOR));
            if show_analytic {
                if let (Some(za), Some(b)) = (&a.z_analytic, &a.bfs_analytic) {
                    if let Ok(zb) = crate::fit::bfs_sag_curve(b.radius, &a.r) {
                        let err: Vec<f64> = za.iter().zip(zb.iter()).map(|(x, y)| x - y).collect();
                        lines.push((zip(&a.r, &err), ANALYTIC_COLOR));
                    }
                }
            }
        }
        View::Slope => {
            lines.push((zip(&a.r, &a.slope_bfs), BFS_COLOR));
            if show_analytic {
                if let Some(sa) = &a.slope_analytic {
                    lines.push((zip(&a.r, sa), ANALYTIC_COLOR));
                }
            }
            lines.push((zip(&a.r, &a.slope), CURVE_COLOR));
        }
    }

    let x_bounds = if a.surf.vig_r > 0.0 { [0.0, a.surf.vig_r] } else { [0.0, 1.0] };

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in lines.iter().flat_map(|(l, _)| l.iter()).chain(points.iter()) {
        if y.is_finite() {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        let c = if y_min.is_finite() { y_min } else { 0.0 };
        y_min = c - 0.5;
        y_max = c + 0.5;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    ChartSeries {
        lines,
        points,
        x_bounds,
        y_bounds: [y_min - pad, y_max + pad],
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 10,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn fmt_tick(v: f64, span: f64) -> String {
    if span >= 100.0 {
        format!("{v:.0}")
    } else if span >= 1.0 {
        format!("{v:.2}")
    } else {
        format!("{v:.2e}")
    }
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    y_label: &str,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format!("{x_val:.0}");
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let y_span = y_bounds[1] - y_bounds[0];
    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * y_span;
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_tick(y_val, y_span);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("r (mm)")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(y_label.to_string())
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::analyze_surface;
    use crate::domain::{CurveSamples, FocalSurf};

    fn analysis() -> SurfaceAnalysis {
        let r: Vec<f64> = (0..21).map(|i| i as f64 * 20.0).collect();
        let z = r.iter().map(|x| (9e6 - x * x).sqrt() - 3000.0).collect();
        let crd = vec![0.0; 21];
        let samples = CurveSamples {
            r,
            z,
            crd,
            slope: None,
            bfs_slope: None,
        };
        let surf = FocalSurf {
            name: "T".to_string(),
            vig_r: 380.0,
            bfs: None,
            data_file: None,
            asphere: None,
        };
        analyze_surface(&surf, &samples, 100, AngleUnit::Degrees).unwrap()
    }

    #[test]
    fn curve_view_clips_samples_to_vig_r() {
        let s = chart_series(&analysis(), View::Curve, true);
        assert_eq!(s.lines.len(), 2);
        assert_eq!(s.points.len(), 20);
        assert_eq!(s.x_bounds, [0.0, 380.0]);
        assert!(s.y_bounds[0] < s.y_bounds[1]);
    }

    #[test]
    fn flat_error_view_gets_non_degenerate_bounds() {
        let s = chart_series(&analysis(), View::Error, false);
        assert!(s.y_bounds[1] > s.y_bounds[0]);
    }

    #[test]
    fn views_cycle() {
        assert_eq!(View::Curve.next().next().next(), View::Curve);
    }
}
