//! Ratatui-based terminal UI.
//!
//! Shows the merged sweeps as a Plotters chart with a group legend. The data is
//! loaded once; groups and branches are recomputed whenever the mode changes.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::debug;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::color::{dim, group_palette};
use crate::domain::{ColumnMap, Direction, LegendLanguage, PlotMode, RunConfig};
use crate::error::AppError;
use crate::io::ingest::MergedData;
use crate::sweep::{SweepGroup, sweep_groups};

mod plotters_chart;

use plotters_chart::{ChartSeries, SweepPlottersChart};

/// How much reverse branches are darkened relative to their group colour.
const REVERSE_DIM: f32 = 0.45;

/// Start the TUI on already merged data.
pub fn run(merged: MergedData, config: &RunConfig) -> Result<(), AppError> {
    let mut app = App::new(merged, config)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

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

struct App {
    merged: MergedData,
    columns: ColumnMap,
    mode: PlotMode,
    group_decimals: u32,
    log_y: bool,
    /// `None` shows every group.
    selected: Option<usize>,
    groups: Vec<SweepGroup>,
    status: String,
}

impl App {
    fn new(merged: MergedData, config: &RunConfig) -> Result<Self, AppError> {
        let mut app = Self {
            merged,
            columns: config.columns.clone(),
            mode: config.mode,
            group_decimals: config.group_decimals,
            log_y: false,
            selected: None,
            groups: Vec::new(),
            status: String::new(),
        };
        app.regroup()?;
        Ok(app)
    }

    fn regroup(&mut self) -> Result<(), AppError> {
        self.groups = sweep_groups(&self.merged.samples(self.mode), self.group_decimals)?;
        self.selected = None;
        self.status = format!("{} group(s)", self.groups.len());
        debug!("tui: {:?} mode, {} group(s)", self.mode, self.groups.len());
        Ok(())
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
                    if self.handle_key(key.code)? {
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

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('m') => {
                self.mode = self.mode.toggle();
                self.regroup()?;
                self.status = format!("mode: {}", self.mode.title());
            }
            KeyCode::Char('l') => {
                self.log_y = !self.log_y;
                self.status = if self.log_y { "log-y on" } else { "log-y off" }.to_string();
            }
            KeyCode::Left => {
                self.selected = step_selection(self.selected, self.groups.len(), -1);
                self.status = self.selection_label();
            }
            KeyCode::Right => {
                self.selected = step_selection(self.selected, self.groups.len(), 1);
                self.status = self.selection_label();
            }
            _ => {}
        }
        Ok(false)
    }

    fn selection_label(&self) -> String {
        match self.selected.and_then(|i| self.groups.get(i)) {
            Some(group) => format!("showing {}", group.label(self.mode.group_prefix())),
            None => "showing all groups".to_string(),
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let stats = &self.merged.stats;
        let lines = vec![
            Line::from(vec![
                Span::styled("fetview", Style::default().fg(Color::Cyan)),
                Span::raw(format!(" {}", self.mode.title())),
            ]),
            Line::from(Span::styled(
                format!(
                    "files: {}/{} | rows: {}/{} | groups: {} | decimals: {} | y: {}",
                    stats.files_used,
                    stats.files_read,
                    stats.rows_used,
                    stats.rows_read,
                    self.groups.len(),
                    self.group_decimals,
                    if self.log_y { "log" } else { "linear" },
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(LayoutDirection::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(24)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_legend(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title(self.mode.title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let (series, x_bounds, y_bounds) = chart_series(&self.groups, self.selected, self.log_y);
        if series.is_empty() {
            let msg = Paragraph::new("No branches to plot.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let x_label = format!("{} (V)", self.columns.sweep_column(self.mode));
        let y_label = if self.log_y {
            format!("log10 {}", self.columns.response_column())
        } else {
            format!("{} (A)", self.columns.response_column())
        };

        let (chart_rect, insets) = chart_layout(inner);
        let widget = SweepPlottersChart {
            series: &series,
            x_bounds,
            y_bounds,
            x_label: &x_label,
            y_label: &y_label,
            fmt_x: fmt_axis_x,
            fmt_y: if self.log_y { fmt_axis_y_log } else { fmt_axis_y },
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            let labels = AxisLabels {
                x: &x_label,
                y: &y_label,
                fmt_y: if self.log_y { fmt_axis_y_log } else { fmt_axis_y },
            };
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds, &labels);
        }
    }

    fn draw_legend(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let palette = group_palette(self.groups.len());
        let prefix = self.mode.group_prefix();

        let items: Vec<ListItem> = self
            .groups
            .iter()
            .zip(palette)
            .enumerate()
            .map(|(i, (group, (r, g, b)))| {
                let marker = if self.selected == Some(i) { "» " } else { "  " };
                let mut spans = vec![
                    Span::raw(marker),
                    Span::styled("■", Style::default().fg(Color::Rgb(r, g, b))),
                    Span::raw(format!(" {}", group.label(prefix))),
                ];
                if group.branches.is_empty() {
                    spans.push(Span::styled(" (1 pt)", Style::default().fg(Color::DarkGray)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let (r, g, b) = dim((255, 255, 255), REVERSE_DIM);
        let title = Line::from(vec![
            Span::raw("Groups "),
            Span::styled(Direction::Forward.label(LegendLanguage::En), Style::default().fg(Color::White)),
            Span::raw("/"),
            Span::styled(Direction::Reverse.label(LegendLanguage::En), Style::default().fg(Color::Rgb(r, g, b))),
        ]);

        let list = List::new(items).block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(list, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "m mode  l log-y  ←/→ group  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Cycle `All -> 0 -> 1 -> ... -> n-1 -> All` (or backwards for negative `delta`).
fn step_selection(current: Option<usize>, n: usize, delta: i32) -> Option<usize> {
    if n == 0 {
        return None;
    }
    // Position 0 is "all", 1..=n are the groups.
    let len = n as i64 + 1;
    let pos = current.map(|i| i as i64 + 1).unwrap_or(0);
    let next = (pos + delta as i64).rem_euclid(len);
    if next == 0 { None } else { Some(next as usize - 1) }
}

/// Build chart series for Plotters: one per drawn branch of the visible groups.
fn chart_series(
    groups: &[SweepGroup],
    selected: Option<usize>,
    log_y: bool,
) -> (Vec<ChartSeries>, [f64; 2], [f64; 2]) {
    let palette = group_palette(groups.len());

    let mut series = Vec::new();
    for (i, (group, color)) in groups.iter().zip(palette).enumerate() {
        if selected.is_some_and(|s| s != i) {
            continue;
        }
        for branch in &group.branches {
            let points: Vec<(f64, f64)> = branch
                .points()
                .into_iter()
                .filter_map(|(x, y)| match (log_y, y > 0.0) {
                    (false, _) => Some((x, y)),
                    (true, true) => Some((x, y.log10())),
                    (true, false) => None,
                })
                .collect();
            if points.is_empty() {
                continue;
            }
            let color = match branch.direction {
                Direction::Forward => color,
                Direction::Reverse => dim(color, REVERSE_DIM),
            };
            series.push(ChartSeries { points, color });
        }
    }

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in series.iter().flat_map(|s| s.points.iter()) {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if !x_min.is_finite() || !x_max.is_finite() {
        (x_min, x_max) = (0.0, 1.0);
    } else if x_max <= x_min {
        (x_min, x_max) = (x_min - 0.5, x_max + 0.5);
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        (y_min, y_max) = (0.0, 1.0);
    } else if y_max <= y_min {
        let half = (y_min.abs() * 0.5).max(1e-12);
        (y_min, y_max) = (y_min - half, y_max + half);
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-15);
    (series, [x_min, x_max], [y_min - pad, y_max + pad])
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.2}")
}

fn fmt_axis_y(v: f64) -> String {
    format!("{v:.1e}")
}

fn fmt_axis_y_log(v: f64) -> String {
    format!("{v:.1}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

struct AxisLabels<'a> {
    x: &'a str,
    y: &'a str,
    fmt_y: fn(f64) -> String,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 9,
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

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    labels: &AxisLabels<'_>,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_x(x_val);
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

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = (labels.fmt_y)(y_val);
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

    let x_label = Paragraph::new(labels.x)
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

    let y_label = Paragraph::new(labels.y).style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
