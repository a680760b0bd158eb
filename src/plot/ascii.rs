//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks of a merge in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - group `i` draws its forward branch with letter `a + i`
//! - and its reverse branch with the upper-case letter
//! - sample points overwrite connecting lines

use crate::domain::{Direction, LegendLanguage, PlotMode};
use crate::io::export::BranchFile;
use crate::sweep::SweepGroup;

/// Rendering options for [`render_ascii_plot`].
#[derive(Debug, Clone, Copy)]
pub struct AsciiPlotOptions {
    pub width: usize,
    pub height: usize,
    /// Plot `log10(y)`; non-positive responses are left out.
    pub log_y: bool,
    pub language: LegendLanguage,
}

impl Default for AsciiPlotOptions {
    fn default() -> Self {
        Self {
            width: 100,
            height: 25,
            log_y: false,
            language: LegendLanguage::En,
        }
    }
}

/// Groups beyond this many have no glyph left and are not drawn.
pub const MAX_PLOT_GROUPS: usize = 26;

struct Series {
    glyph: char,
    label: String,
    points: Vec<(f64, f64)>,
}

/// One group's label and branch points, whatever they were loaded from.
struct PlotGroup {
    label: String,
    branches: Vec<(Direction, Vec<(f64, f64)>)>,
}

/// Render every drawn branch of `groups` on one grid, followed by a legend.
pub fn render_ascii_plot(groups: &[SweepGroup], mode: PlotMode, options: &AsciiPlotOptions) -> String {
    let plot_groups: Vec<PlotGroup> = groups
        .iter()
        .map(|g| PlotGroup {
            label: g.label(mode.group_prefix()),
            branches: g.branches.iter().map(|b| (b.direction, b.points())).collect(),
        })
        .collect();
    render_groups(sweep_name(mode), &plot_groups, options)
}

/// Re-plot a branch JSON file written by `fetview export --json`.
pub fn render_ascii_plot_from_branch_file(file: &BranchFile, options: &AsciiPlotOptions) -> String {
    let plot_groups: Vec<PlotGroup> = file
        .groups
        .iter()
        .map(|g| PlotGroup {
            label: g.label.clone(),
            branches: g
                .branches
                .iter()
                .map(|b| (b.direction, b.points.iter().map(|&[x, y]| (x, y)).collect()))
                .collect(),
        })
        .collect();
    render_groups(&file.sweep_column, &plot_groups, options)
}

fn render_groups(sweep_name: &str, groups: &[PlotGroup], options: &AsciiPlotOptions) -> String {
    let width = options.width.max(10);
    let height = options.height.max(5);

    let series = collect_series(groups, options);
    let Some(((x_min, x_max), (y_min, y_max))) = bounds(&series) else {
        return "No branches to plot.\n".to_string();
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let to_cell = |(x, y): (f64, f64)| {
        (
            map_x(x, x_min, x_max, width),
            map_y(y, y_min, y_max, height),
        )
    };

    // Lines first so that sample points can overlay them.
    for s in &series {
        for pair in s.points.windows(2) {
            let (x0, y0) = to_cell(pair[0]);
            let (x1, y1) = to_cell(pair[1]);
            draw_line(&mut grid, x0, y0, x1, y1, s.glyph);
        }
    }
    for s in &series {
        for &p in &s.points {
            let (x, y) = to_cell(p);
            grid[y][x] = s.glyph;
        }
    }

    let y_name = if options.log_y { "log10 Isd" } else { "Isd" };
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {sweep_name}=[{x_min:.3}, {x_max:.3}] V | {y_name}=[{y_min:.3e}, {y_max:.3e}]"
    ));
    if groups.len() > MAX_PLOT_GROUPS {
        out.push_str(&format!(" | showing {MAX_PLOT_GROUPS} of {} groups", groups.len()));
    }
    out.push('\n');

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    for s in &series {
        out.push_str(&format!("{}  {}\n", s.glyph, s.label));
    }

    out
}

fn sweep_name(mode: PlotMode) -> &'static str {
    match mode {
        PlotMode::Output => "Vsd",
        PlotMode::Transfer => "Vbg",
    }
}

fn collect_series(groups: &[PlotGroup], options: &AsciiPlotOptions) -> Vec<Series> {
    let mut out = Vec::new();
    for (i, group) in groups.iter().enumerate().take(MAX_PLOT_GROUPS) {
        let base = group_glyph(i);
        for (direction, points) in &group.branches {
            let glyph = match direction {
                Direction::Forward => base,
                Direction::Reverse => base.to_ascii_uppercase(),
            };
            let points = points
                .iter()
                .filter_map(|&(x, y)| {
                    if !options.log_y {
                        Some((x, y))
                    } else if y > 0.0 {
                        Some((x, y.log10()))
                    } else {
                        None
                    }
                })
                .collect();
            out.push(Series {
                glyph,
                label: format!("{}V ({})", group.label, direction.label(options.language)),
                points,
            });
        }
    }
    out
}

fn group_glyph(index: usize) -> char {
    debug_assert!(index < MAX_PLOT_GROUPS);
    (b'a' + index as u8) as char
}

fn bounds(series: &[Series]) -> Option<((f64, f64), (f64, f64))> {
    let mut x = (f64::INFINITY, f64::NEG_INFINITY);
    let mut y = (f64::INFINITY, f64::NEG_INFINITY);
    for &(px, py) in series.iter().flat_map(|s| s.points.iter()) {
        x = (x.0.min(px), x.1.max(px));
        y = (y.0.min(py), y.1.max(py));
    }
    if !(x.0.is_finite() && x.1.is_finite() && y.0.is_finite() && y.1.is_finite()) {
        return None;
    }
    Some((widen_degenerate(x), widen_degenerate(y)))
}

fn widen_degenerate((min, max): (f64, f64)) -> (f64, f64) {
    if max > min { (min, max) } else { (min - 0.5, max + 0.5) }
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

/// Integer line drawing (Bresenham-ish); only fills blank cells.
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
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
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
    use crate::domain::{ColumnMap, Sample};
    use crate::sweep::sweep_groups;

    fn groups(points: &[(f64, f64)]) -> Vec<SweepGroup> {
        let samples: Vec<Sample> = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Sample {
                sweep_value: x,
                group_value: 0.0,
                response_value: y,
                sequence_index: i as u64,
            })
            .collect();
        sweep_groups(&samples, 2).unwrap()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let groups = groups(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 2.0), (0.0, 2.0)]);
        let options = AsciiPlotOptions {
            width: 10,
            height: 5,
            ..AsciiPlotOptions::default()
        };

        let txt = render_ascii_plot(&groups, PlotMode::Output, &options);
        let expected = concat!(
            "Plot: Vsd=[0.000, 2.000] V | Isd=[-1.000e-1, 2.100e0]\n",
            "AAAAAAAAaA\n",
            "      aa  \n",
            "    aa    \n",
            "  aa      \n",
            "aa        \n",
            "a  Vbg=0.00V (Fwd)\n",
            "A  Vbg=0.00V (Rev)\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn log_scale_drops_non_positive_currents() {
        let groups = groups(&[(0.0, 0.0), (1.0, 1e-9), (2.0, 1e-6), (1.0, 1e-8), (0.0, -1e-9)]);
        let options = AsciiPlotOptions {
            width: 20,
            height: 6,
            log_y: true,
            language: LegendLanguage::En,
        };

        let txt = render_ascii_plot(&groups, PlotMode::Transfer, &options);
        let header = txt.lines().next().unwrap();
        assert!(header.starts_with("Plot: Vbg=[1.000, 2.000] V | log10 Isd="), "{header}");
        assert!(txt.ends_with("a  Vsd=0.00V (Fwd)\nA  Vsd=0.00V (Rev)\n"));
    }

    #[test]
    fn glyphs_run_out_after_twenty_six_groups() {
        let samples: Vec<Sample> = (0..30)
            .flat_map(|g| [0.0, 1.0, 0.0].into_iter().map(move |x| (g, x)))
            .enumerate()
            .map(|(i, (g, x))| Sample {
                sweep_value: x,
                group_value: g as f64,
                response_value: x,
                sequence_index: i as u64,
            })
            .collect();
        let groups = sweep_groups(&samples, 2).unwrap();
        assert_eq!(groups.len(), 30);

        let txt = render_ascii_plot(&groups, PlotMode::Output, &AsciiPlotOptions::default());
        let header = txt.lines().next().unwrap();
        assert!(header.ends_with(" | showing 26 of 30 groups"), "{header}");

        let legend: Vec<&str> = txt.lines().skip(1 + 25).collect();
        assert_eq!(legend.len(), 52);
        let glyphs: std::collections::BTreeSet<char> = legend.iter().filter_map(|l| l.chars().next()).collect();
        assert_eq!(glyphs.len(), 52);
        assert_eq!(legend[51], "Z  Vbg=25.00V (Rev)");
    }

    #[test]
    fn branch_file_replots_the_same_picture() {
        let groups = groups(&[(0.0, 1e-9), (1.0, 2e-9), (2.0, 4e-9), (1.0, 3e-9), (0.0, 1e-9)]);
        let file = BranchFile::new(PlotMode::Output, &ColumnMap::default(), 2, &groups, LegendLanguage::Ja);
        let options = AsciiPlotOptions {
            width: 30,
            height: 8,
            ..AsciiPlotOptions::default()
        };

        assert_eq!(
            render_ascii_plot_from_branch_file(&file, &options),
            render_ascii_plot(&groups, PlotMode::Output, &options)
        );
    }

    #[test]
    fn nothing_to_draw() {
        let groups = groups(&[(1.0, 1.0)]);
        let txt = render_ascii_plot(&groups, PlotMode::Output, &AsciiPlotOptions::default());
        assert_eq!(txt, "No branches to plot.\n");
    }
}
