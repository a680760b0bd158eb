//! Merged `.xlsx` workbook with native scatter charts.
//!
//! Layout:
//! - `Raw_Data`: every kept input file side by side (header row + kept rows),
//!   one empty column between files.
//! - `Graphs` (optional): per group a data block (`{prefix}={key}`, `X`/`Y`,
//!   the group's points) and a smoothed scatter chart with one series per
//!   drawn branch. Series reference the block's rows, so editing the data in
//!   Excel updates the chart.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::info;
use rust_xlsxwriter::{
    Chart, ChartAxisCrossing, ChartAxisTickType, ChartFormat, ChartLegendPosition, ChartLine, ChartMarker,
    ChartMarkerType, ChartSolidFill, ChartType, Color, Workbook, Worksheet, XlsxError,
};

use crate::domain::{Direction, LegendLanguage, PlotMode};
use crate::error::AppError;
use crate::io::ingest::{MergedData, SourceTable, parse_f64};
use crate::sweep::SweepGroup;

pub const RAW_SHEET: &str = "Raw_Data";
pub const GRAPH_SHEET: &str = "Graphs";

const FORWARD_COLOR: u32 = 0x0070C0;
const REVERSE_COLOR: u32 = 0xED7D31;

/// Both axes cross the other at this value.
const AXIS_CROSSING: f64 = -200.0;

/// Chart geometry in points; converted to pixels at 96 dpi.
const CHART_LEFT_PT: f64 = 200.0;
const CHART_TOP_PT: f64 = 10.0;
const CHART_WIDTH_PT: f64 = 350.0;
const CHART_HEIGHT_PT: f64 = 250.0;
const CHART_PITCH_PT: f64 = 260.0;

/// Excel's default cell size in pixels.
const DEFAULT_COL_WIDTH_PX: u32 = 64;
const DEFAULT_ROW_HEIGHT_PX: u32 = 20;

/// Rows left blank between two group blocks on the `Graphs` sheet.
const BLOCK_GAP_ROWS: u32 = 5;

/// What to draw on the `Graphs` sheet.
#[derive(Debug, Clone, Copy)]
pub struct GraphSheet<'a> {
    pub mode: PlotMode,
    pub groups: &'a [SweepGroup],
    pub language: LegendLanguage,
}

/// Default merged workbook path: `Merged_YYYYmmdd_HHMMSS.xlsx` beside the first input.
pub fn default_output_path(first_input: &Path, now: DateTime<Local>) -> PathBuf {
    let dir = first_input.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!("Merged_{}.xlsx", now.format("%Y%m%d_%H%M%S")))
}

/// Write the merged workbook, with charts when `graphs` is given.
pub fn write_workbook(path: &Path, merged: &MergedData, graphs: Option<GraphSheet<'_>>) -> Result<(), AppError> {
    let wrap = |e: XlsxError| AppError::new(4, format!("Failed to write workbook '{}': {e}", path.display()));

    let mut workbook = Workbook::new();
    write_raw_sheet(workbook.add_worksheet(), &merged.sources).map_err(wrap)?;
    if let Some(graphs) = graphs {
        write_graph_sheet(workbook.add_worksheet(), &graphs).map_err(wrap)?;
    }
    workbook.save(path).map_err(wrap)?;

    info!(
        "wrote {} ({} source file(s){})",
        path.display(),
        merged.sources.len(),
        graphs
            .map(|g| format!(", {} chart(s)", g.groups.iter().filter(|x| !x.branches.is_empty()).count()))
            .unwrap_or_default()
    );
    Ok(())
}

fn write_raw_sheet(sheet: &mut Worksheet, sources: &[SourceTable]) -> Result<(), XlsxError> {
    sheet.set_name(RAW_SHEET)?;

    for (source, first_col) in sources.iter().zip(raw_column_offsets(sources)) {
        for (c, header) in source.headers.iter().enumerate() {
            sheet.write_string(0, first_col + c as u16, header)?;
        }
        for (r, row) in source.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                write_cell(sheet, r as u32 + 1, first_col + c as u16, cell)?;
            }
        }
    }
    Ok(())
}

/// First `Raw_Data` column of each source; one empty column separates files.
fn raw_column_offsets(sources: &[SourceTable]) -> Vec<u16> {
    let mut offsets = Vec::with_capacity(sources.len());
    let mut next: u16 = 0;
    for source in sources {
        offsets.push(next);
        next += source.width() as u16 + 1;
    }
    offsets
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &str) -> Result<(), XlsxError> {
    if cell.is_empty() {
        return Ok(());
    }
    match parse_f64(cell) {
        Some(v) => sheet.write_number(row, col, v)?,
        None => sheet.write_string(row, col, cell)?,
    };
    Ok(())
}

/// Worksheet rows of one drawn branch (inclusive, zero-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeriesRows {
    direction: Direction,
    first: u32,
    last: u32,
}

/// Where one group lands on the `Graphs` sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GroupBlock {
    title_row: u32,
    data_row: u32,
    series: Vec<SeriesRows>,
    /// `None` when the group has no drawable branch.
    chart: Option<ChartAnchor>,
}

/// Lay out every group's data block and chart.
///
/// Chart `i` always sits at pitch slot `i`, so a group without a chart leaves
/// its slot empty instead of shifting later charts off their data.
fn graph_layout(groups: &[SweepGroup]) -> Vec<GroupBlock> {
    let mut title_row: u32 = 0;
    groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let data_row = title_row + 2;
            let series: Vec<SeriesRows> = group
                .branches
                .iter()
                .map(|b| SeriesRows {
                    direction: b.direction,
                    first: data_row + b.first as u32,
                    last: data_row + b.last as u32,
                })
                .collect();
            let chart = (!series.is_empty()).then(|| chart_anchor(i));

            let block = GroupBlock {
                title_row,
                data_row,
                series,
                chart,
            };
            title_row = data_row + group.samples.len() as u32 + BLOCK_GAP_ROWS;
            block
        })
        .collect()
}

fn write_graph_sheet(sheet: &mut Worksheet, graphs: &GraphSheet<'_>) -> Result<(), XlsxError> {
    sheet.set_name(GRAPH_SHEET)?;

    for (group, block) in graphs.groups.iter().zip(graph_layout(graphs.groups)) {
        let title = group.label(graphs.mode.group_prefix());
        sheet.write_string(block.title_row, 0, &title)?;
        sheet.write_string(block.title_row + 1, 0, "X")?;
        sheet.write_string(block.title_row + 1, 1, "Y")?;

        for (offset, s) in group.samples.iter().enumerate() {
            let row = block.data_row + offset as u32;
            sheet.write_number(row, 0, s.sweep_value)?;
            sheet.write_number(row, 1, s.response_value)?;
        }

        // A chart without series is rejected on save.
        let Some(anchor) = block.chart else {
            continue;
        };
        let chart = group_chart(group, &block.series, &title, graphs.language);
        sheet.insert_chart_with_offset(anchor.row, anchor.col, &chart, anchor.x_offset, anchor.y_offset)?;
    }
    Ok(())
}

fn group_chart(group: &SweepGroup, series: &[SeriesRows], title: &str, language: LegendLanguage) -> Chart {
    let mut chart = Chart::new(ChartType::ScatterSmoothWithMarkers);
    chart.title().set_name(title);
    chart
        .set_width(pt_to_px(CHART_WIDTH_PT))
        .set_height(pt_to_px(CHART_HEIGHT_PT));

    for rows in series {
        let color = branch_color(rows.direction);

        chart
            .add_series()
            .set_name(rows.direction.label(language))
            .set_categories((GRAPH_SHEET, rows.first, 0, rows.last, 0))
            .set_values((GRAPH_SHEET, rows.first, 1, rows.last, 1))
            .set_format(ChartFormat::new().set_line(ChartLine::new().set_color(color).set_width(1.5)))
            .set_marker(
                ChartMarker::new()
                    .set_type(ChartMarkerType::Circle)
                    .set_size(5)
                    .set_format(
                        ChartFormat::new()
                            .set_solid_fill(ChartSolidFill::new().set_color(color))
                            .set_border(ChartLine::new().set_color(color)),
                    ),
            );
    }

    let axis_line = ChartLine::new().set_color(Color::Black).clone();

    let x_axis = chart.x_axis();
    x_axis
        .set_major_gridlines(false)
        .set_major_tick_type(ChartAxisTickType::Inside)
        .set_crossing(ChartAxisCrossing::AxisValue(AXIS_CROSSING))
        .set_num_format("General")
        .set_format(ChartFormat::new().set_line(&axis_line));
    let (x_min, x_max) = group.sweep_range();
    if x_max > x_min {
        x_axis.set_min(x_min).set_max(x_max);
    }

    chart
        .y_axis()
        .set_major_gridlines(false)
        .set_major_tick_type(ChartAxisTickType::Inside)
        .set_crossing(ChartAxisCrossing::AxisValue(AXIS_CROSSING))
        .set_num_format("0.00E+00")
        .set_format(ChartFormat::new().set_line(&axis_line));

    chart
        .plot_area()
        .set_format(ChartFormat::new().set_border(ChartLine::new().set_color(Color::Black).set_width(1.0)));
    chart.chart_area().set_format(ChartFormat::new().set_no_border());
    chart.legend().set_position(ChartLegendPosition::Top);

    chart
}

fn branch_color(direction: Direction) -> Color {
    match direction {
        Direction::Forward => Color::RGB(FORWARD_COLOR),
        Direction::Reverse => Color::RGB(REVERSE_COLOR),
    }
}

fn pt_to_px(pt: f64) -> u32 {
    (pt * 96.0 / 72.0).round() as u32
}

/// Cell + pixel offset where the `index`-th chart's top-left corner goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChartAnchor {
    row: u32,
    col: u16,
    x_offset: u32,
    y_offset: u32,
}

fn chart_anchor(index: usize) -> ChartAnchor {
    let left = pt_to_px(CHART_LEFT_PT);
    let top = pt_to_px(CHART_TOP_PT + CHART_PITCH_PT * index as f64);
    ChartAnchor {
        row: top / DEFAULT_ROW_HEIGHT_PX,
        col: (left / DEFAULT_COL_WIDTH_PX) as u16,
        x_offset: left % DEFAULT_COL_WIDTH_PX,
        y_offset: top % DEFAULT_ROW_HEIGHT_PX,
    }
}
