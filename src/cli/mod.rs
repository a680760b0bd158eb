//! Command-line parsing for the FET sweep viewer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the ingest/sweep/render code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_GROUP_DECIMALS, LegendLanguage, PlotMode};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "fetview",
    version,
    about = "Merge FET sweep measurements and plot forward/reverse branches"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Merge files into a workbook with a `Raw_Data` sheet only.
    Merge(MergeArgs),
    /// Merge files and add a `Graphs` sheet with one native chart per group.
    Export(ExportArgs),
    /// Print an ASCII preview of the sweep branches.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    Tui(InputArgs),
    /// Write synthetic output/transfer sweep files.
    Sample(SampleArgs),
}

/// Input files and how to read them (shared by all data commands).
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Measurement files, merged in the given order. Empty: pick interactively.
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Header name of the source-drain voltage column.
    #[arg(long, env = "FETVIEW_VSD", default_value = "Vsd")]
    pub vsd: String,

    /// Header name of the back-gate voltage column.
    #[arg(long, env = "FETVIEW_VBG", default_value = "Vbg")]
    pub vbg: String,

    /// Header name of the source-drain current column.
    #[arg(long, env = "FETVIEW_ISD", default_value = "Isd")]
    pub isd: String,

    /// `output`: Isd vs Vsd grouped by Vbg. `transfer`: Isd vs Vbg grouped by Vsd.
    #[arg(long, env = "FETVIEW_MODE", value_enum, default_value_t = PlotMode::Output)]
    pub mode: PlotMode,

    /// Decimal places used to round the grouping voltage.
    #[arg(long, env = "FETVIEW_DECIMALS", default_value_t = DEFAULT_GROUP_DECIMALS)]
    pub decimals: u32,
}

/// Options for `merge`.
#[derive(Debug, Args, Clone)]
pub struct MergeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output workbook (default: `Merged_<timestamp>.xlsx` next to the first input).
    #[arg(short = 'o', long, value_name = "XLSX")]
    pub output: Option<PathBuf>,
}

/// Options for `export`.
#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output workbook (default: `Merged_<timestamp>.xlsx` next to the first input).
    #[arg(short = 'o', long, value_name = "XLSX")]
    pub output: Option<PathBuf>,

    /// Series names in the chart legends.
    #[arg(long, env = "FETVIEW_LEGEND", value_enum, default_value_t = LegendLanguage::Ja)]
    pub legend: LegendLanguage,

    /// Also write the drawn branches as JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,

    /// Also write the drawn branches as long-format CSV.
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,
}

/// Options for `plot`.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Re-plot a branch JSON written by `export --json` instead of reading FILES.
    #[arg(long, value_name = "JSON")]
    pub branches: Option<PathBuf>,

    /// Plot log10 of the current (non-positive values are dropped).
    #[arg(long)]
    pub log_y: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for `sample`.
#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Directory to write the `.dat` files into.
    #[arg(long, value_name = "DIR", default_value = "sample_data")]
    pub out: PathBuf,

    /// Random seed for the measurement noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Samples per sweep (rising and falling half together).
    #[arg(long, default_value_t = 51)]
    pub points: usize,

    /// Held-constant steps per family.
    #[arg(long, default_value_t = 5)]
    pub steps: usize,

    /// Relative Gaussian noise on the current.
    #[arg(long, default_value_t = 0.02)]
    pub noise: f64,
}
