//! Shared domain types.
//!
//! These types are intentionally kept small and `Copy` where possible so they can be:
//!
//! - produced once at ingest and re-projected for every plot mode
//! - exported to JSON/CSV
//! - passed to the terminal and spreadsheet renderers without cloning buffers

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Decimal places used to round the held-constant voltage into a group key.
pub const DEFAULT_GROUP_DECIMALS: u32 = 2;

/// Which characteristic to plot.
///
/// - `Output`: `Isd` vs `Vsd`, one series per `Vbg` step.
/// - `Transfer`: `Isd` vs `Vbg`, one series per `Vsd` step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlotMode {
    #[default]
    Output,
    Transfer,
}

impl PlotMode {
    pub fn toggle(self) -> Self {
        match self {
            PlotMode::Output => PlotMode::Transfer,
            PlotMode::Transfer => PlotMode::Output,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            PlotMode::Output => "Output Characteristics (Isd - Vsd)",
            PlotMode::Transfer => "Transfer Characteristics (Isd - Vbg)",
        }
    }

    /// Prefix used in group labels and chart titles (`Vbg=0.50`).
    pub fn group_prefix(self) -> &'static str {
        match self {
            PlotMode::Output => "Vbg",
            PlotMode::Transfer => "Vsd",
        }
    }

    /// Project an ingested row onto this mode's sweep/group/response axes.
    pub fn sample(self, m: &Measurement) -> Sample {
        let (sweep_value, group_value) = match self {
            PlotMode::Output => (m.vsd, m.vbg),
            PlotMode::Transfer => (m.vbg, m.vsd),
        };
        Sample {
            sweep_value,
            group_value,
            response_value: m.isd,
            sequence_index: m.sequence_index,
        }
    }
}

/// Legend wording for branch directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LegendLanguage {
    #[default]
    En,
    Ja,
}

/// Which half of a sweep a branch covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Sweep value rising.
    Forward,
    /// Sweep value falling.
    Reverse,
}

impl Direction {
    pub fn label(self, language: LegendLanguage) -> &'static str {
        match (self, language) {
            (Direction::Forward, LegendLanguage::En) => "Fwd",
            (Direction::Reverse, LegendLanguage::En) => "Rev",
            (Direction::Forward, LegendLanguage::Ja) => "順掃引",
            (Direction::Reverse, LegendLanguage::Ja) => "逆掃引",
        }
    }
}

/// User-facing header names for the three required columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub vsd: String,
    pub vbg: String,
    pub isd: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            vsd: "Vsd".to_string(),
            vbg: "Vbg".to_string(),
            isd: "Isd".to_string(),
        }
    }
}

impl ColumnMap {
    pub fn sweep_column(&self, mode: PlotMode) -> &str {
        match mode {
            PlotMode::Output => &self.vsd,
            PlotMode::Transfer => &self.vbg,
        }
    }

    pub fn group_column(&self, mode: PlotMode) -> &str {
        match mode {
            PlotMode::Output => &self.vbg,
            PlotMode::Transfer => &self.vsd,
        }
    }

    pub fn response_column(&self) -> &str {
        &self.isd
    }

    /// Columns in `[vsd, vbg, isd]` order.
    pub fn names(&self) -> [&str; 3] {
        [&self.vsd, &self.vbg, &self.isd]
    }
}

/// One merged measurement row with all three required columns present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub vsd: f64,
    pub vbg: f64,
    pub isd: f64,
    /// Position in the concatenation of all input files.
    pub sequence_index: u64,
}

/// A measurement projected for one plot mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub sweep_value: f64,
    pub group_value: f64,
    pub response_value: f64,
    pub sequence_index: u64,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub files: Vec<PathBuf>,
    pub columns: ColumnMap,
    pub mode: PlotMode,
    pub group_decimals: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_swap_sweep_and_group_axes() {
        let m = Measurement {
            vsd: 0.5,
            vbg: -10.0,
            isd: 1e-6,
            sequence_index: 7,
        };

        let out = PlotMode::Output.sample(&m);
        assert_eq!(out.sweep_value, 0.5);
        assert_eq!(out.group_value, -10.0);

        let tr = PlotMode::Transfer.sample(&m);
        assert_eq!(tr.sweep_value, -10.0);
        assert_eq!(tr.group_value, 0.5);
        assert_eq!(tr.response_value, 1e-6);
        assert_eq!(tr.sequence_index, 7);
    }

    #[test]
    fn column_map_follows_mode() {
        let cols = ColumnMap::default();
        assert_eq!(cols.sweep_column(PlotMode::Output), "Vsd");
        assert_eq!(cols.group_column(PlotMode::Output), "Vbg");
        assert_eq!(cols.sweep_column(PlotMode::Transfer), "Vbg");
        assert_eq!(cols.group_column(PlotMode::Transfer), "Vsd");
    }
}
