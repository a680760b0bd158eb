//! Terminal plot rendering.

pub mod ascii;

pub use ascii::{AsciiPlotOptions, MAX_PLOT_GROUPS, render_ascii_plot, render_ascii_plot_from_branch_file};
