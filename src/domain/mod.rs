//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - plot configuration enums (`PlotMode`, `LegendLanguage`)
//! - ingested measurement rows (`Measurement`) and their per-mode projection (`Sample`)
//! - branch direction tags (`Direction`)
//! - the resolved run configuration (`RunConfig`)

pub mod types;

pub use types::*;
