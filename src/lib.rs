//! `fet-sweeps` library crate.
//!
//! The binary (`fetview`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the sweep grouper/splitter is reusable on its own (see [`sweep`])
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod color;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod sweep;
pub mod tui;
