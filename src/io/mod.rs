//! Input/output helpers.
//!
//! - measurement file ingest + merge (`ingest`)
//! - merged workbook with native charts (`workbook`)
//! - branch exports (JSON/CSV) (`export`)

pub mod export;
pub mod ingest;
pub mod workbook;

pub use export::*;
pub use ingest::*;
pub use workbook::*;
