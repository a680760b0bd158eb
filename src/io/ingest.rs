//! Measurement file ingest and merge.
//!
//! This module turns a list of heterogeneous instrument exports (`.dat`, `.csv`,
//! `.txt`) into one ordered list of `Measurement`s.
//!
//! Design goals:
//! - **Tolerant parsing** (delimiter sniffing, header row inserted when missing)
//! - **File-level skipping** (a file without the mapped columns is reported, not fatal)
//! - **Row-level filtering** (rows with a missing/non-numeric required cell are dropped)
//! - **Deterministic order** (files merge in argument order even when parsed in parallel)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::domain::{ColumnMap, Measurement, PlotMode, Sample};
use crate::error::AppError;

/// Substrings that mark the first row as a header row.
pub const HEADER_KEYWORDS: [&str; 7] = ["isd", "vsd", "vbg", "no.", "id", "vg", "vd"];

/// Header inserted when a file starts directly with data.
pub const DEFAULT_HEADERS: [&str; 6] = ["No.", "Temp", "Mag", "Isd", "Vsd", "Vbg"];

/// How many leading cells are inspected for header keywords.
const HEADER_PROBE_CELLS: usize = 10;

/// Field separator detected for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
    Semicolon,
    /// Runs of spaces/tabs, as written by most instrument loggers.
    Whitespace,
}

impl Delimiter {
    fn byte(self) -> Option<u8> {
        match self {
            Delimiter::Tab => Some(b'\t'),
            Delimiter::Comma => Some(b','),
            Delimiter::Semicolon => Some(b';'),
            Delimiter::Whitespace => None,
        }
    }
}

/// One parsed input file, kept verbatim for the merged `Raw_Data` sheet.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub path: PathBuf,
    pub delimiter: Delimiter,
    /// True when the file had no header row and `DEFAULT_HEADERS` were used.
    pub header_inserted: bool,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    /// Number of columns occupied when written side by side with other files.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// A file left out of the merge, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Counters reported after a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub files_read: usize,
    pub files_used: usize,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Merge output: kept source tables (filtered to kept rows) + measurements + report.
#[derive(Debug, Clone)]
pub struct MergedData {
    pub sources: Vec<SourceTable>,
    pub measurements: Vec<Measurement>,
    pub skipped: Vec<SkippedFile>,
    pub stats: MergeStats,
}

impl MergedData {
    /// Project every measurement onto `mode`'s axes.
    pub fn samples(&self, mode: PlotMode) -> Vec<Sample> {
        self.measurements.iter().map(|m| mode.sample(m)).collect()
    }
}

/// Read and merge `paths` in order.
///
/// Files are parsed on the rayon pool; the merge itself is sequential so that
/// `sequence_index` follows argument order then row order.
pub fn merge_sources(paths: &[PathBuf], columns: &ColumnMap) -> Result<MergedData, AppError> {
    if paths.is_empty() {
        return Err(AppError::new(2, "No input files given."));
    }

    let parsed: Vec<Result<SourceTable, AppError>> = paths.par_iter().map(|p| load_source(p)).collect();

    let mut sources = Vec::new();
    let mut measurements = Vec::new();
    let mut skipped = Vec::new();
    let mut stats = MergeStats::default();
    let mut next_index = 0u64;

    for result in parsed {
        let mut table = result?;
        stats.files_read += 1;
        stats.rows_read += table.rows.len();

        let idx = match resolve_columns(&table.headers, columns) {
            Ok(idx) => idx,
            Err(reason) => {
                warn!("skipping {}: {reason}", table.path.display());
                skipped.push(SkippedFile {
                    path: table.path.clone(),
                    reason,
                });
                continue;
            }
        };

        let total = table.rows.len();
        let mut kept_rows = Vec::with_capacity(total);
        for row in std::mem::take(&mut table.rows) {
            let Some([vsd, vbg, isd]) = coerce_row(&row, idx) else {
                continue;
            };
            measurements.push(Measurement {
                vsd,
                vbg,
                isd,
                sequence_index: next_index,
            });
            next_index += 1;
            kept_rows.push(row);
        }

        debug!(
            "{}: kept {}/{} rows (delimiter {:?}, header inserted: {})",
            table.path.display(),
            kept_rows.len(),
            total,
            table.delimiter,
            table.header_inserted
        );

        stats.files_used += 1;
        stats.rows_used += kept_rows.len();
        table.rows = kept_rows;
        sources.push(table);
    }

    if measurements.is_empty() {
        return Err(AppError::new(3, "No valid data found."));
    }

    info!(
        "merged {} of {} file(s), {} point(s)",
        stats.files_used, stats.files_read, stats.rows_used
    );

    Ok(MergedData {
        sources,
        measurements,
        skipped,
        stats,
    })
}

/// Read a single measurement file from disk.
pub fn load_source(path: &Path) -> Result<SourceTable, AppError> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::new(2, format!("Failed to read '{}': {e}", path.display())))?;
    // Non-UTF-8 header bytes are replaced; numeric cells are plain ASCII.
    let text = String::from_utf8_lossy(&bytes);
    parse_source(path, &text)
}

/// Parse file contents into a `SourceTable`.
pub fn parse_source(path: &Path, text: &str) -> Result<SourceTable, AppError> {
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = sniff_delimiter(text);
    let mut records = read_records(text, delimiter)
        .map_err(|e| AppError::new(2, format!("Failed to parse '{}': {e}", path.display())))?;

    let header_inserted = match records.first() {
        Some(first) => !looks_like_header(first),
        None => false,
    };

    let headers = if records.is_empty() {
        Vec::new()
    } else if header_inserted {
        let width = records.iter().map(Vec::len).max().unwrap_or(0);
        default_headers(width)
    } else {
        records
            .remove(0)
            .into_iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect()
    };

    Ok(SourceTable {
        path: path.to_path_buf(),
        delimiter,
        header_inserted,
        headers,
        rows: records,
    })
}

/// Pick a delimiter from the first non-blank line.
pub fn sniff_delimiter(text: &str) -> Delimiter {
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if line.contains('\t') {
        Delimiter::Tab
    } else if line.contains(',') {
        Delimiter::Comma
    } else if line.contains(';') {
        Delimiter::Semicolon
    } else {
        Delimiter::Whitespace
    }
}

fn read_records(text: &str, delimiter: Delimiter) -> Result<Vec<Vec<String>>, csv::Error> {
    let Some(byte) = delimiter.byte() else {
        return Ok(text
            .lines()
            .map(|line| line.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|cells| !cells.is_empty())
            .collect());
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(byte)
        .from_reader(text.as_bytes());

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        out.push(record.iter().map(str::to_string).collect());
    }
    Ok(out)
}

/// True when any header keyword appears in the first cells of `row`.
pub fn looks_like_header(row: &[String]) -> bool {
    let probe = row
        .iter()
        .take(HEADER_PROBE_CELLS)
        .map(|c| c.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    HEADER_KEYWORDS.iter().any(|k| probe.contains(k))
}

fn default_headers(width: usize) -> Vec<String> {
    (0..width.max(DEFAULT_HEADERS.len()))
        .map(|i| match DEFAULT_HEADERS.get(i) {
            Some(name) => name.to_string(),
            None => format!("Column{}", i + 1),
        })
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn build_header_map(headers: &[String]) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

/// Resolve the `[vsd, vbg, isd]` column indices, or describe what is missing.
fn resolve_columns(headers: &[String], columns: &ColumnMap) -> Result<[usize; 3], String> {
    let header_map = build_header_map(headers);
    let names = columns.names();

    let mut idx = [0usize; 3];
    let mut missing = Vec::new();
    for (slot, name) in idx.iter_mut().zip(names) {
        match header_map.get(&normalize_header_name(name)) {
            Some(&i) => *slot = i,
            None => missing.push(format!("`{name}`")),
        }
    }

    if missing.is_empty() {
        Ok(idx)
    } else {
        Err(format!("missing column(s): {}", missing.join(", ")))
    }
}

fn coerce_row(row: &[String], idx: [usize; 3]) -> Option<[f64; 3]> {
    let cell = |i: usize| parse_f64(row.get(i)?);
    Some([cell(idx[0])?, cell(idx[1])?, cell(idx[2])?])
}

/// Parse a numeric cell; empty, non-numeric and non-finite cells are `None`.
pub fn parse_f64(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> SourceTable {
        parse_source(Path::new("mem.dat"), text).unwrap()
    }

    #[test]
    fn sniffs_common_delimiters() {
        assert_eq!(sniff_delimiter("\n\na\tb\n"), Delimiter::Tab);
        assert_eq!(sniff_delimiter("Vsd,Vbg,Isd\n"), Delimiter::Comma);
        assert_eq!(sniff_delimiter("Vsd;Vbg;Isd\n"), Delimiter::Semicolon);
        assert_eq!(sniff_delimiter("1   2.0   3e-9\n"), Delimiter::Whitespace);
    }

    #[test]
    fn keeps_existing_header_row() {
        let table = parse("\u{feff} No. , Vsd ,Vbg,Isd\n1,0.0,10,1e-9\n2,0.1,10,2e-9\n");
        assert!(!table.header_inserted);
        assert_eq!(table.headers, vec!["No.", "Vsd", "Vbg", "Isd"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["2", "0.1", "10", "2e-9"]);
    }

    #[test]
    fn inserts_default_header_when_missing() {
        let table = parse("1  300  0  1.0e-9  0.00  10\n2  300  0  2.0e-9  0.10  10  extra\n");
        assert!(table.header_inserted);
        assert_eq!(
            table.headers,
            vec!["No.", "Temp", "Mag", "Isd", "Vsd", "Vbg", "Column7"]
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.width(), 7);
    }

    #[test]
    fn header_detection_is_case_insensitive() {
        let row: Vec<String> = ["Time", "ID(A)", "VG(V)"].iter().map(|s| s.to_string()).collect();
        assert!(looks_like_header(&row));
        let row: Vec<String> = ["1", "2.5", "-3e-9"].iter().map(|s| s.to_string()).collect();
        assert!(!looks_like_header(&row));
    }

    #[test]
    fn resolves_columns_ignoring_case() {
        let headers: Vec<String> = ["no.", "ISD", "vsd", "VBG"].iter().map(|s| s.to_string()).collect();
        assert_eq!(resolve_columns(&headers, &ColumnMap::default()), Ok([2, 3, 1]));

        let headers: Vec<String> = ["Vsd", "Id"].iter().map(|s| s.to_string()).collect();
        let err = resolve_columns(&headers, &ColumnMap::default()).unwrap_err();
        assert_eq!(err, "missing column(s): `Vbg`, `Isd`");
    }

    #[test]
    fn coercion_drops_incomplete_rows() {
        let row = |cells: &[&str]| cells.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(coerce_row(&row(&["0.1", "10", "1e-9"]), [0, 1, 2]), Some([0.1, 10.0, 1e-9]));
        assert_eq!(coerce_row(&row(&["0.1", "", "1e-9"]), [0, 1, 2]), None);
        assert_eq!(coerce_row(&row(&["0.1", "n/a", "1e-9"]), [0, 1, 2]), None);
        assert_eq!(coerce_row(&row(&["0.1", "inf", "1e-9"]), [0, 1, 2]), None);
        assert_eq!(coerce_row(&row(&["0.1", "10"]), [0, 1, 2]), None);
    }

    #[test]
    fn merge_orders_files_and_skips_unusable_ones() {
        let dir = std::env::temp_dir().join(format!("fet_sweeps_ingest_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let a = dir.join("a.csv");
        let b = dir.join("b.txt");
        let c = dir.join("c.csv");
        fs::write(&a, "Vsd,Vbg,Isd\n0.0,0,1e-9\n0.5,0,oops\n1.0,0,3e-9\n").unwrap();
        fs::write(&b, "Time,Current,Id\n1,2,3\n").unwrap();
        fs::write(&c, "1\t300\t0\t5e-9\t0.0\t10\n").unwrap();

        let merged = merge_sources(&[a.clone(), b.clone(), c.clone()], &ColumnMap::default()).unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(
            merged.stats,
            MergeStats {
                files_read: 3,
                files_used: 2,
                rows_read: 5,
                rows_used: 3,
            }
        );
        assert_eq!(merged.skipped.len(), 1);
        assert_eq!(merged.skipped[0].path, b);

        let seq: Vec<u64> = merged.measurements.iter().map(|m| m.sequence_index).collect();
        assert_eq!(seq, vec![0, 1, 2]);
        assert_eq!(merged.measurements[2].isd, 5e-9);
        assert_eq!(merged.measurements[2].vbg, 10.0);
        assert_eq!(merged.sources[0].rows.len(), 2);
        assert!(merged.sources[1].header_inserted);
    }

    #[test]
    fn merge_without_usable_rows_is_an_error() {
        let dir = std::env::temp_dir().join(format!("fet_sweeps_empty_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let a = dir.join("a.csv");
        fs::write(&a, "Vsd,Vbg,Isd\n,,\nx,y,z\n").unwrap();

        let err = merge_sources(&[a], &ColumnMap::default()).unwrap_err();
        fs::remove_dir_all(&dir).ok();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "No valid data found.");
    }
}
