//! Interactive measurement-file picker.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker provides the "run `fetview plot` and choose files" UX
//!
//! The picker searches for `*.dat`, `*.csv` and `*.txt` files under the
//! current working directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Default directory recursion depth for finding measurement files.
const DEFAULT_SEARCH_DEPTH: usize = 4;

/// Extensions accepted as measurement files.
pub const INPUT_EXTENSIONS: [&str; 3] = ["dat", "csv", "txt"];

/// Prompt the user to select one or more measurement files.
///
/// Behavior:
/// - list discovered files
/// - accept numbers (`2`, `1,3`, `2-5`), `all`, or an explicit path
/// - `q` cancels
///
/// Selected files are returned in list order, which is also merge order.
pub fn prompt_for_input_files() -> Result<Vec<PathBuf>, AppError> {
    let files = discover_input_files();
    if files.is_empty() {
        return Err(AppError::new(
            2,
            "No .dat/.csv/.txt files found. Pass files with `fetview plot <FILES>...`.",
        ));
    }

    println!("Found {} measurement file(s):", files.len());
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, pretty_path(path));
    }

    loop {
        print!(
            "Select files (e.g. 1,3 or 2-{} or all) or type a path (q to quit): ",
            files.len()
        );
        io::stdout()
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let bytes = io::stdin()
            .read_line(&mut input)
            .map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::new(
                2,
                "No input received. Pass files with `fetview plot <FILES>...`.",
            ));
        }

        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        if looks_like_selection(input) {
            match parse_selection(input, files.len()) {
                Ok(picked) => return Ok(picked.into_iter().map(|i| files[i].clone()).collect()),
                Err(msg) => {
                    println!("{msg}");
                    continue;
                }
            }
        }

        match validate_input_path(Path::new(input)) {
            Ok(path) => return Ok(vec![path]),
            Err(err) => {
                println!("{err}");
                continue;
            }
        }
    }
}

fn looks_like_selection(input: &str) -> bool {
    input.eq_ignore_ascii_case("all")
        || (!input.is_empty()
            && input
                .chars()
                .all(|c| c.is_ascii_digit() || c == ',' || c == '-' || c.is_whitespace()))
}

/// Parse `1,3`, `2-4`, `all` into zero-based indices (deduplicated, ascending).
pub fn parse_selection(input: &str, count: usize) -> Result<Vec<usize>, String> {
    if input.trim().eq_ignore_ascii_case("all") {
        return Ok((0..count).collect());
    }

    let parse_one = |s: &str| -> Result<usize, String> {
        let n: usize = s
            .trim()
            .parse()
            .map_err(|_| format!("Not a number: '{}'.", s.trim()))?;
        if (1..=count).contains(&n) {
            Ok(n - 1)
        } else {
            Err(format!("Invalid choice: {n}. Enter numbers between 1 and {count}."))
        }
    };

    let mut picked = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((a, b)) => {
                let (a, b) = (parse_one(a)?, parse_one(b)?);
                if a > b {
                    return Err(format!("Range {part} runs backwards."));
                }
                picked.extend(a..=b);
            }
            None => picked.push(parse_one(part)?),
        }
    }

    picked.sort_unstable();
    picked.dedup();
    if picked.is_empty() {
        return Err("Nothing selected.".to_string());
    }
    Ok(picked)
}

/// Validate the provided path points to a readable measurement file.
pub fn validate_input_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(2, format!("Input file not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if !has_input_extension(path) {
        return Err(AppError::new(
            2,
            format!("Expected a .dat, .csv or .txt file (got: {}).", path.display()),
        ));
    }

    Ok(path.to_path_buf())
}

fn has_input_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| INPUT_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// Discover measurement files under the current directory (deterministic order).
pub fn discover_input_files() -> Vec<PathBuf> {
    find_input_files(Path::new("."), DEFAULT_SEARCH_DEPTH)
}

fn find_input_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut out = Vec::new();
    find_input_files_inner(root, 0, max_depth, &mut out);
    out.sort_by(|a, b| pretty_path(a).cmp(&pretty_path(b)));
    out
}

fn find_input_files_inner(root: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }

    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };

        if file_type.is_dir() {
            if should_skip_dir(&path) {
                continue;
            }
            find_input_files_inner(&path, depth + 1, max_depth, out);
            continue;
        }

        if file_type.is_file() && has_input_extension(&path) {
            out.push(path);
        }
    }
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules")
}

fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}
