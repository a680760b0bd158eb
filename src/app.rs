//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - resolves input files (arguments or the interactive picker)
//! - merges files and builds sweep groups
//! - writes workbooks/exports or renders previews

use chrono::Local;
use clap::Parser;
use log::info;

use crate::cli::{Command, ExportArgs, InputArgs, MergeArgs, PlotArgs, SampleArgs};
use crate::domain::{ColumnMap, LegendLanguage, RunConfig};
use crate::error::AppError;
use crate::io::export::{BranchFile, read_branches_json, write_branches_csv, write_branches_json};
use crate::io::workbook::{GraphSheet, default_output_path, write_workbook};
use crate::plot::{AsciiPlotOptions, render_ascii_plot, render_ascii_plot_from_branch_file};

pub mod pipeline;

/// Entry point for the `fetview` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env file is the normal case.
    let _ = dotenvy::dotenv();

    // `fetview` and `fetview a.dat b.dat` behave like `fetview tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Merge(args) => handle_merge(args),
        Command::Export(args) => handle_export(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn handle_merge(args: MergeArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.input)?;
    let merged = pipeline::load(&config)?;

    let output = match args.output {
        Some(path) => path,
        None => default_output_path(&config.files[0], Local::now()),
    };
    write_workbook(&output, &merged, None)?;

    println!("{}", crate::report::format_merge_summary(&merged, &config.columns));
    println!("Wrote {}", output.display());
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.input)?;
    let run = pipeline::run_sweeps(&config)?;

    let output = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(&config.files[0], Local::now()),
    };
    let graphs = GraphSheet {
        mode: config.mode,
        groups: &run.groups,
        language: args.legend,
    };
    write_workbook(&output, &run.merged, Some(graphs))?;

    if let Some(path) = &args.json {
        let file = BranchFile::new(config.mode, &config.columns, config.group_decimals, &run.groups, args.legend);
        write_branches_json(path, &file)?;
        info!("wrote branch JSON {}", path.display());
    }
    if let Some(path) = &args.csv {
        write_branches_csv(path, &run.groups)?;
        info!("wrote branch CSV {}", path.display());
    }

    println!("{}", crate::report::format_merge_summary(&run.merged, &config.columns));
    println!("{}", crate::report::format_group_summary(&run.groups, config.mode));
    println!("Wrote {}", output.display());
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let options = AsciiPlotOptions {
        width: args.width,
        height: args.height,
        log_y: args.log_y,
        language: LegendLanguage::En,
    };

    // A saved branch dump replaces the input files.
    if let Some(path) = &args.branches {
        let file = read_branches_json(path)?;
        println!("{}", render_ascii_plot_from_branch_file(&file, &options));
        return Ok(());
    }

    let config = run_config_from_args(&args.input)?;
    let run = pipeline::run_sweeps(&config)?;
    println!("{}", render_ascii_plot(&run.groups, config.mode, &options));
    println!("{}", crate::report::format_group_summary(&run.groups, config.mode));
    Ok(())
}

fn handle_tui(args: InputArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let merged = pipeline::load(&config)?;
    crate::tui::run(merged, &config)
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let options = crate::data::SampleOptions {
        seed: args.seed,
        points: args.points,
        steps: args.steps,
        noise: args.noise,
        ..Default::default()
    };
    let paths = crate::data::generate_sweep_files(&args.out, &options)?;
    for path in &paths {
        println!("{}", path.display());
    }
    Ok(())
}

/// Resolve input files (falling back to the picker) and build the run config.
pub fn run_config_from_args(args: &InputArgs) -> Result<RunConfig, AppError> {
    let files = if args.files.is_empty() {
        crate::cli::picker::prompt_for_input_files()?
    } else {
        args.files.clone()
    };
    if args.decimals > 12 {
        return Err(AppError::new(2, format!("--decimals {} is out of range (0-12).", args.decimals)));
    }

    Ok(RunConfig {
        files,
        columns: ColumnMap {
            vsd: args.vsd.clone(),
            vbg: args.vbg.clone(),
            isd: args.isd.clone(),
        },
        mode: args.mode,
        group_decimals: args.decimals,
    })
}

/// Rewrite argv so `fetview` defaults to `fetview tui`.
///
/// Rules:
/// - `fetview`                      -> `fetview tui`
/// - `fetview a.dat --mode transfer` -> `fetview tui a.dat --mode transfer`
/// - `fetview --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "merge" | "export" | "plot" | "tui" | "sample");
    if is_subcommand {
        return argv;
    }

    // Flags or file paths: treat as "tui" arguments.
    argv.insert(1, "tui".to_string());
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PlotMode;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(argv(&["fetview"])), argv(&["fetview", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["fetview", "a.dat", "--mode", "transfer"])),
            argv(&["fetview", "tui", "a.dat", "--mode", "transfer"])
        );
        assert_eq!(rewrite_args(argv(&["fetview", "--help"])), argv(&["fetview", "--help"]));
        assert_eq!(rewrite_args(argv(&["fetview", "plot", "a.dat"])), argv(&["fetview", "plot", "a.dat"]));
    }

    #[test]
    fn config_keeps_file_order_and_columns() {
        let args = InputArgs {
            files: vec!["b.dat".into(), "a.dat".into()],
            vsd: "Vd".to_string(),
            vbg: "Vg".to_string(),
            isd: "Id".to_string(),
            mode: PlotMode::Transfer,
            decimals: 1,
        };
        let config = run_config_from_args(&args).unwrap();
        assert_eq!(config.files, vec![std::path::PathBuf::from("b.dat"), "a.dat".into()]);
        assert_eq!(config.columns.names(), ["Vd", "Vg", "Id"]);
        assert_eq!(config.group_decimals, 1);

        let bad = InputArgs { decimals: 40, ..args };
        assert_eq!(run_config_from_args(&bad).unwrap_err().exit_code(), 2);
    }
}
