//! Shared "load and group" logic used by every front-end.
//!
//! The workbook writer, the exports, the ASCII plot and the TUI all start from
//! the same two steps: merge the input files, then group and split the sweeps.

use crate::domain::{PlotMode, RunConfig};
use crate::error::AppError;
use crate::io::ingest::{MergedData, merge_sources};
use crate::sweep::{SweepGroup, sweep_groups};

/// Merged input plus the sweep groups for the configured mode.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub merged: MergedData,
    pub groups: Vec<SweepGroup>,
}

/// Merge the configured input files.
pub fn load(config: &RunConfig) -> Result<MergedData, AppError> {
    merge_sources(&config.files, &config.columns)
}

/// Group and split merged data for one mode.
pub fn group_merged(merged: &MergedData, mode: PlotMode, decimals: u32) -> Result<Vec<SweepGroup>, AppError> {
    Ok(sweep_groups(&merged.samples(mode), decimals)?)
}

/// Merge, then group for `config.mode`.
pub fn run_sweeps(config: &RunConfig) -> Result<RunOutput, AppError> {
    let merged = load(config)?;
    let groups = group_merged(&merged, config.mode, config.group_decimals)?;
    Ok(RunOutput { merged, groups })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ColumnMap;

    #[test]
    fn same_files_two_modes() {
        let dir = std::env::temp_dir().join(format!("fet_sweeps_pipeline_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("family.csv");
        // Two output sweeps at Vbg = 0 and 10.
        std::fs::write(
            &path,
            "Vsd,Vbg,Isd\n0,0,0\n1,0,1\n0,0,0\n0,10,0\n1,10,2\n0,10,0\n",
        )
        .unwrap();

        let config = RunConfig {
            files: vec![path],
            columns: ColumnMap::default(),
            mode: PlotMode::Output,
            group_decimals: 2,
        };
        let run = run_sweeps(&config).unwrap();
        assert_eq!(run.groups.len(), 2);
        assert!(run.groups.iter().all(|g| g.branches.len() == 2));

        let transfer = group_merged(&run.merged, PlotMode::Transfer, 2).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(transfer.len(), 2);
        assert_eq!(transfer[0].label("Vsd"), "Vsd=0.00");
        assert_eq!(transfer[0].samples.len(), 4);
    }

    #[test]
    fn no_rows_is_exit_code_three() {
        let dir = std::env::temp_dir().join(format!("fet_sweeps_pipeline_empty_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.csv");
        std::fs::write(&path, "Vsd,Vbg,Isd\n1,x,2\n").unwrap();

        let config = RunConfig {
            files: vec![path],
            columns: ColumnMap::default(),
            mode: PlotMode::Output,
            group_decimals: 2,
        };
        let err = run_sweeps(&config).unwrap_err();
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.message(), "No valid data found.");
    }
}
