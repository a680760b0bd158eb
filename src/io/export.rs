//! Branch exports (JSON and long-format CSV).
//!
//! These carry exactly what the renderers draw: one `(x, y)` list per drawn
//! branch, tagged with its group and direction. One-point halves are never
//! included.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{ColumnMap, Direction, LegendLanguage, PlotMode};
use crate::error::AppError;
use crate::sweep::SweepGroup;

/// The branch JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchFile {
    pub tool: String,
    pub mode: PlotMode,
    pub sweep_column: String,
    pub group_column: String,
    pub response_column: String,
    pub group_decimals: u32,
    pub groups: Vec<GroupRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub key: f64,
    pub label: String,
    pub turn_index: usize,
    pub branches: Vec<BranchRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRecord {
    pub direction: Direction,
    pub label: String,
    pub points: Vec<[f64; 2]>,
}

impl BranchFile {
    pub fn new(
        mode: PlotMode,
        columns: &ColumnMap,
        group_decimals: u32,
        groups: &[SweepGroup],
        language: LegendLanguage,
    ) -> Self {
        let groups = groups
            .iter()
            .map(|g| GroupRecord {
                key: g.key.value(),
                label: g.label(mode.group_prefix()),
                turn_index: g.turn_index,
                branches: g
                    .branches
                    .iter()
                    .map(|b| BranchRecord {
                        direction: b.direction,
                        label: b.direction.label(language).to_string(),
                        points: b.points().into_iter().map(|(x, y)| [x, y]).collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            tool: "fetview".to_string(),
            mode,
            sweep_column: columns.sweep_column(mode).to_string(),
            group_column: columns.group_column(mode).to_string(),
            response_column: columns.response_column().to_string(),
            group_decimals,
            groups,
        }
    }
}

/// Write a branch JSON file.
pub fn write_branches_json(path: &Path, file: &BranchFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create branch JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(4, format!("Failed to write branch JSON: {e}")))?;
    Ok(())
}

/// Read a branch JSON file.
pub fn read_branches_json(path: &Path) -> Result<BranchFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open branch JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid branch JSON: {e}")))
}

/// Write drawn branches in long format: `group,direction,sequence_index,x,y`.
pub fn write_branches_csv(path: &Path, groups: &[SweepGroup]) -> Result<(), AppError> {
    let wrap = |e: csv::Error| AppError::new(4, format!("Failed to write branch CSV '{}': {e}", path.display()));

    let mut writer = csv::Writer::from_path(path).map_err(wrap)?;
    writer
        .write_record(["group", "direction", "sequence_index", "x", "y"])
        .map_err(wrap)?;

    for group in groups {
        let key = group.key.to_string();
        for branch in &group.branches {
            let direction = match branch.direction {
                Direction::Forward => "forward",
                Direction::Reverse => "reverse",
            };
            for s in &branch.samples {
                let seq = s.sequence_index.to_string();
                let x = s.sweep_value.to_string();
                let y = s.response_value.to_string();
                writer
                    .write_record([key.as_str(), direction, seq.as_str(), x.as_str(), y.as_str()])
                    .map_err(wrap)?;
            }
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush branch CSV '{}': {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sample;
    use crate::sweep::sweep_groups;

    fn groups() -> Vec<SweepGroup> {
        let values = [0.0, 1.0, 2.0, 1.0, 0.0];
        let samples: Vec<Sample> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample {
                sweep_value: v,
                group_value: 0.5,
                response_value: v * 1e-6,
                sequence_index: i as u64,
            })
            .collect();
        sweep_groups(&samples, 2).unwrap()
    }

    #[test]
    fn json_document_shape() {
        let file = BranchFile::new(PlotMode::Output, &ColumnMap::default(), 2, &groups(), LegendLanguage::En);
        let value = serde_json::to_value(&file).unwrap();

        assert_eq!(value["mode"], "output");
        assert_eq!(value["sweep_column"], "Vsd");
        assert_eq!(value["group_column"], "Vbg");
        assert_eq!(value["groups"][0]["label"], "Vbg=0.50");
        assert_eq!(value["groups"][0]["turn_index"], 2);
        assert_eq!(value["groups"][0]["branches"][0]["direction"], "forward");
        assert_eq!(value["groups"][0]["branches"][1]["label"], "Rev");
        assert_eq!(value["groups"][0]["branches"][1]["points"][0][0], 2.0);
    }

    #[test]
    fn json_reads_back() {
        let path = std::env::temp_dir().join(format!("fet_sweeps_branches_{}.json", std::process::id()));
        let file = BranchFile::new(PlotMode::Transfer, &ColumnMap::default(), 2, &groups(), LegendLanguage::Ja);
        write_branches_json(&path, &file).unwrap();
        let back = read_branches_json(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back, file);
        assert_eq!(back.groups[0].branches[0].label, "順掃引");
    }

    #[test]
    fn csv_lists_turning_point_in_both_branches() {
        let path = std::env::temp_dir().join(format!("fet_sweeps_branches_{}.csv", std::process::id()));
        write_branches_csv(&path, &groups()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "group,direction,sequence_index,x,y");
        assert_eq!(lines.len(), 1 + 3 + 3);
        assert_eq!(lines[3], "0.50,forward,2,2,0.000002");
        assert_eq!(lines[4], "0.50,reverse,2,2,0.000002");
    }
}
