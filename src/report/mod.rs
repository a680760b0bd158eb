//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - ingest and sweep code stays free of presentation
//! - output changes are localized (and covered by snapshot-style tests)

use crate::domain::{ColumnMap, PlotMode};
use crate::io::ingest::MergedData;
use crate::sweep::SweepGroup;

/// Summarize a merge: files and rows used, skipped files, per-file details.
pub fn format_merge_summary(merged: &MergedData, columns: &ColumnMap) -> String {
    let stats = &merged.stats;
    let mut out = String::new();

    out.push_str("=== fetview - merge ===\n");
    out.push_str(&format!(
        "Columns: Vsd='{}' Vbg='{}' Isd='{}'\n",
        columns.vsd, columns.vbg, columns.isd
    ));
    out.push_str(&format!(
        "Files: {} used / {} read | Rows: {} used / {} read\n",
        stats.files_used, stats.files_read, stats.rows_used, stats.rows_read
    ));

    for source in &merged.sources {
        let header = if source.header_inserted { " (default header)" } else { "" };
        out.push_str(&format!(
            "  {:<28} {:>6} row(s) {:?}{header}\n",
            source.file_name(),
            source.rows.len(),
            source.delimiter
        ));
    }
    for skipped in &merged.skipped {
        out.push_str(&format!("  skipped {}: {}\n", skipped.path.display(), skipped.reason));
    }

    out
}

/// One line per group: key, sample count, turning index, drawn branches.
pub fn format_group_summary(groups: &[SweepGroup], mode: PlotMode) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} | {} group(s)\n", mode.title(), groups.len()));

    let prefix = mode.group_prefix();
    for group in groups {
        let (lo, hi) = group.sweep_range();
        let branches = if group.branches.is_empty() {
            "-".to_string()
        } else {
            group
                .branches
                .iter()
                .map(|b| format!("{:?}({})", b.direction, b.len()).to_lowercase())
                .collect::<Vec<_>>()
                .join(" ")
        };
        out.push_str(&format!(
            "  {:<14} n={:<5} turn={:<5} sweep=[{lo:.3}, {hi:.3}] {branches}\n",
            group.label(prefix),
            group.samples.len(),
            group.turn_index,
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sample;
    use crate::sweep::sweep_groups;

    #[test]
    fn group_summary_lines() {
        let mut samples: Vec<Sample> = [0.0, 1.0, 2.0, 1.0, 0.0]
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample {
                sweep_value: v,
                group_value: -5.0,
                response_value: v,
                sequence_index: i as u64,
            })
            .collect();
        samples.push(Sample {
            sweep_value: 0.3,
            group_value: 5.0,
            response_value: 1.0,
            sequence_index: 5,
        });

        let groups = sweep_groups(&samples, 2).unwrap();
        let txt = format_group_summary(&groups, PlotMode::Output);
        let lines: Vec<&str> = txt.lines().collect();

        assert_eq!(lines[0], "Output Characteristics (Isd - Vsd) | 2 group(s)");
        assert_eq!(
            lines[1],
            "  Vbg=-5.00      n=5     turn=2     sweep=[0.000, 2.000] forward(3) reverse(3)"
        );
        assert_eq!(
            lines[2],
            "  Vbg=5.00       n=1     turn=0     sweep=[0.300, 0.300] -"
        );
    }
}
