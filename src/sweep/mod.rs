//! Sweep grouping and forward/reverse splitting.
//!
//! ```text
//!  [Sample] ──group_samples──▶ BTreeMap<GroupKey, [Sample]> ──split_sweep──▶ [SweepGroup]
//! ```
//!
//! Everything here is a pure function of its input; renderers recompute the
//! groups on every request.

pub mod group;
pub mod split;

pub use group::{GroupKey, group_samples};
pub use split::{Branch, MIN_BRANCH_LEN, SweepSplit, split_sweep};

use thiserror::Error;

use crate::domain::Sample;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SweepError {
    #[error("cannot split an empty sweep group")]
    EmptyGroup,
}

/// One group's samples plus its drawable branches.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepGroup {
    pub key: GroupKey,
    /// All samples of the group, ordered by `sequence_index`.
    pub samples: Vec<Sample>,
    pub turn_index: usize,
    pub branches: Vec<Branch>,
}

impl SweepGroup {
    /// Legend/title label such as `Vbg=0.50`.
    pub fn label(&self, prefix: &str) -> String {
        format!("{prefix}={}", self.key)
    }

    /// Min and max sweep value across the whole group.
    pub fn sweep_range(&self) -> (f64, f64) {
        self.samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.sweep_value), hi.max(s.sweep_value))
            })
    }
}

/// Group, order and split `samples` in one pass; groups come back in ascending key order.
pub fn sweep_groups(samples: &[Sample], decimals: u32) -> Result<Vec<SweepGroup>, SweepError> {
    group_samples(samples, decimals)
        .into_iter()
        .map(|(key, members)| {
            let split = split_sweep(&members)?;
            Ok(SweepGroup {
                key,
                samples: members,
                turn_index: split.turn_index,
                branches: split.branches,
            })
        })
        .collect()
}
