//! Splitting one ordered sweep into forward and reverse branches.

use crate::domain::{Direction, Sample};

use super::SweepError;

/// A branch needs at least two points to be drawn as a line.
pub const MIN_BRANCH_LEN: usize = 2;

/// A contiguous run of a group's samples, tagged with its sweep direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub direction: Direction,
    /// Index of the first sample within the group (inclusive).
    pub first: usize,
    /// Index of the last sample within the group (inclusive).
    pub last: usize,
    pub samples: Vec<Sample>,
}

impl Branch {
    fn new(direction: Direction, group: &[Sample], first: usize, last: usize) -> Self {
        Self {
            direction,
            first,
            last,
            samples: group[first..=last].to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `(sweep, response)` pairs in acquisition order.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .map(|s| (s.sweep_value, s.response_value))
            .collect()
    }
}

/// Result of splitting one group.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSplit {
    /// Position of the turning sample (shared by both branches).
    pub turn_index: usize,
    /// Drawable branches, in acquisition order (0, 1 or 2 of them).
    pub branches: Vec<Branch>,
}

/// Split an ordered sweep at its turning point.
///
/// The turn is the first maximum of `sweep_value`; when that sits at either
/// end the first minimum is used instead, which covers both low-high-low and
/// high-low-high sweeps. The turning sample belongs to both halves. The first
/// half is `Forward` when the sweep starts below the turn value, `Reverse`
/// otherwise. Halves shorter than [`MIN_BRANCH_LEN`] are dropped.
pub fn split_sweep(samples: &[Sample]) -> Result<SweepSplit, SweepError> {
    let last = samples.len().checked_sub(1).ok_or(SweepError::EmptyGroup)?;

    let mut turn_index = first_extremum(samples, |candidate, best| candidate > best);
    if turn_index == 0 || turn_index == last {
        turn_index = first_extremum(samples, |candidate, best| candidate < best);
    }

    let start = samples[0].sweep_value;
    let turn = samples[turn_index].sweep_value;
    let (head, tail) = if start < turn {
        (Direction::Forward, Direction::Reverse)
    } else {
        (Direction::Reverse, Direction::Forward)
    };

    let branches = [
        Branch::new(head, samples, 0, turn_index),
        Branch::new(tail, samples, turn_index, last),
    ]
    .into_iter()
    .filter(|b| b.len() >= MIN_BRANCH_LEN)
    .collect();

    Ok(SweepSplit {
        turn_index,
        branches,
    })
}

/// Index of the first sample that no later sample beats under `better`.
fn first_extremum(samples: &[Sample], better: impl Fn(f64, f64) -> bool) -> usize {
    let mut best = 0;
    for (idx, s) in samples.iter().enumerate().skip(1) {
        if better(s.sweep_value, samples[best].sweep_value) {
            best = idx;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweep(values: &[f64]) -> Vec<Sample> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample {
                sweep_value: v,
                group_value: 0.0,
                response_value: v * 10.0,
                sequence_index: i as u64,
            })
            .collect()
    }

    fn values(branch: &Branch) -> Vec<f64> {
        branch.samples.iter().map(|s| s.sweep_value).collect()
    }

    #[test]
    fn rise_then_fall_splits_at_maximum() {
        let split = split_sweep(&sweep(&[0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0])).unwrap();
        assert_eq!(split.turn_index, 3);
        assert_eq!(split.branches.len(), 2);
        assert_eq!(split.branches[0].direction, Direction::Forward);
        assert_eq!(values(&split.branches[0]), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(split.branches[1].direction, Direction::Reverse);
        assert_eq!(values(&split.branches[1]), vec![3.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn fall_then_rise_uses_minimum() {
        let split = split_sweep(&sweep(&[3.0, 2.0, 1.0, 0.0, 1.0, 2.0, 3.0])).unwrap();
        assert_eq!(split.turn_index, 3);
        assert_eq!(split.branches[0].direction, Direction::Reverse);
        assert_eq!(values(&split.branches[0]), vec![3.0, 2.0, 1.0, 0.0]);
        assert_eq!(split.branches[1].direction, Direction::Forward);
        assert_eq!(values(&split.branches[1]), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn monotonic_increase_is_a_single_forward_branch() {
        let input = sweep(&[-1.0, 0.0, 0.5, 2.0, 4.0]);
        let split = split_sweep(&input).unwrap();
        assert_eq!(split.turn_index, 0);
        assert_eq!(split.branches.len(), 1);
        assert_eq!(split.branches[0].direction, Direction::Forward);
        assert_eq!(split.branches[0].samples, input);
    }

    #[test]
    fn monotonic_decrease_is_a_single_reverse_branch() {
        let input = sweep(&[4.0, 2.0, 0.0]);
        let split = split_sweep(&input).unwrap();
        assert_eq!(split.turn_index, 2);
        assert_eq!(split.branches.len(), 1);
        assert_eq!(split.branches[0].direction, Direction::Reverse);
        assert_eq!(split.branches[0].samples, input);
    }

    #[test]
    fn ties_resolve_to_first_occurrence() {
        // Two equal maxima: the first one (index 2) is the turn.
        let split = split_sweep(&sweep(&[0.0, 1.0, 3.0, 3.0, 1.0, 0.0])).unwrap();
        assert_eq!(split.turn_index, 2);
        assert_eq!(values(&split.branches[0]), vec![0.0, 1.0, 3.0]);
        assert_eq!(values(&split.branches[1]), vec![3.0, 3.0, 1.0, 0.0]);

        // Max at the start, duplicated minima at 2 and 3: the first minimum wins.
        let split = split_sweep(&sweep(&[3.0, 1.0, 0.0, 0.0, 2.0])).unwrap();
        assert_eq!(split.turn_index, 2);
    }

    #[test]
    fn constant_sweep_collapses_to_one_branch() {
        let input = sweep(&[1.0, 1.0, 1.0, 1.0]);
        let split = split_sweep(&input).unwrap();
        assert_eq!(split.turn_index, 0);
        assert_eq!(split.branches.len(), 1);
        assert_eq!(split.branches[0].samples, input);
    }

    #[test]
    fn single_sample_yields_no_branches() {
        let split = split_sweep(&sweep(&[0.7])).unwrap();
        assert_eq!(split.turn_index, 0);
        assert!(split.branches.is_empty());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(split_sweep(&[]), Err(SweepError::EmptyGroup));
    }

    #[test]
    fn branches_partition_input_sharing_the_turn() {
        let inputs: [&[f64]; 4] = [
            &[0.0, 2.0, 5.0, 1.0, -3.0],
            &[5.0, 0.0, 1.0, 2.0],
            &[0.0, 0.5, 0.2, 0.9, 0.1],
            &[-1.0, -2.0, -1.5, -3.0, 0.0, 1.0],
        ];
        for values in inputs {
            let input = sweep(values);
            let split = split_sweep(&input).unwrap();

            let mut seen: Vec<u64> = split
                .branches
                .iter()
                .flat_map(|b| b.samples.iter().map(|s| s.sequence_index))
                .collect();
            seen.sort_unstable();
            seen.dedup();

            let expected: Vec<u64> = input.iter().map(|s| s.sequence_index).collect();
            assert_eq!(seen, expected, "input {values:?}");

            if split.branches.len() == 2 {
                assert_eq!(split.branches[0].last, split.turn_index);
                assert_eq!(split.branches[1].first, split.turn_index);
            }
        }
    }
}
