//! Grouping samples by their rounded held-constant voltage.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::Sample;

/// A rounded group value, stored as a scaled integer so keys are totally ordered.
///
/// `-0.001` and `0.001` both round to the same key as `0.0` at two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    scaled: i64,
    decimals: u32,
}

impl GroupKey {
    /// Round `value` half-to-even at `decimals` places.
    ///
    /// Input is expected to be finite (ingest drops non-finite cells); the
    /// float-to-int cast saturates otherwise.
    pub fn new(value: f64, decimals: u32) -> Self {
        let scaled = (value * scale(decimals)).round_ties_even();
        Self {
            // `as` maps -0.0 to 0, which is what merges the signed zeros.
            scaled: scaled as i64,
            decimals,
        }
    }

    pub fn value(self) -> f64 {
        self.scaled as f64 / scale(self.decimals)
    }

    pub fn decimals(self) -> u32 {
        self.decimals
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.*}", self.decimals as usize, self.value())
    }
}

fn scale(decimals: u32) -> f64 {
    10f64.powi(decimals as i32)
}

/// Group samples by rounded `group_value`.
///
/// Keys iterate in ascending numeric order; each group's samples are sorted by
/// `sequence_index`. Groups are only created by inserting a sample, so none is empty.
pub fn group_samples(samples: &[Sample], decimals: u32) -> BTreeMap<GroupKey, Vec<Sample>> {
    let mut groups: BTreeMap<GroupKey, Vec<Sample>> = BTreeMap::new();
    for sample in samples {
        groups
            .entry(GroupKey::new(sample.group_value, decimals))
            .or_default()
            .push(*sample);
    }
    for members in groups.values_mut() {
        members.sort_by_key(|s| s.sequence_index);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(group_value: f64, sequence_index: u64) -> Sample {
        Sample {
            sweep_value: sequence_index as f64,
            group_value,
            response_value: 0.0,
            sequence_index,
        }
    }

    #[test]
    fn rounding_merges_near_zero_values() {
        let samples = vec![sample(0.001, 0), sample(-0.001, 1), sample(1.0, 2)];
        let groups = group_samples(&samples, 2);

        let keys: Vec<String> = groups.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["0.00", "1.00"]);

        let zero = &groups[&GroupKey::new(0.0, 2)];
        let order: Vec<u64> = zero.iter().map(|s| s.sequence_index).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn groups_are_sorted_by_sequence_index() {
        let samples = vec![sample(5.0, 9), sample(5.0, 2), sample(5.0, 4)];
        let groups = group_samples(&samples, 2);
        let order: Vec<u64> = groups
            .values()
            .next()
            .unwrap()
            .iter()
            .map(|s| s.sequence_index)
            .collect();
        assert_eq!(order, vec![2, 4, 9]);
    }

    #[test]
    fn keys_iterate_in_numeric_order() {
        let samples = vec![sample(10.0, 0), sample(-20.0, 1), sample(0.5, 2), sample(-0.5, 3)];
        let groups = group_samples(&samples, 2);
        let values: Vec<f64> = groups.keys().map(|k| k.value()).collect();
        assert_eq!(values, vec![-20.0, -0.5, 0.5, 10.0]);
    }

    #[test]
    fn half_values_round_to_even() {
        assert_eq!(GroupKey::new(0.125, 2).to_string(), "0.12");
        assert_eq!(GroupKey::new(2.5, 0).to_string(), "2");
        assert_eq!(GroupKey::new(-19.996, 2).to_string(), "-20.00");
    }
}
