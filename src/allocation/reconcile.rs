use std::collections::HashMap;

use tracing::debug;

use super::AllocationResult;

/// Identifies units that are interchangeable during reconciliation: same
/// usage and same rounding error at the configured precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct GroupKey {
    usage_bits: u64,
    error_units: i64,
}

impl GroupKey {
    pub(crate) fn new(usage: f64, rounding_error: f64, precision: u32) -> Self {
        let scale = 10f64.powi(precision as i32);
        Self {
            // `+ 0.0` folds -0.0 into 0.0 so both land in the same group.
            usage_bits: (usage + 0.0).to_bits(),
            error_units: (rounding_error * scale).round() as i64,
        }
    }
}

#[derive(Debug)]
struct Group {
    key: GroupKey,
    members: Vec<usize>,
}

/// Buckets result indices by [`GroupKey`], preserving first-appearance order.
fn group_results(results: &[AllocationResult], precision: u32) -> Vec<Group> {
    let mut positions: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();
    for (idx, result) in results.iter().enumerate() {
        let key = GroupKey::new(result.usage, result.rounding_error, precision);
        match positions.get(&key) {
            Some(&pos) => groups[pos].members.push(idx),
            None => {
                positions.insert(key, groups.len());
                groups.push(Group {
                    key,
                    members: vec![idx],
                });
            }
        }
    }
    groups
}

/// Hands `difference` back to the units one granularity step at a time and
/// returns whatever could not be placed.
///
/// A positive difference goes to the groups that lost the most to rounding, a
/// negative one is taken from the groups that gained the most. Groups are
/// adjusted whole or not at all.
pub(crate) fn redistribute(
    results: &mut [AllocationResult],
    difference: f64,
    granularity: f64,
    precision: u32,
) -> f64 {
    let mut groups = group_results(results, precision);
    let mut remaining = difference;

    if remaining > 0.0 {
        groups.sort_by(|a, b| b.key.error_units.cmp(&a.key.error_units));
        for group in &groups {
            if remaining <= 0.0 {
                break;
            }
            let step = group.members.len() as f64 * granularity;
            if remaining >= step {
                for &idx in &group.members {
                    results[idx].adjustment = granularity;
                }
                remaining -= step;
                debug!(members = group.members.len(), remaining, "raised group");
            }
        }
    } else if remaining < 0.0 {
        groups.sort_by(|a, b| a.key.error_units.cmp(&b.key.error_units));
        for group in &groups {
            if remaining >= 0.0 {
                break;
            }
            let step = group.members.len() as f64 * granularity;
            if remaining + step <= 0.0 {
                for &idx in &group.members {
                    results[idx].adjustment = -granularity;
                }
                remaining += step;
                debug!(members = group.members.len(), remaining, "lowered group");
            }
        }
    }

    remaining
}
