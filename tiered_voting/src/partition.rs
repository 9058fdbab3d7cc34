use log::debug;
use std::collections::{BTreeMap, HashSet};

use crate::board::Group;
use crate::config::*;

/// Which bucket keys become groups, and in which order.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum BucketOrder {
    /// Only these keys, in this order.
    Fixed(&'static [u32]),
    /// Every key at or above the given floor, highest first.
    DescendingFrom(u32),
}

impl BucketOrder {
    fn allows(&self, key: u32) -> bool {
        match self {
            BucketOrder::Fixed(keys) => keys.contains(&key),
            BucketOrder::DescendingFrom(floor) => key >= *floor,
        }
    }
}

/// Round 2 splits the round-1 survivors on their round-1 score: the 2s first, then the 1s.
pub const SECOND_ROUND_ORDER: BucketOrder = BucketOrder::Fixed(&[2, 1]);

/// Round 3 keeps the items with a cumulative score of at least 3, best bucket first.
pub const THIRD_ROUND_ORDER: BucketOrder = BucketOrder::DescendingFrom(3);

/// Buckets the survivors by `key_fn` and emits one group per non-empty allowed bucket.
///
/// Items keep their relative order inside a bucket. Items whose key is not allowed
/// are left out, and an item listed twice only lands in the first bucket it was seen in.
/// The emitted groups have no scores and no quota.
pub fn partition<F>(survivors: &[ItemId], key_fn: F, order: BucketOrder, round: Round) -> Vec<Group>
where
    F: Fn(ItemId) -> u32,
{
    let mut seen: HashSet<ItemId> = HashSet::new();
    let mut buckets: BTreeMap<u32, Vec<ItemId>> = BTreeMap::new();
    for item in survivors.iter() {
        if !seen.insert(*item) {
            debug!("partition: {}: item {} listed twice, skipping", round, item);
            continue;
        }
        let key = key_fn(*item);
        if order.allows(key) {
            buckets.entry(key).or_default().push(*item);
        } else {
            debug!(
                "partition: {}: item {} with key {} does not continue",
                round, item, key
            );
        }
    }

    let keys: Vec<u32> = match order {
        BucketOrder::Fixed(keys) => keys.to_vec(),
        BucketOrder::DescendingFrom(_) => buckets.keys().rev().cloned().collect(),
    };

    let groups: Vec<Group> = keys
        .iter()
        .filter_map(|key| {
            buckets
                .remove(key)
                .map(|members| Group::new(round, GroupKey::Score(*key), false, &members))
        })
        .collect();
    debug!(
        "partition: {}: {} groups with sizes {:?}",
        round,
        groups.len(),
        groups.iter().map(|g| g.len()).collect::<Vec<usize>>()
    );
    groups
}
