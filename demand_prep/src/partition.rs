//! Partition-map-merge over series identities
//!
//! Rows are grouped by key into an ordered map, each group is processed on
//! the rayon pool and results come back in key order. No stage relies on
//! positional row bookkeeping.

use rayon::prelude::*;
use std::collections::BTreeMap;

/// Group `items` by `key`, keeping the input order within each group
pub fn partition_by<T, K, F>(items: Vec<T>, key: F) -> BTreeMap<K, Vec<T>>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups
}

/// Apply `f` to every partition in parallel; output is in key order
pub fn map_partitions<K, T, U, F>(groups: BTreeMap<K, Vec<T>>, f: F) -> Vec<(K, U)>
where
    K: Ord + Send,
    T: Send,
    U: Send,
    F: Fn(&K, Vec<T>) -> U + Sync + Send,
{
    groups
        .into_iter()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(key, rows)| {
            let out = f(&key, rows);
            (key, out)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_keep_input_order() {
        let items = vec![("b", 1), ("a", 2), ("b", 3), ("a", 4)];
        let groups = partition_by(items, |(k, _)| *k);

        assert_eq!(groups["a"], vec![("a", 2), ("a", 4)]);
        assert_eq!(groups["b"], vec![("b", 1), ("b", 3)]);
    }

    #[test]
    fn results_come_back_in_key_order() {
        let groups = partition_by((0..100).collect::<Vec<i32>>(), |v| v % 7);
        let sums = map_partitions(groups, |_, rows| rows.iter().sum::<i32>());

        let keys: Vec<i32> = sums.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, (0..7).collect::<Vec<_>>());
        assert_eq!(sums.iter().map(|(_, s)| s).sum::<i32>(), (0..100).sum::<i32>());
    }
}
