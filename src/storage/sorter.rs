//! Stable merge sort for per-entity rating lists.
//!
//! Each entity's list is ordered by counterpart id so that membership and
//! position lookups can binary search instead of scanning. Entries move as
//! whole `(counterpart, rating)` pairs, so a rater can never be separated from
//! its score.

use std::time::Instant;

use tracing::{debug, info};

use crate::models::RatingEntry;

const PROGRESS_INTERVAL: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortStats {
    pub lists_sorted: usize,
    pub entries_sorted: usize,
}

/// Sorts every present, non-empty list in place by counterpart id.
///
/// One scratch buffer sized to the longest list is reused across lists.
pub fn sort_lists(lists: &mut [Option<Vec<RatingEntry>>]) -> SortStats {
    let mut stats = SortStats::default();
    let mut scratch = Vec::new();
    let started = Instant::now();
    let mut batch_started = Instant::now();

    for (index, list) in lists.iter_mut().enumerate() {
        if let Some(entries) = list.as_mut().filter(|entries| !entries.is_empty()) {
            sort_entries(entries, &mut scratch);
            stats.lists_sorted += 1;
            stats.entries_sorted += entries.len();
        }

        if index > 0 && index % PROGRESS_INTERVAL == 0 {
            debug!(
                "Finished {} lists, last batch took {:?}",
                index,
                batch_started.elapsed()
            );
            batch_started = Instant::now();
        }
    }

    info!(
        "Sorted {} lists ({} entries) in {:?}",
        stats.lists_sorted,
        stats.entries_sorted,
        started.elapsed()
    );
    stats
}

/// Sorts one list by counterpart id.
pub fn sort_entries(entries: &mut [RatingEntry], scratch: &mut Vec<RatingEntry>) {
    merge_sort_by_key(entries, scratch, |entry| entry.counterpart);
}

/// Top-down merge sort. Equal keys keep their relative order.
///
/// `scratch` is grown to `items.len()` and its previous contents are discarded.
pub fn merge_sort_by_key<T, K, F>(items: &mut [T], scratch: &mut Vec<T>, key: F)
where
    T: Copy,
    K: Ord,
    F: Fn(&T) -> K,
{
    if items.len() < 2 {
        return;
    }
    scratch.clear();
    scratch.extend_from_slice(items);
    sort_range(items, &mut scratch[..], &key);
}

fn sort_range<T, K, F>(items: &mut [T], scratch: &mut [T], key: &F)
where
    T: Copy,
    K: Ord,
    F: Fn(&T) -> K,
{
    let len = items.len();
    if len < 2 {
        return;
    }

    let mid = (len + 1) / 2;
    {
        let (left, right) = items.split_at_mut(mid);
        let (left_scratch, right_scratch) = scratch.split_at_mut(mid);
        sort_range(left, left_scratch, key);
        sort_range(right, right_scratch, key);
    }

    // Already in order: the halves are adjacent runs.
    if key(&items[mid - 1]) <= key(&items[mid]) {
        return;
    }
    merge(items, mid, scratch, key);
}

fn merge<T, K, F>(items: &mut [T], mid: usize, scratch: &mut [T], key: &F)
where
    T: Copy,
    K: Ord,
    F: Fn(&T) -> K,
{
    let len = items.len();
    let (mut left, mut right, mut out) = (0, mid, 0);

    while left < mid && right < len {
        if key(&items[right]) < key(&items[left]) {
            scratch[out] = items[right];
            right += 1;
        } else {
            scratch[out] = items[left];
            left += 1;
        }
        out += 1;
    }

    let rest_left = mid - left;
    scratch[out..out + rest_left].copy_from_slice(&items[left..mid]);
    out += rest_left;
    scratch[out..len].copy_from_slice(&items[right..len]);

    items.copy_from_slice(&scratch[..len]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(u32, u8)]) -> Vec<RatingEntry> {
        pairs
            .iter()
            .map(|&(counterpart, rating)| RatingEntry::new(counterpart, rating))
            .collect()
    }

    #[test]
    fn test_sort_entries_keeps_pairs_together() {
        let mut list = entries(&[(42, 1), (7, 5), (19, 3), (3, 2), (100, 4)]);
        let mut scratch = Vec::new();
        sort_entries(&mut list, &mut scratch);

        assert_eq!(list, entries(&[(3, 2), (7, 5), (19, 3), (42, 1), (100, 4)]));
    }

    #[test]
    fn test_merge_sort_is_stable() {
        let mut items = vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd'), (0, 'e')];
        let mut scratch = Vec::new();
        merge_sort_by_key(&mut items, &mut scratch, |item| item.0);

        assert_eq!(items, vec![(0, 'e'), (1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
    }

    #[test]
    fn test_merge_sort_matches_std_sort() {
        let mut items: Vec<u32> = (0..257).map(|i| (i * 7919 + 13) % 521).collect();
        let mut expected = items.clone();
        expected.sort();

        let mut scratch = Vec::new();
        merge_sort_by_key(&mut items, &mut scratch, |item| *item);
        assert_eq!(items, expected);
    }

    #[test]
    fn test_sort_lists_skips_absent_and_empty() {
        let mut lists = vec![
            Some(entries(&[(5, 1), (2, 2)])),
            None,
            Some(Vec::new()),
            Some(entries(&[(9, 4)])),
        ];
        let stats = sort_lists(&mut lists);

        assert_eq!(stats.lists_sorted, 2);
        assert_eq!(stats.entries_sorted, 3);
        assert_eq!(lists[0], Some(entries(&[(2, 2), (5, 1)])));
        assert_eq!(lists[1], None);
    }
}
