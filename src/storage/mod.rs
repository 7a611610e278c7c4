pub mod loader;
pub mod sorter;

use crate::error::{ModelError, Result};
use crate::models::*;

pub use sorter::SortStats;

/// Ratings grouped by item: for every item index, the users who rated it and
/// the rating each gave.
///
/// Reads never copy; out-of-range or removed items read as empty.
#[derive(Debug, Clone, Default)]
pub struct ItemIndexedRatings {
    items: Vec<Option<Vec<RatingEntry>>>,
    sorted: bool,
}

/// The rater structure left behind once ratings have been consumed.
#[derive(Debug, Clone, Default)]
pub struct RaterIndex {
    raters: Vec<Option<Box<[UserId]>>>,
    sorted: bool,
}

/// Flat training observations, one per historical rating event.
#[derive(Debug, Clone, Default)]
pub struct ObservationLog {
    observations: Vec<Observation>,
}

impl ItemIndexedRatings {
    pub fn new(items: Vec<Option<Vec<RatingEntry>>>) -> Self {
        Self {
            items,
            sorted: false,
        }
    }

    /// Builds the index from the two parallel per-item sequences a bulk
    /// loader produces. Both sequences must have matching shapes.
    pub fn from_parallel(raters: Vec<Vec<UserId>>, scores: Vec<Vec<Rating>>) -> Result<Self> {
        if raters.len() != scores.len() {
            return Err(ModelError::Format(format!(
                "{} rater lists but {} rating lists",
                raters.len(),
                scores.len()
            )));
        }

        let mut items = Vec::with_capacity(raters.len());
        for (index, (users, ratings)) in raters.into_iter().zip(scores).enumerate() {
            if users.len() != ratings.len() {
                return Err(ModelError::Format(format!(
                    "item index {} has {} raters but {} ratings",
                    index,
                    users.len(),
                    ratings.len()
                )));
            }
            let entries = users
                .into_iter()
                .zip(ratings)
                .map(|(user, rating)| RatingEntry::new(user, rating))
                .collect();
            items.push(Some(entries));
        }

        Ok(Self::new(items))
    }

    /// Groups observations by item. Observations whose item falls outside
    /// `num_items` are ignored.
    pub fn from_observations(observations: &[Observation], num_items: usize) -> Self {
        let mut items: Vec<Option<Vec<RatingEntry>>> = vec![None; num_items];
        for observation in observations {
            if let Some(slot) = items.get_mut(observation.item_index()) {
                slot.get_or_insert_with(Vec::new)
                    .push(RatingEntry::new(observation.user, observation.rating));
            }
        }
        Self::new(items)
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    pub fn num_ratings(&self) -> usize {
        self.items.iter().flatten().map(Vec::len).sum()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn entries_for_item(&self, item_index: usize) -> &[RatingEntry] {
        self.items
            .get(item_index)
            .and_then(Option::as_deref)
            .unwrap_or(&[])
    }

    pub fn raters_for_item(&self, item_index: usize) -> impl Iterator<Item = UserId> + '_ {
        self.entries_for_item(item_index)
            .iter()
            .map(|entry| entry.counterpart)
    }

    pub fn ratings_for_item(&self, item_index: usize) -> impl Iterator<Item = Rating> + '_ {
        self.entries_for_item(item_index)
            .iter()
            .map(|entry| entry.rating)
    }

    /// The rating `user` gave the item, if any. Binary search once sorted.
    pub fn rating_of(&self, item_index: usize, user: UserId) -> Option<Rating> {
        let entries = self.entries_for_item(item_index);
        if self.sorted {
            entries
                .binary_search_by_key(&user, |entry| entry.counterpart)
                .ok()
                .map(|position| entries[position].rating)
        } else {
            entries
                .iter()
                .find(|entry| entry.counterpart == user)
                .map(|entry| entry.rating)
        }
    }

    /// Drops the item's list. Idempotent; a no-op outside the index.
    pub fn remove_item(&mut self, item_index: usize) {
        if let Some(slot) = self.items.get_mut(item_index) {
            *slot = None;
        }
    }

    /// Frees every rating while keeping who rated what.
    pub fn remove_all_ratings(self) -> RaterIndex {
        let sorted = self.sorted;
        let raters = self
            .items
            .into_iter()
            .map(|list| {
                list.map(|entries| {
                    entries
                        .into_iter()
                        .map(|entry| entry.counterpart)
                        .collect::<Box<[UserId]>>()
                })
            })
            .collect();
        RaterIndex { raters, sorted }
    }

    pub fn sort(&mut self) -> SortStats {
        let stats = sorter::sort_lists(&mut self.items);
        self.sorted = true;
        stats
    }

    pub fn lists(&self) -> &[Option<Vec<RatingEntry>>] {
        &self.items
    }

    /// Mutable access to the backing lists. Clears the sorted flag.
    pub fn lists_mut(&mut self) -> &mut [Option<Vec<RatingEntry>>] {
        self.sorted = false;
        &mut self.items
    }
}

impl RaterIndex {
    pub fn num_items(&self) -> usize {
        self.raters.len()
    }

    pub fn raters_for_item(&self, item_index: usize) -> &[UserId] {
        self.raters
            .get(item_index)
            .and_then(Option::as_deref)
            .unwrap_or(&[])
    }

    pub fn has_rated(&self, item_index: usize, user: UserId) -> bool {
        let raters = self.raters_for_item(item_index);
        if self.sorted {
            raters.binary_search(&user).is_ok()
        } else {
            raters.contains(&user)
        }
    }

    pub fn remove_item(&mut self, item_index: usize) {
        if let Some(slot) = self.raters.get_mut(item_index) {
            *slot = None;
        }
    }
}

impl ObservationLog {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    /// Flattens an item index in item order, keeping each list's order.
    pub fn from_item_index(index: &ItemIndexedRatings) -> Self {
        let mut observations = Vec::with_capacity(index.num_ratings());
        for (item_index, list) in index.lists().iter().enumerate() {
            let Some(entries) = list else { continue };
            let item = (item_index + 1) as ItemId;
            observations.extend(
                entries
                    .iter()
                    .map(|entry| Observation::new(entry.counterpart, item, entry.rating)),
            );
        }
        Self::new(observations)
    }

    pub fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// Stable reorder by user; each user's observations keep their relative order.
    pub fn sort_by_user(&mut self) {
        let mut scratch = Vec::new();
        sorter::merge_sort_by_key(&mut self.observations, &mut scratch, |observation| {
            observation.user
        });
    }

    pub fn global_average(&self) -> Option<f64> {
        if self.observations.is_empty() {
            return None;
        }
        let total: f64 = self
            .observations
            .iter()
            .map(|observation| f64::from(observation.rating))
            .sum();
        Some(total / self.observations.len() as f64)
    }

    pub fn into_inner(self) -> Vec<Observation> {
        self.observations
    }
}

impl From<Vec<Observation>> for ObservationLog {
    fn from(observations: Vec<Observation>) -> Self {
        Self::new(observations)
    }
}

impl<'a> IntoIterator for &'a ObservationLog {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> ItemIndexedRatings {
        ItemIndexedRatings::from_parallel(
            vec![vec![9, 2, 5], vec![], vec![1]],
            vec![vec![4, 1, 3], vec![], vec![5]],
        )
        .unwrap()
    }

    #[test]
    fn test_from_parallel_rejects_mismatched_lengths() {
        let result = ItemIndexedRatings::from_parallel(vec![vec![1, 2]], vec![vec![3]]);
        assert!(matches!(result, Err(ModelError::Format(_))));
    }

    #[test]
    fn test_reads_out_of_range_are_empty() {
        let index = sample_index();
        assert_eq!(index.raters_for_item(3).count(), 0);
        assert_eq!(index.ratings_for_item(usize::MAX).count(), 0);
        assert_eq!(index.rating_of(10, 1), None);
    }

    #[test]
    fn test_rating_of_before_and_after_sort() {
        let mut index = sample_index();
        assert_eq!(index.rating_of(0, 2), Some(1));

        index.sort();
        assert!(index.is_sorted());
        assert_eq!(index.rating_of(0, 2), Some(1));
        assert_eq!(index.rating_of(0, 9), Some(4));
        assert_eq!(index.rating_of(0, 3), None);
    }

    #[test]
    fn test_remove_item_including_first_index() {
        let mut index = sample_index();
        index.remove_item(0);
        index.remove_item(0);
        index.remove_item(99);

        assert_eq!(index.raters_for_item(0).count(), 0);
        assert_eq!(index.raters_for_item(2).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_remove_all_ratings_keeps_raters() {
        let mut index = sample_index();
        index.sort();
        let raters = index.remove_all_ratings();

        assert_eq!(raters.num_items(), 3);
        assert_eq!(raters.raters_for_item(0), &[2, 5, 9]);
        assert!(raters.has_rated(0, 5));
        assert!(!raters.has_rated(1, 5));
    }

    #[test]
    fn test_observation_log_round_trips_through_item_index() {
        let log = ObservationLog::new(vec![
            Observation::new(3, 2, 4),
            Observation::new(1, 1, 5),
            Observation::new(0, 2, 2),
        ]);
        let index = ItemIndexedRatings::from_observations(log.as_slice(), 2);
        let flattened = ObservationLog::from_item_index(&index);

        assert_eq!(
            flattened.as_slice(),
            &[
                Observation::new(1, 1, 5),
                Observation::new(3, 2, 4),
                Observation::new(0, 2, 2),
            ]
        );
    }

    #[test]
    fn test_sort_by_user_is_stable() {
        let mut log = ObservationLog::new(vec![
            Observation::new(2, 1, 1),
            Observation::new(0, 3, 2),
            Observation::new(2, 2, 3),
            Observation::new(0, 1, 4),
        ]);
        log.sort_by_user();

        let order: Vec<_> = log.iter().map(|o| (o.user, o.item)).collect();
        assert_eq!(order, vec![(0, 3), (0, 1), (2, 1), (2, 2)]);
    }

    #[test]
    fn test_global_average() {
        assert_eq!(ObservationLog::default().global_average(), None);
        let log = ObservationLog::new(vec![Observation::new(0, 1, 5), Observation::new(1, 1, 2)]);
        assert_eq!(log.global_average(), Some(3.5));
    }
}
