use serde::{Deserialize, Serialize};

/// Users are identified by their 0-based index.
pub type UserId = u32;

/// Items are identified by a 1-based id; the item index is `id - 1`.
pub type ItemId = u32;

pub type Rating = u8;

/// One historical rating event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub user: UserId,
    pub item: ItemId,
    pub rating: Rating,
}

/// A rating as seen from one entity's list: the other party and its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub counterpart: u32,
    pub rating: Rating,
}

/// Fixed sizes of the user and item populations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    pub num_users: usize,
    pub num_items: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingScale {
    pub min: f64,
    pub max: f64,
}

impl Observation {
    pub fn new(user: UserId, item: ItemId, rating: Rating) -> Self {
        Self { user, item, rating }
    }

    pub fn item_index(&self) -> usize {
        item_index(self.item)
    }
}

impl RatingEntry {
    pub fn new(counterpart: u32, rating: Rating) -> Self {
        Self {
            counterpart,
            rating,
        }
    }
}

impl Universe {
    pub fn new(num_users: usize, num_items: usize) -> Self {
        Self {
            num_users,
            num_items,
        }
    }

    pub fn contains_user(&self, user: UserId) -> bool {
        (user as usize) < self.num_users
    }

    pub fn contains_item(&self, item: ItemId) -> bool {
        item >= 1 && item_index(item) < self.num_items
    }
}

impl RatingScale {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Clamps, never rounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, rating: Rating) -> bool {
        let value = f64::from(rating);
        value >= self.min && value <= self.max
    }

    /// Largest possible error on this scale.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

impl Default for RatingScale {
    fn default() -> Self {
        Self::new(1.0, 5.0)
    }
}

/// Translates an external 1-based item id into its 0-based index.
pub fn item_index(item: ItemId) -> usize {
    (item as usize).wrapping_sub(1)
}
