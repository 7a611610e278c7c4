use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::{RatingScale, Universe};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub training: TrainingConfig,
    pub model: ModelConfig,
    pub scale: RatingScale,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub ratings_path: PathBuf,
    pub num_users: usize,
    pub num_items: usize,
    pub order: ObservationOrder,
}

/// Order in which observations are visited during every epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationOrder {
    /// As read from the ratings source.
    #[default]
    Insertion,
    /// Grouped by item, raters ascending within each item.
    ItemMajor,
    /// Grouped by user, insertion order within each user.
    UserMajor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub artifact_path: PathBuf,
}

/// Order in which the two bias updates of one observation read each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasUpdate {
    /// Both updates read the pre-update biases.
    #[default]
    Simultaneous,
    /// The user bias update reads the freshly updated item bias.
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub factor_count: usize,
    pub max_epochs: usize,
    pub learning_rate: f64,
    pub user_regularization: f64,
    pub item_regularization: f64,
    pub bias_regularization: f64,
    /// Target the bias pair is pulled towards.
    pub global_mean: f64,
    /// Average rating used to seed the factors.
    pub init_average: f64,
    pub init_noise: f64,
    pub min_improvement: f64,
    /// RMSE the first epoch is compared against; the scale span when unset.
    pub initial_rmse: Option<f64>,
    pub seed: Option<u64>,
    pub bias_update: BiasUpdate,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            ratings_path: PathBuf::from("data/ratings.csv"),
            num_users: 480_189,
            num_items: 17_770,
            order: ObservationOrder::default(),
        }
    }
}

impl DataConfig {
    pub fn universe(&self) -> Universe {
        Universe::new(self.num_users, self.num_items)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("models/improved-svd.bin"),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            factor_count: 10,
            max_epochs: 100,
            learning_rate: 0.001,
            user_regularization: 0.011,
            item_regularization: 0.011,
            bias_regularization: 0.05,
            global_mean: 3.6033,
            init_average: 3.0663,
            init_noise: 0.005,
            min_improvement: 0.00001,
            initial_rmse: None,
            seed: None,
            bias_update: BiasUpdate::default(),
        }
    }
}

impl TrainingConfig {
    pub fn with_factor_count(mut self, factor_count: usize) -> Self {
        self.factor_count = factor_count;
        self
    }

    pub fn with_max_epochs(mut self, max_epochs: usize) -> Self {
        self.max_epochs = max_epochs;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_min_improvement(mut self, min_improvement: f64) -> Self {
        self.min_improvement = min_improvement;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn initial_rmse_for(&self, scale: &RatingScale) -> f64 {
        self.initial_rmse.unwrap_or_else(|| scale.span())
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("RATINGSVD").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
