pub mod algorithms;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use algorithms::{FeatureMatrices, ServingModel};
pub use config::{Config, TrainingConfig};
pub use error::{ModelError, Result};
pub use models::*;
pub use services::serving::RatingPredictor;
pub use services::training::{StopReason, TrainedModel, TrainingEngine, TrainingReport};
pub use storage::{ItemIndexedRatings, ObservationLog, RaterIndex};

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
