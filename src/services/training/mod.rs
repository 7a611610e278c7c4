use crate::algorithms::initializer::{training_rng, FactorInitializer};
use crate::algorithms::optimizer::BiasedSgd;
use crate::algorithms::{FeatureMatrices, ServingModel};
use crate::config::TrainingConfig;
use crate::error::{ModelError, Result};
use crate::models::*;
use crate::storage::ObservationLog;
use crate::utils::metrics::RmseAccumulator;
use crate::utils::validation::{validate_rating_scale, validate_training_config};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Runs epochs of biased SGD over a fixed observation order until the epoch
/// cap is reached or the RMSE stops improving.
#[derive(Debug, Clone)]
pub struct TrainingEngine {
    config: TrainingConfig,
    universe: Universe,
    scale: RatingScale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxEpochs,
    EarlyStop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    pub epoch: usize,
    pub rmse: f64,
    /// Previous RMSE minus this one.
    pub improvement: f64,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub factor_count: usize,
    pub observations: usize,
    pub epochs: Vec<EpochStats>,
    pub stop_reason: StopReason,
    pub final_rmse: f64,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub model: ServingModel,
    pub report: TrainingReport,
}

impl TrainingEngine {
    pub fn new(config: TrainingConfig, universe: Universe, scale: RatingScale) -> Result<Self> {
        validate_training_config(&config)
            .and_then(|_| validate_rating_scale(&scale))
            .map_err(|e| ModelError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            config,
            universe,
            scale,
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn universe(&self) -> Universe {
        self.universe
    }

    /// Trains with the configured seed, or OS entropy when none is set.
    pub fn train(&self, observations: ObservationLog) -> Result<TrainedModel> {
        let mut rng = training_rng(self.config.seed);
        self.train_with_rng(observations, &mut rng)
    }

    /// Consumes the observations; they and the double-precision working
    /// matrices are released before the serving model is returned.
    pub fn train_with_rng<R: Rng + ?Sized>(
        &self,
        observations: ObservationLog,
        rng: &mut R,
    ) -> Result<TrainedModel> {
        if observations.is_empty() {
            return Err(ModelError::EmptyDataset);
        }
        self.check_bounds(&observations)?;

        let config = &self.config;
        let initializer =
            FactorInitializer::new(config.init_average, config.factor_count, config.init_noise);
        let mut matrices =
            FeatureMatrices::new(config.factor_count, &self.universe, &initializer, rng);
        let sgd = BiasedSgd::new(config);

        info!(
            "Training {} factors on {} observations ({} users, {} items)",
            config.factor_count,
            observations.len(),
            self.universe.num_users,
            self.universe.num_items
        );

        let started = Instant::now();
        let mut previous = config.initial_rmse_for(&self.scale);
        let mut epochs = Vec::new();
        let mut stop_reason = StopReason::MaxEpochs;

        for epoch in 1..=config.max_epochs {
            let epoch_started = Instant::now();
            let rmse = run_epoch(&sgd, &mut matrices, &observations);
            let improvement = previous - rmse;

            epochs.push(EpochStats {
                epoch,
                rmse,
                improvement,
                elapsed_ms: epoch_started.elapsed().as_millis() as u64,
            });
            info!(
                "Epoch {} finished: rmse={:.6} improvement={:.6} took {:?}",
                epoch,
                rmse,
                improvement,
                epoch_started.elapsed()
            );

            if improvement < config.min_improvement {
                info!(
                    "Early stopping after epoch {}: improvement {:.8} below {}",
                    epoch, improvement, config.min_improvement
                );
                stop_reason = StopReason::EarlyStop;
                break;
            }
            previous = rmse;
        }

        let count = observations.len();
        drop(observations);
        debug!("Released {} training observations", count);

        let model = matrices.narrow();
        let final_rmse = epochs.last().map(|stats| stats.rmse).unwrap_or(previous);
        let report = TrainingReport {
            factor_count: config.factor_count,
            observations: count,
            epochs,
            stop_reason,
            final_rmse,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            "Feature calculation finished after {} epochs in {:?} (final rmse {:.6})",
            report.epochs.len(),
            started.elapsed(),
            report.final_rmse
        );
        Ok(TrainedModel { model, report })
    }

    fn check_bounds(&self, observations: &ObservationLog) -> Result<()> {
        for observation in observations {
            if !self.universe.contains_user(observation.user) {
                return Err(ModelError::OutOfBounds {
                    entity: "user",
                    id: observation.user,
                    limit: self.universe.num_users,
                });
            }
            if !self.universe.contains_item(observation.item) {
                return Err(ModelError::OutOfBounds {
                    entity: "item",
                    id: observation.item,
                    limit: self.universe.num_items,
                });
            }
        }
        Ok(())
    }
}

/// One pass over every observation in stored order. Returns the RMSE of the
/// residuals measured before each update.
pub fn run_epoch(
    sgd: &BiasedSgd,
    matrices: &mut FeatureMatrices,
    observations: &ObservationLog,
) -> f64 {
    let mut accumulator = RmseAccumulator::new();
    for observation in observations {
        let err = sgd.step(
            matrices,
            observation.user as usize,
            observation.item_index(),
            f64::from(observation.rating),
        );
        accumulator.push(err);
    }
    accumulator.rmse()
}
