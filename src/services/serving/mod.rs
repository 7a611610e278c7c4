use crate::algorithms::ServingModel;
use crate::error::{ModelError, Result};
use crate::models::*;
use crate::services::persistence;
use crate::utils::metrics;
use std::path::Path;
use tracing::info;

/// Answers rating predictions from a trained or loaded model.
#[derive(Debug, Clone, Default)]
pub struct RatingPredictor {
    model: Option<ServingModel>,
    scale: RatingScale,
}

impl RatingPredictor {
    pub fn new(scale: RatingScale) -> Self {
        Self { model: None, scale }
    }

    pub fn with_model(model: ServingModel, scale: RatingScale) -> Self {
        Self {
            model: Some(model),
            scale,
        }
    }

    pub fn from_file(path: impl AsRef<Path>, scale: RatingScale) -> Result<Self> {
        let mut predictor = Self::new(scale);
        predictor.load(path)?;
        Ok(predictor)
    }

    /// Replaces the current model.
    pub fn install(&mut self, model: ServingModel) {
        info!(
            "Serving {} factors for {} users and {} items",
            model.factor_count(),
            model.universe().num_users,
            model.universe().num_items
        );
        self.model = Some(model);
    }

    /// A failed load leaves the current model in place.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let model = persistence::load_model(path)?;
        self.install(model);
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        persistence::save_model(self.model()?, path)
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Result<&ServingModel> {
        self.model.as_ref().ok_or(ModelError::NotReady)
    }

    pub fn scale(&self) -> RatingScale {
        self.scale
    }

    pub fn factor_count(&self) -> Result<usize> {
        Ok(self.model()?.factor_count())
    }

    /// Rating in `[scale.min, scale.max]` for a user id and 1-based item id.
    pub fn predict(&self, user: UserId, item: ItemId) -> Result<f64> {
        self.model()?.predict(user, item, &self.scale)
    }

    /// RMSE over held-out observations.
    pub fn evaluate<'a>(
        &self,
        observations: impl IntoIterator<Item = &'a Observation>,
    ) -> Result<f64> {
        metrics::evaluate(self.model()?, observations, &self.scale)
    }
}
