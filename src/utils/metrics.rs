use serde::{Deserialize, Serialize};

use crate::algorithms::ServingModel;
use crate::error::Result;
use crate::models::{Observation, RatingScale};

/// Running root-mean-square of residual errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RmseAccumulator {
    squared_error: f64,
    count: usize,
}

impl RmseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, residual_error: f64) {
        self.squared_error += residual_error * residual_error;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Zero when nothing was pushed.
    #[must_use]
    pub fn rmse(&self) -> f64 {
        (self.squared_error / self.count.max(1) as f64).sqrt()
    }
}

/// Probe RMSE of a serving model over held-out observations.
pub fn evaluate<'a>(
    model: &ServingModel,
    observations: impl IntoIterator<Item = &'a Observation>,
    scale: &RatingScale,
) -> Result<f64> {
    let mut accumulator = RmseAccumulator::new();
    for observation in observations {
        let predicted = model.predict(observation.user, observation.item, scale)?;
        accumulator.push(f64::from(observation.rating) - predicted);
    }
    Ok(accumulator.rmse())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rmse_accumulator() {
        let mut accumulator = RmseAccumulator::new();
        assert_eq!(accumulator.rmse(), 0.0);

        accumulator.push(3.0);
        accumulator.push(-4.0);
        assert_eq!(accumulator.count(), 2);
        assert!((accumulator.rmse() - 12.5f64.sqrt()).abs() < 1e-12);
    }
}
