use crate::config::TrainingConfig;
use crate::models::*;
use anyhow::{anyhow, Result};

pub fn validate_training_config(config: &TrainingConfig) -> Result<()> {
    if config.factor_count == 0 {
        return Err(anyhow!("Factor count must be greater than 0"));
    }

    if config.factor_count > u32::MAX as usize {
        return Err(anyhow!("Factor count does not fit the artifact header"));
    }

    if config.max_epochs == 0 {
        return Err(anyhow!("Max epochs must be greater than 0"));
    }

    if !config.learning_rate.is_finite() || config.learning_rate <= 0.0 {
        return Err(anyhow!("Learning rate must be a positive finite number"));
    }

    let regularizations = [
        ("user", config.user_regularization),
        ("item", config.item_regularization),
        ("bias", config.bias_regularization),
    ];
    for (name, value) in regularizations {
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow!(
                "{} regularization must be a non-negative finite number",
                name
            ));
        }
    }

    if !config.global_mean.is_finite() {
        return Err(anyhow!("Global mean must be finite"));
    }

    if !config.init_average.is_finite() || config.init_average < 0.0 {
        return Err(anyhow!("Init average must be a non-negative finite number"));
    }

    if !config.init_noise.is_finite() || config.init_noise < 0.0 {
        return Err(anyhow!("Init noise must be a non-negative finite number"));
    }

    if config.min_improvement.is_nan() {
        return Err(anyhow!("Min improvement cannot be NaN"));
    }

    if let Some(initial_rmse) = config.initial_rmse {
        if !initial_rmse.is_finite() {
            return Err(anyhow!("Initial RMSE must be finite"));
        }
    }

    Ok(())
}

pub fn validate_rating_scale(scale: &RatingScale) -> Result<()> {
    if !scale.min.is_finite() || !scale.max.is_finite() {
        return Err(anyhow!("Rating scale bounds must be finite"));
    }

    if scale.min > scale.max {
        return Err(anyhow!(
            "Rating scale minimum {} exceeds maximum {}",
            scale.min,
            scale.max
        ));
    }

    Ok(())
}

pub fn validate_observation(
    observation: &Observation,
    universe: &Universe,
    scale: &RatingScale,
) -> Result<()> {
    if !universe.contains_user(observation.user) {
        return Err(anyhow!(
            "User ID {} outside of {} users",
            observation.user,
            universe.num_users
        ));
    }

    if !universe.contains_item(observation.item) {
        return Err(anyhow!(
            "Item ID {} outside of 1..={}",
            observation.item,
            universe.num_items
        ));
    }

    if !scale.contains(observation.rating) {
        return Err(anyhow!(
            "Rating {} outside of [{}, {}]",
            observation.rating,
            scale.min,
            scale.max
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_training_config_is_valid() {
        assert!(validate_training_config(&TrainingConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_zero_factor_count() {
        let config = TrainingConfig::default().with_factor_count(0);
        assert!(validate_training_config(&config).is_err());
    }

    #[test]
    fn test_rejects_negative_regularization() {
        let config = TrainingConfig {
            bias_regularization: -0.1,
            ..TrainingConfig::default()
        };
        assert!(validate_training_config(&config).is_err());
    }

    #[test]
    fn test_rejects_inverted_scale() {
        assert!(validate_rating_scale(&RatingScale::new(5.0, 1.0)).is_err());
        assert!(validate_rating_scale(&RatingScale::default()).is_ok());
    }

    #[test]
    fn test_validate_observation() {
        let universe = Universe::new(2, 3);
        let scale = RatingScale::default();

        assert!(validate_observation(&Observation::new(1, 3, 5), &universe, &scale).is_ok());
        assert!(validate_observation(&Observation::new(2, 1, 5), &universe, &scale).is_err());
        assert!(validate_observation(&Observation::new(0, 0, 5), &universe, &scale).is_err());
        assert!(validate_observation(&Observation::new(0, 4, 5), &universe, &scale).is_err());
        assert!(validate_observation(&Observation::new(0, 1, 0), &universe, &scale).is_err());
    }
}
