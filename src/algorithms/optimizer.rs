use crate::algorithms::FeatureMatrices;
use crate::config::{BiasUpdate, TrainingConfig};
use crate::utils::sequential_dot;

/// Regularized SGD step for biased matrix factorization.
///
/// For one observation `(u, i, r)`:
///
/// ```text
/// p   = dot(item[i], user[u]) + (item_bias[i] + user_bias[u])
/// err = r - p
/// user[u][f] += lr * (err * item[i][f] - k_u * user[u][f])
/// item[i][f] += lr * (err * user[u][f] - k_i * item[i][f])
/// item_bias[i] += lr * (err - k_b * (user_bias[u] + item_bias[i] - mean))
/// user_bias[u] += lr * (err - k_b * (user_bias[u] + item_bias[i] - mean))
/// ```
///
/// Each factor pair is updated from its own pre-update values. The bias pair
/// reads pre-update values too unless [`BiasUpdate::Sequential`] is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasedSgd {
    learning_rate: f64,
    user_regularization: f64,
    item_regularization: f64,
    bias_regularization: f64,
    bias_target: f64,
    bias_update: BiasUpdate,
}

impl BiasedSgd {
    pub fn new(config: &TrainingConfig) -> Self {
        Self {
            learning_rate: config.learning_rate,
            user_regularization: config.user_regularization,
            item_regularization: config.item_regularization,
            bias_regularization: config.bias_regularization,
            bias_target: config.global_mean,
            bias_update: config.bias_update,
        }
    }

    /// Applies one update and returns the residual error measured before it.
    pub fn step(
        &self,
        matrices: &mut FeatureMatrices,
        user_index: usize,
        item_index: usize,
        rating: f64,
    ) -> f64 {
        let lr = self.learning_rate;
        let mut user = matrices.user_factors.column_mut(user_index);
        let mut item = matrices.item_factors.column_mut(item_index);

        let mut prediction = sequential_dot(item.iter(), user.iter());
        prediction += matrices.item_bias[item_index] + matrices.user_bias[user_index];
        let err = rating - prediction;

        for (uf, mf) in user.iter_mut().zip(item.iter_mut()) {
            let (user_old, item_old) = (*uf, *mf);
            *uf += lr * (err * item_old - self.user_regularization * user_old);
            *mf += lr * (err * user_old - self.item_regularization * item_old);
        }

        let pull = matrices.user_bias[user_index] + matrices.item_bias[item_index]
            - self.bias_target;
        matrices.item_bias[item_index] += lr * (err - self.bias_regularization * pull);

        let pull = match self.bias_update {
            BiasUpdate::Simultaneous => pull,
            BiasUpdate::Sequential => {
                matrices.user_bias[user_index] + matrices.item_bias[item_index] - self.bias_target
            }
        };
        matrices.user_bias[user_index] += lr * (err - self.bias_regularization * pull);

        err
    }
}
