pub mod initializer;
pub mod optimizer;

use nalgebra::{DMatrix, DVector};
use rand::Rng;

use crate::error::{ModelError, Result};
use crate::models::*;
use crate::utils::sequential_dot;

use initializer::FactorInitializer;

/// Working factors and biases in double precision.
///
/// Factor matrices are `K x entities` and column-major, so entity `e`'s
/// factors occupy `e * K .. (e + 1) * K` of the backing storage.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrices {
    factor_count: usize,
    pub(crate) user_factors: DMatrix<f64>,
    pub(crate) item_factors: DMatrix<f64>,
    pub(crate) user_bias: DVector<f64>,
    pub(crate) item_bias: DVector<f64>,
}

/// Single-precision factors and biases used to serve predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct ServingModel {
    factor_count: usize,
    user_factors: DMatrix<f32>,
    item_factors: DMatrix<f32>,
    user_bias: DVector<f32>,
    item_bias: DVector<f32>,
}

impl FeatureMatrices {
    /// Seeded factors, zero biases.
    pub fn new<R: Rng + ?Sized>(
        factor_count: usize,
        universe: &Universe,
        initializer: &FactorInitializer,
        rng: &mut R,
    ) -> Self {
        let user_factors = DMatrix::from_vec(
            factor_count,
            universe.num_users,
            initializer.fill(factor_count * universe.num_users, rng),
        );
        let item_factors = DMatrix::from_vec(
            factor_count,
            universe.num_items,
            initializer.fill(factor_count * universe.num_items, rng),
        );

        Self {
            factor_count,
            user_factors,
            item_factors,
            user_bias: DVector::zeros(universe.num_users),
            item_bias: DVector::zeros(universe.num_items),
        }
    }

    pub fn factor_count(&self) -> usize {
        self.factor_count
    }

    pub fn universe(&self) -> Universe {
        Universe::new(self.user_bias.len(), self.item_bias.len())
    }

    /// Unclamped score for 0-based indices.
    pub fn raw_score(&self, user_index: usize, item_index: usize) -> f64 {
        let dot = sequential_dot(
            self.item_factors.column(item_index).iter(),
            self.user_factors.column(user_index).iter(),
        );
        dot + (self.item_bias[item_index] + self.user_bias[user_index])
    }

    pub fn user_bias(&self, user_index: usize) -> f64 {
        self.user_bias[user_index]
    }

    pub fn item_bias(&self, item_index: usize) -> f64 {
        self.item_bias[item_index]
    }

    /// Narrows every value to `f32`. Consumes the working matrices, which
    /// are freed on return.
    pub fn narrow(self) -> ServingModel {
        ServingModel {
            factor_count: self.factor_count,
            user_factors: self.user_factors.map(|value| value as f32),
            item_factors: self.item_factors.map(|value| value as f32),
            user_bias: self.user_bias.map(|value| value as f32),
            item_bias: self.item_bias.map(|value| value as f32),
        }
    }
}

impl ServingModel {
    /// Assembles a model from flat arrays, checking that they agree on the
    /// factor count and entity counts.
    pub fn from_parts(
        factor_count: usize,
        user_factors: Vec<f32>,
        item_factors: Vec<f32>,
        user_bias: Vec<f32>,
        item_bias: Vec<f32>,
    ) -> Result<Self> {
        if factor_count == 0 {
            return Err(ModelError::Format("factor count is zero".to_string()));
        }

        let arrays = [
            ("user factors", user_factors.len()),
            ("item factors", item_factors.len()),
            ("user biases", user_bias.len()),
            ("item biases", item_bias.len()),
        ];
        if let Some((name, _)) = arrays.iter().find(|(_, len)| *len == 0) {
            return Err(ModelError::Format(format!("{} are missing", name)));
        }

        if user_factors.len() != user_bias.len() * factor_count {
            return Err(ModelError::Format(format!(
                "{} user factors do not match {} users of {} factors",
                user_factors.len(),
                user_bias.len(),
                factor_count
            )));
        }
        if item_factors.len() != item_bias.len() * factor_count {
            return Err(ModelError::Format(format!(
                "{} item factors do not match {} items of {} factors",
                item_factors.len(),
                item_bias.len(),
                factor_count
            )));
        }

        let num_users = user_bias.len();
        let num_items = item_bias.len();
        Ok(Self {
            factor_count,
            user_factors: DMatrix::from_vec(factor_count, num_users, user_factors),
            item_factors: DMatrix::from_vec(factor_count, num_items, item_factors),
            user_bias: DVector::from_vec(user_bias),
            item_bias: DVector::from_vec(item_bias),
        })
    }

    pub fn factor_count(&self) -> usize {
        self.factor_count
    }

    pub fn universe(&self) -> Universe {
        Universe::new(self.user_bias.len(), self.item_bias.len())
    }

    /// Flat `users x K` user factors.
    pub fn user_factors(&self) -> &[f32] {
        self.user_factors.as_slice()
    }

    /// Flat `items x K` item factors.
    pub fn item_factors(&self) -> &[f32] {
        self.item_factors.as_slice()
    }

    pub fn user_biases(&self) -> &[f32] {
        self.user_bias.as_slice()
    }

    pub fn item_biases(&self) -> &[f32] {
        self.item_bias.as_slice()
    }

    /// Unclamped score for 0-based indices.
    pub fn raw_score(&self, user_index: usize, item_index: usize) -> f64 {
        let dot = sequential_dot(
            self.item_factors.column(item_index).iter(),
            self.user_factors.column(user_index).iter(),
        );
        dot + (f64::from(self.item_bias[item_index]) + f64::from(self.user_bias[user_index]))
    }

    /// Predicted rating for an external user id and 1-based item id, clamped
    /// into `scale`.
    pub fn predict(&self, user: UserId, item: ItemId, scale: &RatingScale) -> Result<f64> {
        let universe = self.universe();
        if !universe.contains_user(user) {
            return Err(ModelError::OutOfBounds {
                entity: "user",
                id: user,
                limit: universe.num_users,
            });
        }
        if !universe.contains_item(item) {
            return Err(ModelError::OutOfBounds {
                entity: "item",
                id: item,
                limit: universe.num_items,
            });
        }

        Ok(scale.clamp(self.raw_score(user as usize, item_index(item))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::initializer::training_rng;

    fn matrices() -> FeatureMatrices {
        let initializer = FactorInitializer::new(4.0, 4, 0.0);
        FeatureMatrices::new(4, &Universe::new(2, 3), &initializer, &mut training_rng(Some(3)))
    }

    #[test]
    fn test_new_centers_prediction_on_average() {
        let matrices = matrices();
        assert_eq!(matrices.user_factors.len(), 8);
        assert_eq!(matrices.item_factors.len(), 12);
        assert_eq!(matrices.user_bias(1), 0.0);
        assert!((matrices.raw_score(1, 2) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_narrow_keeps_layout() {
        let mut matrices = matrices();
        matrices.user_factors[(2, 1)] = 0.75;
        matrices.item_bias[2] = -0.5;

        let model = matrices.narrow();
        assert_eq!(model.factor_count(), 4);
        assert_eq!(model.universe(), Universe::new(2, 3));
        assert_eq!(model.user_factors()[4 + 2], 0.75);
        assert_eq!(model.item_biases(), &[0.0, 0.0, -0.5]);
    }

    #[test]
    fn test_predict_clamps_and_checks_bounds() {
        let model = ServingModel::from_parts(
            1,
            vec![3.0, 1.0],
            vec![3.0, 0.1, 2.0],
            vec![0.0, 0.25],
            vec![0.0, 0.0, 0.25],
        )
        .unwrap();
        let scale = RatingScale::default();

        assert_eq!(model.predict(0, 1, &scale).unwrap(), 5.0);
        assert_eq!(model.predict(1, 2, &scale).unwrap(), 1.0);
        assert_eq!(model.predict(1, 3, &scale).unwrap(), 2.5);
        assert!(matches!(
            model.predict(2, 1, &scale),
            Err(ModelError::OutOfBounds { entity: "user", .. })
        ));
        assert!(matches!(
            model.predict(0, 0, &scale),
            Err(ModelError::OutOfBounds { entity: "item", .. })
        ));
    }

    #[test]
    fn test_from_parts_rejects_inconsistent_arrays() {
        let result = ServingModel::from_parts(2, vec![1.0; 3], vec![1.0; 2], vec![0.0], vec![0.0]);
        assert!(matches!(result, Err(ModelError::Format(_))));

        let result = ServingModel::from_parts(2, vec![1.0; 2], vec![1.0; 2], vec![0.0], vec![]);
        assert!(matches!(result, Err(ModelError::Format(_))));
    }
}
