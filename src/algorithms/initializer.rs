use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeds factors so that the initial dot product of a user and an item sits
/// near the average rating: every factor is `sqrt(average / K)` plus uniform
/// noise in `[-noise, noise]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorInitializer {
    base: f64,
    noise: f64,
}

impl FactorInitializer {
    pub fn new(average: f64, factor_count: usize, noise: f64) -> Self {
        Self {
            base: (average / factor_count as f64).sqrt(),
            noise,
        }
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.base + rng.gen_range(-self.noise..=self.noise)
    }

    /// `rows * factor_count` values, row-major by entity.
    pub fn fill<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> Vec<f64> {
        (0..len).map(|_| self.sample(rng)).collect()
    }
}

/// Deterministic when seeded, OS entropy otherwise.
pub fn training_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
