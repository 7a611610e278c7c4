use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use ratingsvd::algorithms::initializer::{training_rng, FactorInitializer};
use ratingsvd::algorithms::optimizer::BiasedSgd;
use ratingsvd::services::training::run_epoch;
use ratingsvd::*;
use rand::{Rng, SeedableRng};

const NUM_USERS: usize = 2_000;
const NUM_ITEMS: usize = 500;

fn synthetic_observations(count: usize) -> ObservationLog {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| {
            Observation::new(
                rng.gen_range(0..NUM_USERS as u32),
                rng.gen_range(1..=NUM_ITEMS as u32),
                rng.gen_range(1..=5),
            )
        })
        .collect::<Vec<_>>()
        .into()
}

fn benchmark_training(c: &mut Criterion) {
    let universe = Universe::new(NUM_USERS, NUM_ITEMS);
    let observations = synthetic_observations(100_000);
    let config = TrainingConfig::default().with_factor_count(32);
    let initializer =
        FactorInitializer::new(config.init_average, config.factor_count, config.init_noise);
    let sgd = BiasedSgd::new(&config);

    c.bench_function("sgd_epoch_100k_observations", |b| {
        b.iter_batched(
            || {
                let mut rng = training_rng(Some(1));
                FeatureMatrices::new(config.factor_count, &universe, &initializer, &mut rng)
            },
            |mut matrices| black_box(run_epoch(&sgd, &mut matrices, &observations)),
            BatchSize::LargeInput,
        );
    });
}

fn benchmark_prediction(c: &mut Criterion) {
    let universe = Universe::new(NUM_USERS, NUM_ITEMS);
    let config = TrainingConfig::default().with_factor_count(64);
    let initializer =
        FactorInitializer::new(config.init_average, config.factor_count, config.init_noise);
    let mut rng = training_rng(Some(2));
    let model =
        FeatureMatrices::new(config.factor_count, &universe, &initializer, &mut rng).narrow();
    let predictor = RatingPredictor::with_model(model, RatingScale::default());

    c.bench_function("predict_64_factors", |b| {
        let mut user = 0u32;
        b.iter(|| {
            user = (user + 1) % NUM_USERS as u32;
            black_box(predictor.predict(user, 1 + user % NUM_ITEMS as u32).unwrap())
        });
    });
}

fn benchmark_sorting(c: &mut Criterion) {
    let observations = synthetic_observations(200_000);

    c.bench_function("sort_item_index_200k", |b| {
        b.iter_batched(
            || ItemIndexedRatings::from_observations(observations.as_slice(), NUM_ITEMS),
            |mut index| black_box(index.sort()),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(
    benches,
    benchmark_training,
    benchmark_prediction,
    benchmark_sorting
);
criterion_main!(benches);
