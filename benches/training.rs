use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use plasmidminer::training::{
    Classifier, KernelType, LogisticRegression, RVCConfig, RandomForest, RelevanceVectorClassifier, SVMClassifier,
    SVMConfig,
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_classification_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let y = Array1::from_shape_fn(n_rows, |i| (i % 2) as f64);
    let x = Array2::from_shape_fn((n_rows, n_features), |(i, _)| {
        let shift = if y[i] > 0.5 { 1.0 } else { -1.0 };
        shift + rng.gen::<f64>() * 2.0 - 1.0
    });

    (x, y)
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [100, 500, 1000].iter() {
        let data = create_classification_data(*n_rows, 20);

        group.bench_with_input(BenchmarkId::new("random_forest", n_rows), &data, |b, (x, y)| {
            b.iter(|| {
                let mut model = RandomForest::new(100).with_random_state(1);
                model.fit(black_box(x), black_box(y)).unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("logistic_regression", n_rows), &data, |b, (x, y)| {
            b.iter(|| {
                let mut model = LogisticRegression::new();
                model.fit(black_box(x), black_box(y)).unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("svc_rbf", n_rows), &data, |b, (x, y)| {
            b.iter(|| {
                let mut model = SVMClassifier::new(SVMConfig {
                    kernel: KernelType::RBF { gamma: 0.05 },
                    random_state: Some(1),
                    ..Default::default()
                });
                model.fit(black_box(x), black_box(y)).unwrap()
            })
        });
    }

    // RVC is cubic in the number of samples
    for n_rows in [50, 100, 200].iter() {
        let data = create_classification_data(*n_rows, 20);
        group.bench_with_input(BenchmarkId::new("rvc_rbf", n_rows), &data, |b, (x, y)| {
            b.iter(|| {
                let mut model = RelevanceVectorClassifier::new(RVCConfig {
                    kernel: KernelType::RBF { gamma: 0.05 },
                    ..Default::default()
                });
                model.fit(black_box(x), black_box(y)).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train model once
    let (x_train, y_train) = create_classification_data(1000, 20);
    let mut forest = RandomForest::new(100).with_random_state(1);
    forest.fit(&x_train, &y_train).unwrap();

    for n_rows in [100, 1000, 10000].iter() {
        let (x_test, _) = create_classification_data(*n_rows, 20);

        group.bench_with_input(BenchmarkId::new("random_forest_proba", n_rows), &x_test, |b, x| {
            b.iter(|| forest.predict_proba(black_box(x)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
