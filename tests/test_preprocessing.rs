//! Integration test: subsampling and splitting properties

use ndarray::{Array1, Array2};
use plasmidminer::error::MinerError;
use plasmidminer::preprocessing::train_test_split;
use plasmidminer::synthetic::{class_counts, BalancedSubsampler, RandomSubsampler, Sampler};

fn imbalanced(n_pos: usize, n_neg: usize) -> (Array2<f64>, Array1<f64>) {
    let n = n_pos + n_neg;
    let x = Array2::from_shape_fn((n, 3), |(i, j)| (i * 3 + j) as f64);
    let y = Array1::from_shape_fn(n, |i| if i < n_pos { 1.0 } else { 0.0 });
    (x, y)
}

#[test]
fn test_balanced_subsample_equalizes_classes() {
    for (n_pos, n_neg, fraction, expected) in [
        (30, 10, 1.0, 10),
        (30, 10, 0.5, 5),
        (7, 50, 0.3, 2),
        (12, 12, 1.0, 12),
    ] {
        let (x, y) = imbalanced(n_pos, n_neg);
        let result = BalancedSubsampler::new()
            .with_subsample_size(fraction)
            .with_seed(17)
            .resample(&x, &y)
            .unwrap();

        let counts = class_counts(&result.y);
        assert_eq!(counts.get(&0), Some(&expected));
        assert_eq!(counts.get(&1), Some(&expected));
        assert!(result.y.len() <= y.len());
        assert_eq!(result.x.nrows(), result.y.len());

        // Every output row is a copy of its source row
        for (out_row, &src) in result.indices.iter().enumerate() {
            assert_eq!(result.x.row(out_row), x.row(src));
            assert_eq!(result.y[out_row], y[src]);
        }
    }
}

#[test]
fn test_balanced_subsample_is_seeded() {
    let (x, y) = imbalanced(40, 20);
    let sampler = BalancedSubsampler::new().with_subsample_size(0.5).with_seed(8);
    let a = sampler.resample(&x, &y).unwrap();
    let b = sampler.resample(&x, &y).unwrap();
    assert_eq!(a.indices, b.indices);
}

#[test]
fn test_balanced_subsample_rejects_bad_input() {
    let (x, y) = imbalanced(5, 5);
    for fraction in [0.0, -0.5, 1.5] {
        let result = BalancedSubsampler::new().with_subsample_size(fraction).resample(&x, &y);
        assert!(matches!(result, Err(MinerError::ValidationError(_))), "fraction {}", fraction);
    }
    // 5 * 0.1 rounds down to zero rows per class
    assert!(BalancedSubsampler::new().with_subsample_size(0.1).resample(&x, &y).is_err());

    let empty_x = Array2::<f64>::zeros((0, 3));
    let empty_y = Array1::<f64>::zeros(0);
    assert!(BalancedSubsampler::new().resample(&empty_x, &empty_y).is_err());
}

#[test]
fn test_random_subsample_keeps_fraction() {
    let (x, y) = imbalanced(30, 70);
    let result = RandomSubsampler::new(0.25).with_seed(2).resample(&x, &y).unwrap();
    assert_eq!(result.y.len(), 25);
    assert!(result.indices.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_split_sizes() {
    for (n, test_size, expected_test) in [(20, 0.3, 6), (10, 0.25, 3), (7, 0.5, 4), (100, 0.01, 1)] {
        let (x, y) = imbalanced(n / 2, n - n / 2);
        let split = train_test_split(&x, &y, test_size, Some(1)).unwrap();
        assert_eq!(split.n_test(), expected_test);
        assert_eq!(split.n_train() + split.n_test(), n);
        assert_eq!(split.x_train.nrows(), split.y_train.len());
        assert_eq!(split.x_test.nrows(), split.y_test.len());
    }
}

#[test]
fn test_split_partitions_rows() {
    let (x, y) = imbalanced(10, 10);
    let split = train_test_split(&x, &y, 0.3, Some(9)).unwrap();

    // First column is 3 * source row, so it identifies rows uniquely
    let mut seen: Vec<f64> = split
        .x_train
        .column(0)
        .iter()
        .chain(split.x_test.column(0).iter())
        .copied()
        .collect();
    seen.sort_by(f64::total_cmp);
    let expected: Vec<f64> = (0..20).map(|i| (i * 3) as f64).collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_split_rejects_degenerate_sizes() {
    let (x, y) = imbalanced(2, 2);
    assert!(train_test_split(&x, &y, 0.0, None).is_err());
    assert!(train_test_split(&x, &y, 1.0, None).is_err());
    // ceil(0.9 * 4) = 4 leaves no training rows
    assert!(train_test_split(&x, &y, 0.9, None).is_err());
}
