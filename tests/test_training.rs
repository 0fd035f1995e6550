//! Integration test: estimators and randomized search

use ndarray::{Array1, Array2};
use plasmidminer::error::MinerError;
use plasmidminer::optimizer::{
    ParameterValue, RandomizedSearch, SamplerType, SearchConfig, SearchSpace, TrialParams,
};
use plasmidminer::training::{
    Algorithm, Classifier, Estimator, KernelType, LogisticRegression, MaxFeatures, RVCConfig, RandomForest,
    RelevanceVectorClassifier, SVMClassifier, SVMConfig, Solver,
};

/// Two well separated clusters, alternating labels
fn two_clusters(n: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n, 3), |(i, j)| {
        let offset = if i % 2 == 1 { 3.0 } else { 0.0 };
        offset + ((i * 7 + j * 3) % 11) as f64 * 0.05
    });
    let y = Array1::from_shape_fn(n, |i| (i % 2) as f64);
    (x, y)
}

fn assert_separates<E: Classifier>(model: &mut E, name: &str) {
    let (x, y) = two_clusters(30);
    model.fit(&x, &y).unwrap();

    let accuracy = model.score(&x, &y).unwrap();
    assert!(accuracy >= 0.95, "{} accuracy {}", name, accuracy);

    let proba = model.predict_proba(&x).unwrap();
    assert_eq!(proba.len(), 30);
    assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)), "{} probabilities out of range", name);
}

#[test]
fn test_random_forest_separates_clusters() {
    let mut model = RandomForest::new(25)
        .with_max_features(MaxFeatures::Sqrt)
        .with_random_state(1);
    assert_separates(&mut model, "random forest");
}

#[test]
fn test_logistic_regression_solvers_separate_clusters() {
    for solver in [Solver::NewtonCg, Solver::Lbfgs, Solver::Liblinear, Solver::Sag] {
        let mut model = LogisticRegression::new().with_solver(solver).with_c(10.0).with_random_state(3);
        assert_separates(&mut model, solver.name());
    }
}

#[test]
fn test_svc_kernels_separate_clusters() {
    for kernel in [KernelType::Linear, KernelType::RBF { gamma: 0.5 }] {
        let mut model = SVMClassifier::new(SVMConfig {
            c: 1.0,
            kernel,
            random_state: Some(2),
            ..Default::default()
        });
        assert_separates(&mut model, kernel.name());
        assert!(model.n_support_vectors() > 0);
    }
}

#[test]
fn test_rvc_is_sparse() {
    let mut model = RelevanceVectorClassifier::new(RVCConfig {
        kernel: KernelType::RBF { gamma: 0.5 },
        ..Default::default()
    });
    assert_separates(&mut model, "rvc");
    assert!(model.n_relevance_vectors() < 30);
}

#[test]
fn test_unfitted_models_refuse_to_predict() {
    let (x, _) = two_clusters(4);
    assert!(matches!(RandomForest::new(3).predict(&x), Err(MinerError::ModelNotFitted)));
    assert!(matches!(LogisticRegression::new().predict(&x), Err(MinerError::ModelNotFitted)));
    assert!(matches!(
        SVMClassifier::new(SVMConfig::default()).predict(&x),
        Err(MinerError::ModelNotFitted)
    ));
    assert!(matches!(
        RelevanceVectorClassifier::new(RVCConfig::default()).predict(&x),
        Err(MinerError::ModelNotFitted)
    ));
}

#[test]
fn test_search_candidate_count_and_best_score() {
    let (x, y) = two_clusters(24);
    let space = SearchSpace::new()
        .choice("C", vec![0.01, 0.1, 1.0, 10.0])
        .choice("solver", vec!["lbfgs", "newton-cg"]);

    // Grid of 8, fewer iterations than the grid
    let search = RandomizedSearch::new(space.clone(), SearchConfig::new().with_n_iter(5).with_random_state(4));
    let fitted = search
        .fit(|p| Algorithm::LogisticRegression.estimator_from_params(&with_lr_defaults(p), None), &x, &y)
        .unwrap();
    assert_eq!(fitted.results.candidates.len(), 5);

    let max_mean = fitted
        .results
        .candidates
        .iter()
        .map(|c| c.cv.mean_score)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(fitted.results.best_score(), max_mean);
    assert!(matches!(fitted.best_estimator, Estimator::LogisticRegression(_)));

    // Grid smaller than n_iter: every grid point once
    let search = RandomizedSearch::new(space, SearchConfig::new().with_n_iter(50).with_random_state(4));
    let fitted = search
        .fit(|p| Algorithm::LogisticRegression.estimator_from_params(&with_lr_defaults(p), None), &x, &y)
        .unwrap();
    assert_eq!(fitted.results.candidates.len(), 8);
}

fn with_lr_defaults(params: &TrialParams) -> TrialParams {
    let mut params = params.clone();
    params.entry("dual".to_string()).or_insert(ParameterValue::Bool(false));
    params.entry("tol".to_string()).or_insert(ParameterValue::Float(1e-4));
    params
}

#[test]
fn test_latin_hypercube_search_on_forest_space() {
    let (x, y) = two_clusters(24);
    let space = SearchSpace::new()
        .int_uniform("n_estimators", 5, 15)
        .int_uniform("min_samples_leaf", 1, 5);

    let config = SearchConfig::new()
        .with_n_iter(4)
        .with_sampler(SamplerType::LatinHypercube)
        .with_random_state(6);
    let fitted = RandomizedSearch::new(space, config)
        .fit(
            |p| {
                let n_trees = p["n_estimators"].as_int().unwrap_or(10) as usize;
                let leaf = p["min_samples_leaf"].as_int().unwrap_or(1) as usize;
                Ok(RandomForest::new(n_trees).with_min_samples_leaf(leaf).with_random_state(0))
            },
            &x,
            &y,
        )
        .unwrap();

    assert_eq!(fitted.results.candidates.len(), 4);
    // One candidate per stratum of each parameter
    let mut leaves: Vec<i64> = fitted
        .results
        .candidates
        .iter()
        .map(|c| c.params["min_samples_leaf"].as_int().unwrap())
        .collect();
    leaves.sort_unstable();
    assert_eq!(leaves, vec![1, 2, 3, 4]);
    assert!(fitted.best_estimator.n_trees() >= 5);
}

#[test]
fn test_estimator_serde_round_trip_keeps_predictions() {
    let (x, y) = two_clusters(20);
    let mut model = Estimator::Svc(SVMClassifier::new(SVMConfig {
        kernel: KernelType::RBF { gamma: 0.2 },
        random_state: Some(1),
        ..Default::default()
    }));
    model.fit(&x, &y).unwrap();

    let json = serde_json::to_string(&model).unwrap();
    let restored: Estimator = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.kind(), "SVC");
    assert_eq!(restored.predict(&x).unwrap(), model.predict(&x).unwrap());
}
