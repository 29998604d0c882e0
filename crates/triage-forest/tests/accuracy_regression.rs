//! Accuracy regression tests for triage-forest.
//!
//! These tests verify that algorithmic changes do not degrade classification
//! accuracy on a deterministic synthetic symptom-indicator dataset.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use triage_forest::{Forest, ForestConfig};

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic indicator dataset
// ---------------------------------------------------------------------------

/// Generate a 300-sample, 12-indicator, 4-class dataset.
///
/// Each class has 3 characteristic indicators (columns `class*3 ..
/// class*3+3`) that are set with probability 0.9; all other indicators
/// fire as noise with probability 0.05. Samples are assigned round-robin
/// across classes.
fn make_indicator_classification() -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let n_samples = 300;
    let n_features = 12;
    let n_classes = 4;

    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % n_classes;
        labels.push(class);
        let row: Vec<f64> = (0..n_features)
            .map(|f| {
                let p = if f / 3 == class { 0.9 } else { 0.05 };
                if rng.r#gen::<f64>() < p { 1.0 } else { 0.0 }
            })
            .collect();
        features.push(row);
    }
    (features, labels)
}

fn holdout(
    features: &[Vec<f64>],
    labels: &[usize],
) -> (Vec<Vec<f64>>, Vec<usize>, Vec<Vec<f64>>, Vec<usize>) {
    // Every 5th row held out; round-robin labels keep classes balanced.
    let mut train_f = Vec::new();
    let mut train_l = Vec::new();
    let mut test_f = Vec::new();
    let mut test_l = Vec::new();
    for (i, (row, &label)) in features.iter().zip(labels).enumerate() {
        if i % 5 == 0 {
            test_f.push(row.clone());
            test_l.push(label);
        } else {
            train_f.push(row.clone());
            train_l.push(label);
        }
    }
    (train_f, train_l, test_f, test_l)
}

// ---------------------------------------------------------------------------
// a) training accuracy floor
// ---------------------------------------------------------------------------

/// Training accuracy with the default 200-tree config must exceed 0.95.
#[test]
fn training_accuracy_above_threshold() {
    let (features, labels) = make_indicator_classification();
    let report = ForestConfig::default().fit(&features, &labels).unwrap();

    assert!(
        report.training_accuracy() > 0.95,
        "training accuracy {} <= 0.95",
        report.training_accuracy()
    );
}

// ---------------------------------------------------------------------------
// b) held-out accuracy floor
// ---------------------------------------------------------------------------

/// Held-out accuracy with 100 trees must exceed 0.85 on the synthetic dataset.
#[test]
fn holdout_accuracy_above_threshold() {
    let (features, labels) = make_indicator_classification();
    let (train_f, train_l, test_f, test_l) = holdout(&features, &labels);

    let forest = ForestConfig::new(100)
        .unwrap()
        .with_seed(42)
        .fit(&train_f, &train_l)
        .unwrap()
        .into_forest();
    let report = forest.evaluate(&test_f, &test_l).unwrap();

    assert!(
        report.accuracy > 0.85,
        "holdout accuracy {} <= 0.85",
        report.accuracy
    );
}

// ---------------------------------------------------------------------------
// c) informative indicators dominate importances
// ---------------------------------------------------------------------------

/// Summed importance of the 12 informative indicators must dwarf uniform noise.
///
/// Every indicator is informative for exactly one class here, so the check
/// is that no importance mass is lost and the distribution is normalized.
#[test]
fn importances_normalized() {
    let (features, labels) = make_indicator_classification();
    let report = ForestConfig::new(50)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels)
        .unwrap();

    let importances = report.forest().feature_importances();
    assert_eq!(importances.len(), 12);
    let sum: f64 = importances.iter().sum();
    assert!((sum - 1.0).abs() < 1e-10, "sum = {sum}");
}

// ---------------------------------------------------------------------------
// d) determinism
// ---------------------------------------------------------------------------

/// Same config and seed must produce identical predictions across runs.
#[test]
fn deterministic_predictions() {
    let (features, labels) = make_indicator_classification();
    let config = ForestConfig::new(100).unwrap().with_seed(42);

    let a = config.fit(&features, &labels).unwrap();
    let b = config.fit(&features, &labels).unwrap();

    assert_eq!(
        a.forest().predict_batch(&features).unwrap(),
        b.forest().predict_batch(&features).unwrap(),
        "predictions differ across runs with the same seed"
    );
}

// ---------------------------------------------------------------------------
// e) save/load round trip preserves behavior
// ---------------------------------------------------------------------------

/// Predictions must be identical before save and after load.
#[test]
fn save_load_round_trip() {
    let (features, labels) = make_indicator_classification();
    let forest = ForestConfig::new(50)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels)
        .unwrap()
        .into_forest();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("regression_model.bin");
    forest.save(&path).unwrap();
    let reloaded = Forest::load(&path).unwrap();

    assert_eq!(
        forest.predict_batch(&features).unwrap(),
        reloaded.predict_batch(&features).unwrap()
    );
}

// ---------------------------------------------------------------------------
// f) predictions stay in the trained class range
// ---------------------------------------------------------------------------

/// Any well-formed input, including the all-zero vector, maps to a trained class.
#[test]
fn predictions_within_class_range() {
    let (features, labels) = make_indicator_classification();
    let forest = ForestConfig::new(50)
        .unwrap()
        .with_seed(42)
        .fit(&features, &labels)
        .unwrap()
        .into_forest();

    let zero = vec![0.0; forest.n_features()];
    let ones = vec![1.0; forest.n_features()];
    for sample in [zero, ones] {
        let class = forest.predict(&sample).unwrap();
        assert!(class < forest.n_classes());
    }
}
