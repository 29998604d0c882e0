//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{ForestConfig, MaxFeatures};
use crate::error::ForestError;
use crate::tree::{Tree, TreeParams};

/// A fitted Random Forest ensemble.
///
/// Carries only the trees and the trained feature/class dimensions; it
/// stores no vocabulary, so callers must pair a reloaded forest with the
/// encoder from the same training run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Forest {
    pub(crate) trees: Vec<Tree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

/// Metadata about a training run.
#[derive(Debug, Clone)]
pub struct TrainingMetadata {
    /// Number of trees trained.
    pub n_trees: usize,
    /// Number of feature columns.
    pub n_features: usize,
    /// Number of distinct classes.
    pub n_classes: usize,
    /// Number of training samples.
    pub n_samples: usize,
    /// Resolved max_features value used at each split.
    pub max_features_resolved: usize,
}

/// Result of Random Forest training: the fitted forest plus the accuracy
/// it achieves on its own training set.
#[derive(Debug)]
pub struct TrainingReport {
    forest: Forest,
    training_accuracy: f64,
    metadata: TrainingMetadata,
}

impl TrainingReport {
    /// Borrow the fitted forest.
    #[must_use]
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    /// Consume the report and return the fitted forest.
    #[must_use]
    pub fn into_forest(self) -> Forest {
        self.forest
    }

    /// Accuracy of the fitted forest on the training set.
    #[must_use]
    pub fn training_accuracy(&self) -> f64 {
        self.training_accuracy
    }

    /// Return training metadata.
    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }
}

/// Resolve a `MaxFeatures` strategy to a concrete per-split count.
pub(crate) fn resolve_max_features(
    max_features: MaxFeatures,
    n_features: usize,
) -> Result<usize, ForestError> {
    let resolved = match max_features {
        MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
        MaxFeatures::Log2 => (n_features as f64).log2().ceil().max(1.0) as usize,
        MaxFeatures::Fixed(n) => n,
        MaxFeatures::All => n_features,
    };
    if resolved == 0 || resolved > n_features {
        return Err(ForestError::InvalidMaxFeatures {
            max_features: resolved,
            n_features,
        });
    }
    Ok(resolved)
}

/// Draw a bootstrap sample of `n_samples` indices with replacement.
fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Train the Random Forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &ForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
) -> Result<TrainingReport, ForestError> {
    // --- Validate inputs ---
    if features.is_empty() {
        return Err(ForestError::EmptyTrainingSet);
    }
    let n_samples = features.len();
    if labels.len() != n_samples {
        return Err(ForestError::LabelCountMismatch {
            n_samples,
            n_labels: labels.len(),
        });
    }
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(ForestError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(ForestError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        for (feature_index, &val) in row.iter().enumerate() {
            if !val.is_finite() {
                return Err(ForestError::NonFiniteValue {
                    sample_index,
                    feature_index,
                });
            }
        }
    }

    // --- Validate config ---
    if let Some(d) = config.max_depth
        && d == 0
    {
        return Err(ForestError::InvalidMaxDepth { max_depth: 0 });
    }
    if config.min_samples_split < 2 {
        return Err(ForestError::InvalidMinSamplesSplit {
            min_samples_split: config.min_samples_split,
        });
    }
    if config.min_samples_leaf < 1 {
        return Err(ForestError::InvalidMinSamplesLeaf {
            min_samples_leaf: config.min_samples_leaf,
        });
    }
    let max_features_resolved = resolve_max_features(config.max_features, n_features)?;

    let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features = max_features_resolved,
        "training random forest"
    );

    // Column-major copy shared by every tree; bootstrap draws are index
    // multisets into it, so trees never copy the data.
    let columns: Vec<Vec<f64>> = (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect();

    let params = TreeParams {
        max_depth: config.max_depth,
        min_samples_split: config.min_samples_split,
        min_samples_leaf: config.min_samples_leaf,
        max_features: max_features_resolved,
    };

    // Per-tree seeds from the master RNG keep training deterministic
    // regardless of rayon's scheduling order.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    let trees: Vec<Tree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let samples = bootstrap_sample(n_samples, &mut rng);
            Tree::grow(&columns, labels, &samples, n_classes, params, rng.r#gen())
        })
        .collect();

    debug!(n_trees_trained = trees.len(), "tree training complete");

    let forest = Forest {
        trees,
        n_features,
        n_classes,
    };

    // Accuracy on the training set itself, reported back to the caller.
    let predictions = forest.predict_batch(features)?;
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|&(&p, &l)| p == l)
        .count();
    let training_accuracy = correct as f64 / n_samples as f64;

    info!(training_accuracy, "random forest training complete");

    Ok(TrainingReport {
        forest,
        training_accuracy,
        metadata: TrainingMetadata {
            n_trees: config.n_trees,
            n_features,
            n_classes,
            n_samples,
            max_features_resolved,
        },
    })
}
