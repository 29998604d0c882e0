//! Configuration builder for Random Forest training.

use crate::error::ForestError;
use crate::forest::TrainingReport;

/// Strategy for determining the number of features to consider at each split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// Square root of total features.
    Sqrt,
    /// Log base 2 of total features.
    Log2,
    /// A fixed count.
    Fixed(usize),
    /// All features (no subsampling).
    All,
}

/// Configuration for Random Forest training.
///
/// Construct via [`ForestConfig::new`], then chain `with_*` methods.
/// [`ForestConfig::default`] is the diagnosis-service configuration.
///
/// # Defaults
///
/// | Parameter           | Default    |
/// |---------------------|------------|
/// | `n_trees`           | 200        |
/// | `max_depth`         | `Some(20)` |
/// | `min_samples_split` | 5          |
/// | `min_samples_leaf`  | 2          |
/// | `max_features`      | `Sqrt`     |
/// | `seed`              | 42         |
#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) seed: u64,
}

impl ForestConfig {
    /// Create a new config with the given number of trees and the default
    /// hyperparameters.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, ForestError> {
        if n_trees == 0 {
            return Err(ForestError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            max_depth: Some(20),
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        })
    }

    // --- Setters ---

    /// Set the max features strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the maximum tree depth. `None` means unlimited.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples required in each leaf after a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the max features strategy.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the minimum samples required to split a node.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the minimum samples required in each leaf.
    #[must_use]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train a Random Forest on the provided dataset.
    ///
    /// `features[sample_idx][feature_idx]` — row-major layout.
    /// `labels[sample_idx]` — class indices (zero-based, dense).
    ///
    /// # Errors
    ///
    /// | Variant                                | When                                             |
    /// |----------------------------------------|--------------------------------------------------|
    /// | [`ForestError::EmptyTrainingSet`]      | `features` is empty                              |
    /// | [`ForestError::LabelCountMismatch`]    | row and label counts disagree                    |
    /// | [`ForestError::ZeroFeatures`]          | rows have zero feature columns                   |
    /// | [`ForestError::FeatureCountMismatch`]  | rows have inconsistent lengths                   |
    /// | [`ForestError::NonFiniteValue`]        | any value is NaN or infinite                     |
    /// | [`ForestError::InvalidMaxDepth`]       | `max_depth` is `Some(0)`                         |
    /// | [`ForestError::InvalidMinSamplesSplit`]| `min_samples_split` < 2                          |
    /// | [`ForestError::InvalidMinSamplesLeaf`] | `min_samples_leaf` < 1                           |
    /// | [`ForestError::InvalidMaxFeatures`]    | resolved max_features is outside [1, n_features] |
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
    ) -> Result<TrainingReport, ForestError> {
        crate::forest::train(self, features, labels)
    }
}

impl Default for ForestConfig {
    /// The configuration used by the diagnosis service: 200 trees, depth 20,
    /// split 5, leaf 2, seed 42.
    fn default() -> Self {
        Self::new(200).expect("200 is a valid tree count")
    }
}
