//! Deterministic train/test partitioning of the encoded dataset.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::DataError;

/// An encoded dataset partitioned into disjoint train and test subsets.
///
/// Row-to-label correspondence is preserved within each partition, and
/// the union of the two partitions is exactly the input.
#[derive(Debug)]
pub struct SplitDataset {
    /// Training rows (row-major).
    pub train_features: Vec<Vec<f64>>,
    /// Held-out test rows (row-major).
    pub test_features: Vec<Vec<f64>>,
    /// Class indices aligned with `train_features`.
    pub train_labels: Vec<usize>,
    /// Class indices aligned with `test_features`.
    pub test_labels: Vec<usize>,
}

impl SplitDataset {
    /// Return the number of training rows.
    #[must_use]
    pub fn n_train(&self) -> usize {
        self.train_features.len()
    }

    /// Return the number of test rows.
    #[must_use]
    pub fn n_test(&self) -> usize {
        self.test_features.len()
    }
}

/// Partition `(features, labels)` pairs into train and test subsets.
///
/// Shuffles row indices with a seeded RNG, assigns
/// `ceil(n * test_fraction)` rows to the test partition, and keeps the
/// remainder for training. The same seed and input order always produce
/// the identical partition, so evaluations are reproducible across runs.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DataError::RowLabelMismatch`] | `features` and `labels` lengths differ |
/// | [`DataError::InvalidTestFraction`] | `test_fraction` outside (0.0, 1.0) |
/// | [`DataError::InsufficientData`] | either partition would be empty |
pub fn train_test_split(
    features: &[Vec<f64>],
    labels: &[usize],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitDataset, DataError> {
    if features.len() != labels.len() {
        return Err(DataError::RowLabelMismatch {
            n_rows: features.len(),
            n_labels: labels.len(),
        });
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DataError::InvalidTestFraction {
            fraction: test_fraction,
        });
    }

    let n_samples = features.len();
    let n_test = ((n_samples as f64) * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(DataError::InsufficientData {
            n_samples,
            test_fraction,
        });
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_indices, train_indices) = indices.split_at(n_test);

    let train_features = train_indices.iter().map(|&i| features[i].clone()).collect();
    let train_labels = train_indices.iter().map(|&i| labels[i]).collect();
    let test_features = test_indices.iter().map(|&i| features[i].clone()).collect();
    let test_labels = test_indices.iter().map(|&i| labels[i]).collect();

    debug!(
        n_samples,
        n_train = n_samples - n_test,
        n_test,
        seed,
        "dataset split"
    );

    Ok(SplitDataset {
        train_features,
        test_features,
        train_labels,
        test_labels,
    })
}
