//! Prediction and evaluation for the Random Forest ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::instrument;

use crate::error::ForestError;
use crate::forest::Forest;
use crate::metrics::{ClassReport, ConfusionMatrix};

/// Result of evaluating a fitted forest on a held-out set.
#[derive(Debug)]
pub struct EvaluationReport {
    /// Proportion of correct predictions.
    pub accuracy: f64,
    /// Per-class precision, recall, F1, and support.
    pub class_report: Vec<ClassReport>,
    /// The full confusion matrix the report was derived from.
    pub confusion: ConfusionMatrix,
}

impl Forest {
    /// Predict the class index for a single sample by majority vote.
    ///
    /// Each tree casts one vote for a class; the class with the most votes
    /// wins, with ties broken toward the lowest class index so the result
    /// is deterministic. The returned index is always within
    /// `[0, n_classes)`.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::FeatureWidthMismatch`] when `sample.len()`
    /// differs from the width the forest was trained on.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, ForestError> {
        if sample.len() != self.n_features {
            return Err(ForestError::FeatureWidthMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }

        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.predict(sample)] += 1;
        }

        let mut winner = 0usize;
        let mut most = 0usize;
        for (class, &count) in votes.iter().enumerate() {
            if count > most {
                most = count;
                winner = class;
            }
        }
        Ok(winner)
    }

    /// Predict class indices for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::FeatureWidthMismatch`] if any sample has the
    /// wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, ForestError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Evaluate prediction quality on a held-out test set.
    ///
    /// Read-only: the forest is not modified. Works identically for a
    /// freshly trained forest and one reloaded from disk.
    ///
    /// The report covers the trained classes plus any label observed only
    /// in the test set, so a rare class confined to the held-out split
    /// still evaluates (counted as misclassified, since the forest can
    /// never predict it).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::EmptyEvaluationSet`] | Zero test rows |
    /// | [`ForestError::LabelCountMismatch`] | Row and label counts disagree |
    /// | [`ForestError::FeatureWidthMismatch`] | A row has the wrong width |
    #[instrument(skip_all, fields(n_test = test_features.len()))]
    pub fn evaluate(
        &self,
        test_features: &[Vec<f64>],
        test_labels: &[usize],
    ) -> Result<EvaluationReport, ForestError> {
        if test_features.is_empty() {
            return Err(ForestError::EmptyEvaluationSet);
        }
        if test_features.len() != test_labels.len() {
            return Err(ForestError::LabelCountMismatch {
                n_samples: test_features.len(),
                n_labels: test_labels.len(),
            });
        }

        let predictions = self.predict_batch(test_features)?;
        let n_classes = test_labels
            .iter()
            .max()
            .map_or(self.n_classes, |&label| self.n_classes.max(label + 1));
        let confusion = ConfusionMatrix::from_predictions(test_labels, &predictions, n_classes)?;

        Ok(EvaluationReport {
            accuracy: confusion.accuracy(),
            class_report: confusion.class_report(),
            confusion,
        })
    }

    /// Mean Decrease in Impurity importances averaged over all trees,
    /// normalized to sum to 1.0 (all zeros if no tree ever split).
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for tree in &self.trees {
            for (i, v) in tree.feature_importances().iter().enumerate() {
                totals[i] += v;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the feature width this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForestConfig, MaxFeatures};

    fn train_forest() -> Forest {
        // 3 classes keyed by which indicator is set.
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for class in 0..3usize {
            for _ in 0..10 {
                let mut row = vec![0.0; 3];
                row[class] = 1.0;
                features.push(row);
                labels.push(class);
            }
        }
        ForestConfig::new(25)
            .unwrap()
            .with_min_samples_split(2)
            .with_min_samples_leaf(1)
            .with_max_features(MaxFeatures::All)
            .with_seed(42)
            .fit(&features, &labels)
            .unwrap()
            .into_forest()
    }

    #[test]
    fn prediction_stays_in_class_range() {
        let forest = train_forest();
        // Including the all-zero vector from an all-unknown symptom set.
        for sample in [
            vec![0.0, 0.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![1.0, 1.0, 1.0],
        ] {
            let class = forest.predict(&sample).unwrap();
            assert!(class < forest.n_classes());
        }
    }

    #[test]
    fn indicator_prototypes_recovered() {
        let forest = train_forest();
        assert_eq!(forest.predict(&[1.0, 0.0, 0.0]).unwrap(), 0);
        assert_eq!(forest.predict(&[0.0, 1.0, 0.0]).unwrap(), 1);
        assert_eq!(forest.predict(&[0.0, 0.0, 1.0]).unwrap(), 2);
    }

    #[test]
    fn batch_matches_individual() {
        let forest = train_forest();
        let samples = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0],
        ];
        let batch = forest.predict_batch(&samples).unwrap();
        for (i, sample) in samples.iter().enumerate() {
            assert_eq!(batch[i], forest.predict(sample).unwrap());
        }
    }

    #[test]
    fn wrong_width_is_rejected() {
        let forest = train_forest();
        let err = forest.predict(&[1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            ForestError::FeatureWidthMismatch {
                expected: 3,
                got: 2
            }
        ));
    }

    #[test]
    fn evaluate_reports_per_class_metrics() {
        let forest = train_forest();
        let test_features = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        let test_labels = vec![0, 1, 2];
        let report = forest.evaluate(&test_features, &test_labels).unwrap();
        assert!((report.accuracy - 1.0).abs() < f64::EPSILON);
        assert_eq!(report.class_report.len(), 3);
        assert_eq!(report.confusion.n_classes(), 3);
    }

    #[test]
    fn evaluate_covers_labels_beyond_trained_classes() {
        // Class 3 never appeared in training; the report must still cover
        // it instead of rejecting the test set.
        let forest = train_forest();
        assert_eq!(forest.n_classes(), 3);

        let test_features = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0],
        ];
        let test_labels = vec![0, 1, 3];
        let report = forest.evaluate(&test_features, &test_labels).unwrap();

        assert_eq!(report.confusion.n_classes(), 4);
        assert_eq!(report.class_report.len(), 4);
        assert_eq!(report.class_report[3].support, 1);
        // The forest cannot predict an unseen class, so that row counts
        // against accuracy.
        assert!((report.accuracy - 2.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn evaluate_empty_set_error() {
        let forest = train_forest();
        let err = forest.evaluate(&[], &[]).unwrap_err();
        assert!(matches!(err, ForestError::EmptyEvaluationSet));
    }

    #[test]
    fn evaluate_misaligned_labels_error() {
        let forest = train_forest();
        let err = forest
            .evaluate(&[vec![1.0, 0.0, 0.0]], &[0, 1])
            .unwrap_err();
        assert!(matches!(err, ForestError::LabelCountMismatch { .. }));
    }

    #[test]
    fn importances_cover_informative_features() {
        let forest = train_forest();
        let importances = forest.feature_importances();
        assert_eq!(importances.len(), 3);
        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10, "sum = {sum}");
    }
}
