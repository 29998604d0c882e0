//! Confusion matrix and per-class classification metrics.

use std::fmt;

use crate::error::ForestError;

/// A confusion matrix for multi-class classification.
///
/// Entry `matrix[true_class][predicted_class]` counts how many samples
/// with true label `true_class` were predicted as `predicted_class`.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
    n_classes: usize,
}

/// Per-class precision, recall, and F1 score.
#[derive(Debug, Clone)]
pub struct ClassReport {
    /// The class index.
    pub class: usize,
    /// Precision: TP / (TP + FP). 0.0 if nothing was predicted as this class.
    pub precision: f64,
    /// Recall: TP / (TP + FN). 0.0 if the class has no true samples.
    pub recall: f64,
    /// Harmonic mean of precision and recall. 0.0 if both are zero.
    pub f1: f64,
    /// Number of true samples in this class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from true and predicted class indices.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::EmptyEvaluationSet`] | Zero labels provided |
    /// | [`ForestError::LabelCountMismatch`] | Label and prediction counts disagree |
    /// | [`ForestError::ClassIndexOutOfRange`] | A label or prediction is >= `n_classes` |
    pub fn from_predictions(
        true_labels: &[usize],
        predicted: &[usize],
        n_classes: usize,
    ) -> Result<Self, ForestError> {
        if true_labels.is_empty() {
            return Err(ForestError::EmptyEvaluationSet);
        }
        if true_labels.len() != predicted.len() {
            return Err(ForestError::LabelCountMismatch {
                n_samples: true_labels.len(),
                n_labels: predicted.len(),
            });
        }
        let mut matrix = vec![vec![0usize; n_classes]; n_classes];
        for (&t, &p) in true_labels.iter().zip(predicted.iter()) {
            let out_of_range = t.max(p);
            if out_of_range >= n_classes {
                return Err(ForestError::ClassIndexOutOfRange {
                    class: out_of_range,
                    n_classes,
                });
            }
            matrix[t][p] += 1;
        }
        Ok(Self { matrix, n_classes })
    }

    /// Overall accuracy: proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.n_classes).map(|i| self.matrix[i][i]).sum();
        let total: usize = self.matrix.iter().flat_map(|row| row.iter()).sum();
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    /// Per-class precision, recall, F1, and support.
    #[must_use]
    pub fn class_report(&self) -> Vec<ClassReport> {
        (0..self.n_classes)
            .map(|c| {
                let tp = self.matrix[c][c];
                let predicted_c: usize = (0..self.n_classes).map(|i| self.matrix[i][c]).sum();
                let support: usize = self.matrix[c].iter().sum();
                let precision = if predicted_c == 0 {
                    0.0
                } else {
                    tp as f64 / predicted_c as f64
                };
                let recall = if support == 0 {
                    0.0
                } else {
                    tp as f64 / support as f64
                };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassReport {
                    class: c,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Unweighted mean of the per-class F1 scores.
    #[must_use]
    pub fn macro_f1(&self) -> f64 {
        let report = self.class_report();
        if report.is_empty() {
            return 0.0;
        }
        report.iter().map(|m| m.f1).sum::<f64>() / report.len() as f64
    }

    /// Return the underlying matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for j in 0..self.n_classes {
            write!(f, " pred_{j:>3}")?;
        }
        writeln!(f)?;
        for (i, row) in self.matrix.iter().enumerate() {
            write!(f, "true_{i:>3}")?;
            for val in row {
                write!(f, " {val:>7}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let cm = ConfusionMatrix::from_predictions(&[0, 0, 1, 1, 2, 2], &[0, 0, 1, 1, 2, 2], 3)
            .unwrap();
        assert!((cm.accuracy() - 1.0).abs() < f64::EPSILON);
        assert!((cm.macro_f1() - 1.0).abs() < f64::EPSILON);
        for m in cm.class_report() {
            assert!((m.precision - 1.0).abs() < f64::EPSILON);
            assert!((m.recall - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn known_three_class_metrics() {
        // Each class: 2 correct, 1 drifting to the next class (cyclically).
        let true_labels = vec![0, 0, 0, 1, 1, 1, 2, 2, 2];
        let predicted = vec![0, 0, 1, 1, 1, 2, 2, 2, 0];
        let cm = ConfusionMatrix::from_predictions(&true_labels, &predicted, 3).unwrap();

        let report = cm.class_report();
        assert!((report[0].precision - 2.0 / 3.0).abs() < 1e-10);
        assert!((report[0].recall - 2.0 / 3.0).abs() < 1e-10);
        assert_eq!(report[0].support, 3);
        assert!((cm.accuracy() - 6.0 / 9.0).abs() < 1e-10);
    }

    #[test]
    fn metrics_stay_in_unit_interval() {
        let cm = ConfusionMatrix::from_predictions(&[0, 1, 1, 0], &[1, 1, 0, 0], 2).unwrap();
        for m in cm.class_report() {
            assert!((0.0..=1.0).contains(&m.precision));
            assert!((0.0..=1.0).contains(&m.recall));
            assert!((0.0..=1.0).contains(&m.f1));
        }
        assert!((0.0..=1.0).contains(&cm.macro_f1()));
    }

    #[test]
    fn zero_support_class_reports_zero() {
        // Class 2 never occurs.
        let cm = ConfusionMatrix::from_predictions(&[0, 0, 1, 1], &[0, 0, 1, 1], 3).unwrap();
        let report = cm.class_report();
        assert_eq!(report[2].support, 0);
        assert!((report[2].recall - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_labels_error() {
        let err = ConfusionMatrix::from_predictions(&[], &[], 3).unwrap_err();
        assert!(matches!(err, ForestError::EmptyEvaluationSet));
    }

    #[test]
    fn out_of_range_class_error() {
        let err = ConfusionMatrix::from_predictions(&[0, 3], &[0, 1], 2).unwrap_err();
        assert!(matches!(
            err,
            ForestError::ClassIndexOutOfRange {
                class: 3,
                n_classes: 2
            }
        ));
    }

    #[test]
    fn display_formatting() {
        let cm = ConfusionMatrix::from_predictions(&[0, 1], &[0, 1], 2).unwrap();
        let output = format!("{cm}");
        assert!(output.contains("pred_"));
        assert!(output.contains("true_"));
    }
}
