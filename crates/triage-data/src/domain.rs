//! Domain types: symptom vocabulary, diagnosis label codec, and the loaded dataset.

use std::collections::HashMap;

use tracing::warn;

use crate::DataError;

/// The fixed, ordered set of recognized symptom names.
///
/// Built once from the CSV header at load time and immutable thereafter.
/// The position of each name defines the feature-vector layout: a model
/// trained against one vocabulary is only valid for encodings produced
/// from that same vocabulary.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Create a vocabulary from an ordered list of symptom names.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DataError::NoSymptomColumns`] | `names` is empty |
    /// | [`DataError::DuplicateSymptom`] | a name appears more than once |
    pub fn new(names: Vec<String>) -> Result<Self, DataError> {
        if names.is_empty() {
            return Err(DataError::NoSymptomColumns {
                n_symptom_columns: 0,
            });
        }
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(DataError::DuplicateSymptom { name: name.clone() });
            }
        }
        Ok(Self { names, index })
    }

    /// Encode a set of symptom names as a binary indicator vector.
    ///
    /// Returns a vector of length [`Vocabulary::len`] with 1.0 at each
    /// position whose symptom appears in `symptoms` and 0.0 elsewhere.
    /// The result depends only on the set of names, not on their order
    /// or multiplicity. Names absent from the vocabulary are skipped
    /// with a warning; they never fail the request.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptySymptomList`] when `symptoms` is empty.
    pub fn encode(&self, symptoms: &[String]) -> Result<Vec<f64>, DataError> {
        if symptoms.is_empty() {
            return Err(DataError::EmptySymptomList);
        }
        let mut encoded = vec![0.0; self.names.len()];
        for symptom in symptoms {
            match self.index.get(symptom.as_str()) {
                Some(&i) => encoded[i] = 1.0,
                None => warn!(symptom = %symptom, "symptom not in vocabulary, ignoring"),
            }
        }
        Ok(encoded)
    }

    /// Return the symptom names in vocabulary order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Return the position of a symptom name, if known.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Return the number of symptoms, i.e. the feature-vector width.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Return `true` if the vocabulary has no symptoms.
    ///
    /// Always `false` for a constructed vocabulary; provided for API
    /// completeness alongside [`Vocabulary::len`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Bidirectional mapping between diagnosis label strings and dense class indices.
///
/// Classes are assigned indices by sorted order, so the mapping is
/// reproducible across retraining runs on the same label set.
#[derive(Debug, Clone)]
pub struct LabelCodec {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelCodec {
    /// Fit the codec on the labels observed in training data.
    ///
    /// Deduplicates and sorts the labels, assigning each a 0-based index
    /// by sorted order. Deterministic for the same label multiset.
    #[must_use]
    pub fn fit(labels: &[String]) -> Self {
        let mut classes: Vec<String> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), i))
            .collect();
        Self { classes, index }
    }

    /// Return the class index for a fitted label.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::UnknownLabel`] if the label was not in the
    /// fitted set — this indicates a vocabulary/model mismatch bug, not
    /// a user error.
    pub fn encode(&self, label: &str) -> Result<usize, DataError> {
        self.index
            .get(label)
            .copied()
            .ok_or_else(|| DataError::UnknownLabel {
                label: label.to_string(),
            })
    }

    /// Return the label string for a class index.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::LabelIndexOutOfRange`] if `index` is outside
    /// `[0, n_classes)`.
    pub fn decode(&self, index: usize) -> Result<&str, DataError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(DataError::LabelIndexOutOfRange {
                index,
                n_classes: self.classes.len(),
            })
    }

    /// Return the fitted class labels in index order.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Return the number of fitted classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Return `true` if no labels were fitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// The loaded tabular dataset: indicator rows, raw label strings, and the
/// vocabulary derived from the header.
///
/// Rows and labels are stored in parallel vectors — `features[i]`
/// corresponds to `labels[i]`.
#[derive(Debug)]
pub struct TabularDataset {
    vocabulary: Vocabulary,
    features: Vec<Vec<f64>>,
    labels: Vec<String>,
}

impl TabularDataset {
    /// Create a new dataset from pre-validated parts.
    pub(crate) fn new(
        vocabulary: Vocabulary,
        features: Vec<Vec<f64>>,
        labels: Vec<String>,
    ) -> Self {
        Self {
            vocabulary,
            features,
            labels,
        }
    }

    /// Return the symptom vocabulary.
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Return the indicator rows (row-major).
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Return the raw diagnosis labels, one per row.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.features.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::new(vec![
            "fever".to_string(),
            "cough".to_string(),
            "rash".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn vocabulary_preserves_order() {
        let v = vocab();
        assert_eq!(v.names(), &["fever", "cough", "rash"]);
        assert_eq!(v.index_of("cough"), Some(1));
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn vocabulary_rejects_empty() {
        let err = Vocabulary::new(vec![]).unwrap_err();
        assert!(matches!(
            err,
            DataError::NoSymptomColumns {
                n_symptom_columns: 0
            }
        ));
    }

    #[test]
    fn vocabulary_rejects_duplicates() {
        let err = Vocabulary::new(vec!["fever".to_string(), "fever".to_string()]).unwrap_err();
        assert!(matches!(err, DataError::DuplicateSymptom { .. }));
    }

    #[test]
    fn encode_sets_known_positions() {
        let v = vocab();
        let enc = v
            .encode(&["rash".to_string(), "fever".to_string()])
            .unwrap();
        assert_eq!(enc, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn encode_is_order_independent() {
        let v = vocab();
        let a = v
            .encode(&["fever".to_string(), "cough".to_string()])
            .unwrap();
        let b = v
            .encode(&["cough".to_string(), "fever".to_string()])
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn encode_skips_unknown_names() {
        let v = vocab();
        let enc = v
            .encode(&["fever".to_string(), "unknown_symptom_xyz".to_string()])
            .unwrap();
        assert_eq!(enc, vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn encode_all_unknown_yields_zero_vector() {
        let v = vocab();
        let enc = v.encode(&["unknown_symptom_xyz".to_string()]).unwrap();
        assert_eq!(enc, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn encode_empty_list_errors() {
        let v = vocab();
        let err = v.encode(&[]).unwrap_err();
        assert!(matches!(err, DataError::EmptySymptomList));
    }

    #[test]
    fn codec_sorted_assignment() {
        let labels = vec![
            "flu".to_string(),
            "cold".to_string(),
            "measles".to_string(),
            "cold".to_string(),
        ];
        let codec = LabelCodec::fit(&labels);
        assert_eq!(codec.classes(), &["cold", "flu", "measles"]);
        assert_eq!(codec.encode("flu").unwrap(), 1);
    }

    #[test]
    fn codec_round_trip_all_labels() {
        let labels = vec!["flu".to_string(), "cold".to_string(), "measles".to_string()];
        let codec = LabelCodec::fit(&labels);
        for label in codec.classes().to_vec() {
            let idx = codec.encode(&label).unwrap();
            assert_eq!(codec.decode(idx).unwrap(), label);
        }
    }

    #[test]
    fn codec_deterministic_across_input_order() {
        let a = LabelCodec::fit(&["b".to_string(), "a".to_string(), "c".to_string()]);
        let b = LabelCodec::fit(&["c".to_string(), "b".to_string(), "a".to_string()]);
        assert_eq!(a.classes(), b.classes());
    }

    #[test]
    fn codec_unknown_label_errors() {
        let codec = LabelCodec::fit(&["flu".to_string()]);
        let err = codec.encode("plague").unwrap_err();
        assert!(matches!(err, DataError::UnknownLabel { .. }));
    }

    #[test]
    fn codec_index_out_of_range_errors() {
        let codec = LabelCodec::fit(&["flu".to_string(), "cold".to_string()]);
        let err = codec.decode(2).unwrap_err();
        assert!(matches!(
            err,
            DataError::LabelIndexOutOfRange {
                index: 2,
                n_classes: 2
            }
        ));
    }
}
