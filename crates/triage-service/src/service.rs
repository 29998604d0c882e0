//! The diagnosis service facade.
//!
//! Ties the data layer and the classifier together behind one object:
//! an immutable symptom vocabulary and label codec fixed at bootstrap,
//! plus a fitted model that can be swapped atomically on retrain.

use std::path::Path;
use std::sync::{PoisonError, RwLock};

use tracing::{info, instrument};

use triage_data::{DataError, DatasetReader, LabelCodec, Vocabulary, train_test_split};
use triage_forest::{EvaluationReport, Forest, ForestConfig, ForestError};

use crate::error::ServiceError;

/// Fraction of rows held out for evaluation at bootstrap.
const TEST_FRACTION: f64 = 0.2;

/// Seed for the bootstrap train/test partition. Fixed so the held-out
/// set is identical across restarts and a reloaded model is evaluated
/// on rows it was not trained on.
const SPLIT_SEED: u64 = 42;

/// How the service obtained its model at bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    /// Trained from scratch and saved to the model path.
    Trained,
    /// Reloaded from an existing model file.
    Reloaded,
}

/// What happened while bringing the service up.
#[derive(Debug)]
pub struct BootstrapReport {
    /// Whether the model was trained or reloaded.
    pub source: ModelSource,
    /// Training accuracy; `None` when the model was reloaded.
    pub training_accuracy: Option<f64>,
    /// Evaluation on the held-out split.
    pub evaluation: EvaluationReport,
    /// Total rows in the dataset.
    pub n_samples: usize,
    /// Rows in the training partition.
    pub n_train: usize,
    /// Rows in the held-out partition.
    pub n_test: usize,
}

/// A single diagnosis response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnosis {
    /// The predicted diagnosis label.
    pub diagnosis: String,
    /// The symptoms the prediction was made from, echoed back.
    pub symptoms: Vec<String>,
}

/// The symptom-to-diagnosis classification service.
///
/// The vocabulary and codec are fixed for the lifetime of the service;
/// the model behind the [`RwLock`] can be replaced by [`retrain`] without
/// interrupting concurrent [`diagnose`] calls.
///
/// [`retrain`]: DiagnosisService::retrain
/// [`diagnose`]: DiagnosisService::diagnose
#[derive(Debug)]
pub struct DiagnosisService {
    vocabulary: Vocabulary,
    codec: LabelCodec,
    model: RwLock<Forest>,
}

impl DiagnosisService {
    /// Assemble a service from already-fitted parts.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::FeatureWidthMismatch`] when the model was
    /// trained on a different feature width than the vocabulary encodes,
    /// and [`DataError::LabelIndexOutOfRange`] when the model can emit a
    /// class index the codec cannot decode. Both indicate the model file
    /// belongs to a different dataset.
    pub fn new(
        vocabulary: Vocabulary,
        codec: LabelCodec,
        forest: Forest,
    ) -> Result<Self, ServiceError> {
        if forest.n_features() != vocabulary.len() {
            return Err(ForestError::FeatureWidthMismatch {
                expected: vocabulary.len(),
                got: forest.n_features(),
            }
            .into());
        }
        if forest.n_classes() > codec.len() {
            return Err(DataError::LabelIndexOutOfRange {
                index: forest.n_classes() - 1,
                n_classes: codec.len(),
            }
            .into());
        }
        Ok(Self {
            vocabulary,
            codec,
            model: RwLock::new(forest),
        })
    }

    /// Bring the service up from a dataset file and a model path.
    ///
    /// Reads the CSV, fits the label codec, and partitions the rows
    /// 80/20 with a fixed seed. If `model_path` exists the model is
    /// reloaded from it; otherwise a fresh model is trained on the
    /// training partition and saved there. Either way the model is
    /// evaluated on the held-out partition and the result logged, so a
    /// stale or foreign model file shows up in the startup accuracy.
    ///
    /// # Errors
    ///
    /// Any dataset, training, evaluation, or persistence failure is
    /// fatal here and propagated; the service does not come up half
    /// initialized.
    #[instrument(skip_all, fields(
        data = %data_path.as_ref().display(),
        model = %model_path.as_ref().display(),
    ))]
    pub fn bootstrap(
        data_path: impl AsRef<Path>,
        model_path: impl AsRef<Path>,
        config: &ForestConfig,
    ) -> Result<(Self, BootstrapReport), ServiceError> {
        let data_path = data_path.as_ref();
        let model_path = model_path.as_ref();

        let dataset = DatasetReader::new(data_path).read()?;
        let codec = LabelCodec::fit(dataset.labels());
        let labels = dataset
            .labels()
            .iter()
            .map(|label| codec.encode(label))
            .collect::<Result<Vec<_>, _>>()?;

        let split = train_test_split(dataset.features(), &labels, TEST_FRACTION, SPLIT_SEED)?;

        let (forest, source, training_accuracy) = if model_path.exists() {
            info!("existing model found, reloading");
            (Forest::load(model_path)?, ModelSource::Reloaded, None)
        } else {
            info!(n_train = split.n_train(), "no model found, training");
            let report = config.fit(&split.train_features, &split.train_labels)?;
            info!(
                training_accuracy = report.training_accuracy(),
                "training complete"
            );
            let accuracy = report.training_accuracy();
            let forest = report.into_forest();
            forest.save(model_path)?;
            (forest, ModelSource::Trained, Some(accuracy))
        };

        let evaluation = forest.evaluate(&split.test_features, &split.test_labels)?;
        info!(
            source = ?source,
            accuracy = evaluation.accuracy,
            n_test = split.n_test(),
            "held-out evaluation complete"
        );

        let report = BootstrapReport {
            source,
            training_accuracy,
            evaluation,
            n_samples: dataset.n_samples(),
            n_train: split.n_train(),
            n_test: split.n_test(),
        };
        let service = Self::new(dataset.vocabulary().clone(), codec, forest)?;
        Ok((service, report))
    }

    /// Diagnose from a set of symptom names.
    ///
    /// Unknown symptom names are ignored (with a warning in the log);
    /// an input consisting only of unknown names still yields a
    /// prediction, from the all-zero indicator vector.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EmptySymptomList`] when `symptoms` is empty.
    /// Any other failure indicates an internal inconsistency between the
    /// vocabulary, codec, and model.
    pub fn diagnose(&self, symptoms: &[String]) -> Result<Diagnosis, ServiceError> {
        let encoded = self.vocabulary.encode(symptoms)?;
        let class = self
            .model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .predict(&encoded)?;
        let diagnosis = self.codec.decode(class)?.to_string();
        Ok(Diagnosis {
            diagnosis,
            symptoms: symptoms.to_vec(),
        })
    }

    /// Train a replacement model and swap it in atomically.
    ///
    /// Concurrent [`diagnose`] calls keep using the old model until the
    /// swap, then see the new one. Returns the training accuracy. The
    /// new model is not persisted; call [`Forest::save`] via
    /// [`DiagnosisService::bootstrap`] semantics if persistence is wanted.
    ///
    /// [`diagnose`]: DiagnosisService::diagnose
    ///
    /// # Errors
    ///
    /// Training failures are propagated; [`ForestError::FeatureWidthMismatch`]
    /// is returned when `features` does not match the vocabulary width,
    /// leaving the current model in place.
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn retrain(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        config: &ForestConfig,
    ) -> Result<f64, ServiceError> {
        let report = config.fit(features, labels)?;
        let forest = report.forest();
        if forest.n_features() != self.vocabulary.len() {
            return Err(ForestError::FeatureWidthMismatch {
                expected: self.vocabulary.len(),
                got: forest.n_features(),
            }
            .into());
        }
        if forest.n_classes() > self.codec.len() {
            return Err(DataError::LabelIndexOutOfRange {
                index: forest.n_classes() - 1,
                n_classes: self.codec.len(),
            }
            .into());
        }
        let accuracy = report.training_accuracy();
        *self.model.write().unwrap_or_else(PoisonError::into_inner) = report.into_forest();
        info!(training_accuracy = accuracy, "model retrained and swapped");
        Ok(accuracy)
    }

    /// Return the recognized symptom names in vocabulary order.
    #[must_use]
    pub fn symptoms(&self) -> &[String] {
        self.vocabulary.names()
    }

    /// Return the known diagnosis labels in class-index order.
    #[must_use]
    pub fn diagnoses(&self) -> &[String] {
        self.codec.classes()
    }

    /// Return the symptom vocabulary.
    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}
