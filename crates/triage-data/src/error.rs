//! Error types for dataset ingestion, encoding, and splitting.

use std::path::PathBuf;

/// Errors from dataset loading, symptom encoding, label coding, and splitting.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when there are no symptom indicator columns before the
    /// diagnosis column.
    #[error("dataset must have at least one symptom column before the diagnosis column, got {n_symptom_columns}")]
    NoSymptomColumns {
        /// Number of symptom columns found.
        n_symptom_columns: usize,
    },

    /// Returned when the same symptom name appears twice in the header.
    #[error("duplicate symptom column \"{name}\"")]
    DuplicateSymptom {
        /// The duplicated symptom name.
        name: String,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when an indicator cell is NaN, Inf, or not parseable as a float.
    #[error("non-finite value in {path}: row {row_index}, column {col_index}, raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Zero-based symptom column index.
        col_index: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when a caller asks for a diagnosis with no symptoms at all.
    #[error("at least one symptom must be supplied")]
    EmptySymptomList,

    /// Returned when a diagnosis label was not present in the fitted label set.
    #[error("unknown diagnosis label \"{label}\"")]
    UnknownLabel {
        /// The label that was not fitted.
        label: String,
    },

    /// Returned when a class index falls outside the fitted label space.
    #[error("class index {index} is out of range for {n_classes} fitted classes")]
    LabelIndexOutOfRange {
        /// The offending class index.
        index: usize,
        /// Number of classes in the fitted codec.
        n_classes: usize,
    },

    /// Returned when the feature rows and labels have different lengths.
    #[error("feature rows and labels are misaligned: {n_rows} rows, {n_labels} labels")]
    RowLabelMismatch {
        /// Number of feature rows.
        n_rows: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when the test fraction is outside (0.0, 1.0).
    #[error("test_fraction must be in (0.0, 1.0), got {fraction}")]
    InvalidTestFraction {
        /// The invalid fraction provided.
        fraction: f64,
    },

    /// Returned when the dataset is too small to produce non-empty train and
    /// test partitions.
    #[error("dataset has only {n_samples} rows, too few for a {test_fraction} test split")]
    InsufficientData {
        /// Number of rows in the dataset.
        n_samples: usize,
        /// The requested test fraction.
        test_fraction: f64,
    },
}
