//! CSV dataset reader with full input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::DataError;
use crate::domain::{TabularDataset, Vocabulary};

/// Reads a symptom indicator dataset from a CSV file.
///
/// Expected CSV format:
/// - Header row required: every column except the last names a symptom,
///   the last column is the diagnosis label.
/// - Data rows: numeric indicator values (0/1) followed by the label string.
/// - All rows must have the same number of columns as the header.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DataError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`DataError::CsvParse`] | Malformed CSV record |
/// | [`DataError::NoSymptomColumns`] | Header has fewer than 2 columns |
/// | [`DataError::DuplicateSymptom`] | Same symptom name appears twice in the header |
/// | [`DataError::EmptyDataset`] | Zero data rows after the header |
/// | [`DataError::InconsistentRowLength`] | Row has different column count than header |
/// | [`DataError::NonFiniteValue`] | Indicator cell is NaN, Inf, or unparseable |
pub struct DatasetReader {
    path: PathBuf,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`TabularDataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<TabularDataset, DataError> {
        let file = std::fs::File::open(&self.path).map_err(|e| DataError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets rows with varying column counts through so our
        // own InconsistentRowLength check fires instead of a low-level
        // CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| DataError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;
        let expected_cols = header.len();
        if expected_cols < 2 {
            return Err(DataError::NoSymptomColumns {
                n_symptom_columns: expected_cols.saturating_sub(1),
            });
        }

        // All header columns except the last name a symptom.
        let symptom_names: Vec<String> = header
            .iter()
            .take(expected_cols - 1)
            .map(str::to_string)
            .collect();
        let vocabulary = Vocabulary::new(symptom_names)?;
        debug!(
            n_symptoms = vocabulary.len(),
            diagnosis_column = header.get(expected_cols - 1).unwrap_or(""),
            "read CSV header"
        );

        let mut features = Vec::new();
        let mut labels = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| DataError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            if record.len() != expected_cols {
                return Err(DataError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            // Indicator columns 0..n-1.
            let mut row = Vec::with_capacity(expected_cols - 1);
            for col_index in 0..expected_cols - 1 {
                let raw = record.get(col_index).unwrap_or("");
                let value: f64 = raw.parse().map_err(|_| DataError::NonFiniteValue {
                    path: self.path.clone(),
                    row_index,
                    col_index,
                    raw: raw.to_string(),
                })?;
                if !value.is_finite() {
                    return Err(DataError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        col_index,
                        raw: raw.to_string(),
                    });
                }
                row.push(value);
            }

            // Last column is the diagnosis label.
            let label = record.get(expected_cols - 1).unwrap_or("").to_string();

            features.push(row);
            labels.push(label);
        }

        if features.is_empty() {
            return Err(DataError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_samples = features.len(),
            n_symptoms = vocabulary.len(),
            "dataset loaded"
        );

        Ok(TabularDataset::new(vocabulary, features, labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn read_valid_dataset() {
        let csv = "fever,cough,rash,diagnosis\n1,0,0,flu\n0,1,0,cold\n1,1,1,measles\n";
        let f = write_csv(csv);
        let ds = DatasetReader::new(f.path()).read().unwrap();
        assert_eq!(ds.vocabulary().names(), &["fever", "cough", "rash"]);
        assert_eq!(ds.n_samples(), 3);
        assert_eq!(ds.features()[2], vec![1.0, 1.0, 1.0]);
        assert_eq!(ds.labels()[0], "flu");
    }

    #[test]
    fn row_order_preserved() {
        let csv = "s1,diagnosis\n1,zeta\n0,alpha\n1,mid\n";
        let f = write_csv(csv);
        let ds = DatasetReader::new(f.path()).read().unwrap();
        assert_eq!(ds.labels(), &["zeta", "alpha", "mid"]);
    }

    #[test]
    fn error_file_not_found() {
        let result = DatasetReader::new(Path::new("/nonexistent/dataset.csv")).read();
        assert!(matches!(result, Err(DataError::FileNotFound { .. })));
    }

    #[test]
    fn error_no_symptom_columns() {
        let csv = "diagnosis\nflu\n";
        let f = write_csv(csv);
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(DataError::NoSymptomColumns {
                n_symptom_columns: 0
            })
        ));
    }

    #[test]
    fn error_duplicate_symptom_column() {
        let csv = "fever,fever,diagnosis\n1,0,flu\n";
        let f = write_csv(csv);
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(result, Err(DataError::DuplicateSymptom { .. })));
    }

    #[test]
    fn error_empty_dataset() {
        let csv = "fever,cough,diagnosis\n";
        let f = write_csv(csv);
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(result, Err(DataError::EmptyDataset { .. })));
    }

    #[test]
    fn error_inconsistent_row_length() {
        let csv = "fever,cough,diagnosis\n1,0,flu\n1,cold\n";
        let f = write_csv(csv);
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(DataError::InconsistentRowLength { row_index: 1, .. })
        ));
    }

    #[test]
    fn error_non_finite_indicator() {
        let csv = "fever,cough,diagnosis\n1,NaN,flu\n";
        let f = write_csv(csv);
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(result, Err(DataError::NonFiniteValue { .. })));
    }

    #[test]
    fn error_unparseable_indicator() {
        let csv = "fever,cough,diagnosis\nyes,0,flu\n";
        let f = write_csv(csv);
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(DataError::NonFiniteValue { col_index: 0, .. })
        ));
    }
}
