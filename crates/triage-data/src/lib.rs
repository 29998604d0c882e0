//! Dataset ingestion, symptom encoding, label coding, and splitting for the
//! triage pipeline.

mod domain;
mod error;
mod reader;
mod split;

pub use domain::{LabelCodec, TabularDataset, Vocabulary};
pub use error::DataError;
pub use reader::DatasetReader;
pub use split::{SplitDataset, train_test_split};
