//! Service-level error type and client-facing message mapping.

use triage_data::DataError;
use triage_forest::ForestError;

/// Errors surfaced by the diagnosis service facade.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A dataset, encoding, codec, or splitting failure.
    #[error(transparent)]
    Data(#[from] DataError),

    /// A classifier training, prediction, or persistence failure.
    #[error(transparent)]
    Model(#[from] ForestError),
}

impl ServiceError {
    /// Short message safe to return to a client.
    ///
    /// Caller mistakes (an empty symptom list) get a specific message;
    /// every internal invariant violation collapses to a generic one so
    /// no internals leak past the request boundary.
    #[must_use]
    pub fn client_message(&self) -> &'static str {
        match self {
            ServiceError::Data(DataError::EmptySymptomList) => {
                "at least one symptom must be supplied"
            }
            _ => "internal error while producing a diagnosis",
        }
    }

    /// Return `true` when the error is the caller's fault rather than an
    /// internal failure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, ServiceError::Data(DataError::EmptySymptomList))
    }
}
