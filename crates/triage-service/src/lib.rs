//! Symptom-to-diagnosis classification service.
//!
//! Glues the data layer ([`triage_data`]) and the Random Forest
//! classifier ([`triage_forest`]) into a single facade that owns the
//! vocabulary, label codec, and fitted model for the lifetime of the
//! process.

mod error;
mod service;

pub use error::ServiceError;
pub use service::{BootstrapReport, Diagnosis, DiagnosisService, ModelSource};
