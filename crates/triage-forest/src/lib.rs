//! Random Forest classification: train, evaluate, predict, persist.
//!
//! Hand-rolled CART decision trees with Gini splits, bootstrap-sampled
//! trees trained in parallel via rayon, majority-vote prediction, and
//! bincode model persistence with atomic file replacement.

mod config;
mod error;
mod forest;
mod metrics;
mod persist;
mod predict;
mod split;
mod tree;

pub use config::{ForestConfig, MaxFeatures};
pub use error::ForestError;
pub use forest::{Forest, TrainingMetadata, TrainingReport};
pub use metrics::{ClassReport, ConfusionMatrix};
pub use predict::EvaluationReport;
pub use split::gini;
