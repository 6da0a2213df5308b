// src/lib.rs
// Public library surface for the binary, integration tests, and host UIs.

pub mod schema;
pub mod observation;
pub mod error;

// Scoring core: preprocess -> estimate -> tier / contributions / advice
pub mod bundle;
pub mod preprocess;
pub mod estimator;
pub mod tier;
pub mod contributions;
pub mod advisory;
pub mod prediction;
pub mod engine;

// Host service
pub mod config;
pub mod metrics;
pub mod api;

// ---- Re-exports for stable public API ----
pub use crate::api::{app, router};
pub use crate::bundle::{Classifier, ModelBundle};
pub use crate::engine::{score, score_with, Scorer};
pub use crate::error::{BundleError, EncodingError, ScoreError};
pub use crate::observation::PatientObservation;
pub use crate::prediction::PredictionResult;
pub use crate::schema::{BirthWeightClass, Feature};
pub use crate::tier::RiskTier;
