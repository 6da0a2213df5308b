//! Typed failures of the scoring core.
//!
//! Only preprocessing (encoding) and the trained-model call can fail. Everything
//! downstream of a probability is a total function.

use thiserror::Error;

use crate::schema::Feature;

/// A categorical label the bundle's encoder was never trained on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot encode {feature}: label '{label}' is not among the encoder's known classes {known:?}")]
pub struct EncodingError {
    pub feature: Feature,
    pub label: String,
    pub known: Vec<String>,
}

/// Errors surfaced by the `score` operation. The caller owns user-facing messaging.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The trained classifier could not produce a usable probability.
    #[error("model prediction failed: {0}")]
    Prediction(String),
}

impl ScoreError {
    /// Stable short name used for metrics labels and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoreError::Encoding(_) => "encoding",
            ScoreError::Prediction(_) => "prediction",
        }
    }
}

/// A model bundle that is not fully present. Raised at construction, so a
/// partial bundle never reaches scoring.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BundleError {
    #[error("bundle declares no feature columns")]
    NoColumns,
    #[error("unknown feature column '{0}'")]
    UnknownColumn(String),
    #[error("feature column '{0}' listed more than once")]
    DuplicateColumn(String),
    #[error("scaler has {found} dimensions but the bundle declares {expected} columns")]
    ScalerDimension { found: usize, expected: usize },
    #[error("no encoder for categorical column '{0}'")]
    MissingEncoder(String),
    #[error("encoder for '{0}' has no classes")]
    EmptyEncoder(String),
    #[error("classifier expects {found} inputs but the bundle declares {expected} columns")]
    ClassifierDimension { found: usize, expected: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_error_message_names_feature_and_label() {
        let e = EncodingError {
            feature: Feature::BirthWeight,
            label: "ELBW".into(),
            known: vec!["LBW".into(), "NBW".into()],
        };
        let msg = ScoreError::from(e).to_string();
        assert!(msg.contains("Birth weight"), "{msg}");
        assert!(msg.contains("'ELBW'"), "{msg}");
    }

    #[test]
    fn kinds_are_stable() {
        let p = ScoreError::Prediction("boom".into());
        assert_eq!(p.kind(), "prediction");
        assert_eq!(p.to_string(), "model prediction failed: boom");
    }
}
