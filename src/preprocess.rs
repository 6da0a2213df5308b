//! # Preprocessor
//! Maps a [`PatientObservation`] onto the exact vector the bundle's classifier
//! expects (categorical encode, column order, scaling). Without a bundle the
//! raw observation passes through untouched for the fallback estimator.

use crate::bundle::ModelBundle;
use crate::error::EncodingError;
use crate::observation::{FeatureValue, PatientObservation};

/// Estimator input: either a model-ready vector or the raw observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Prepared<'a> {
    /// Encoded, ordered, scaled vector, ready for the bundle's classifier.
    Vector(Vec<f64>),
    /// No bundle; the fallback heuristic reads raw values.
    Raw(&'a PatientObservation),
}

pub fn preprocess<'a>(
    obs: &'a PatientObservation,
    bundle: Option<&ModelBundle>,
) -> Result<Prepared<'a>, EncodingError> {
    match bundle {
        Some(b) => encode_row(obs, b)
            .map(|row| b.scaler().transform(&row))
            .map(Prepared::Vector),
        None => Ok(Prepared::Raw(obs)),
    }
}

/// Unscaled row in the bundle's declared column order.
pub fn encode_row(obs: &PatientObservation, bundle: &ModelBundle) -> Result<Vec<f64>, EncodingError> {
    bundle
        .columns()
        .iter()
        .map(|&feature| match obs.value(feature) {
            FeatureValue::Number(x) => Ok(x),
            FeatureValue::Flag(b) => Ok(if b { 1.0 } else { 0.0 }),
            FeatureValue::Class(class) => {
                // Bundle construction guarantees an encoder for every categorical column.
                let encoder = bundle.encoder(feature);
                encoder
                    .and_then(|e| e.transform(class.label()))
                    .map(|idx| idx as f64)
                    .ok_or_else(|| EncodingError {
                        feature,
                        label: class.label().to_string(),
                        known: encoder.map(|e| e.classes().to_vec()).unwrap_or_default(),
                    })
            }
        })
        .collect()
}
