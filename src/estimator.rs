//! # Estimator
//! Probability of surgery within 72h, from one of two explicitly chosen paths:
//!
//! - **model**: the bundle's classifier on the preprocessed vector. Any failure
//!   is a [`ScoreError::Prediction`]; it never degrades to the heuristic.
//! - **fallback**: a deterministic weighted sum of eight clipped linear ramps,
//!   clamped to `[0.05, 0.95]` so it never reports certainty.

use serde::{Deserialize, Serialize};

use crate::bundle::ModelBundle;
use crate::error::ScoreError;
use crate::observation::PatientObservation;
use crate::preprocess::Prepared;
use crate::schema::Feature;

/// Lower clamp of the fallback heuristic.
pub const FALLBACK_FLOOR: f64 = 0.05;
/// Upper clamp of the fallback heuristic.
pub const FALLBACK_CEILING: f64 = 0.95;

/// Which path produced a probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    Model,
    Fallback,
}

impl EstimateSource {
    pub fn as_str(self) -> &'static str {
        match self {
            EstimateSource::Model => "model",
            EstimateSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub probability: f64,
    pub source: EstimateSource,
}

/// Linear normalization of one raw input onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ramp {
    /// `min(x / full, 1)`: higher is worse.
    Rising { full: f64 },
    /// `1 - min(x / full, 1)`: lower is worse.
    Falling { full: f64 },
    /// Present → 1, absent → 0.
    Flag,
}

impl Ramp {
    pub fn apply(self, x: f64) -> f64 {
        let r = match self {
            Ramp::Rising { full } => (x / full).min(1.0),
            Ramp::Falling { full } => 1.0 - (x / full).min(1.0),
            Ramp::Flag => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        };
        r.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackTerm {
    pub feature: Feature,
    pub ramp: Ramp,
    pub weight: f64,
}

/// Fallback heuristic weights. Inflammatory markers dominate.
/// Summation follows this order, which keeps the result bit-reproducible.
pub const FALLBACK_TERMS: [FallbackTerm; 8] = [
    FallbackTerm { feature: Feature::Crp, ramp: Ramp::Rising { full: 200.0 }, weight: 0.20 },
    FallbackTerm { feature: Feature::Il6, ramp: Ramp::Rising { full: 2000.0 }, weight: 0.20 },
    FallbackTerm { feature: Feature::Fibrinogen, ramp: Ramp::Rising { full: 10.0 }, weight: 0.15 },
    FallbackTerm { feature: Feature::Bicarbonate, ramp: Ramp::Falling { full: 30.0 }, weight: 0.15 },
    FallbackTerm { feature: Feature::Creatinine, ramp: Ramp::Rising { full: 150.0 }, weight: 0.10 },
    FallbackTerm { feature: Feature::Hemoglobin, ramp: Ramp::Falling { full: 180.0 }, weight: 0.10 },
    FallbackTerm { feature: Feature::Platelets, ramp: Ramp::Falling { full: 400.0 }, weight: 0.05 },
    FallbackTerm { feature: Feature::FixedBowelLoops, ramp: Ramp::Flag, weight: 0.05 },
];

/// Deterministic heuristic probability in `[FALLBACK_FLOOR, FALLBACK_CEILING]`.
pub fn fallback_probability(obs: &PatientObservation) -> f64 {
    let raw = FALLBACK_TERMS.iter().fold(0.0, |acc, t| {
        let x = obs.value(t.feature).as_f64().unwrap_or(0.0);
        acc + t.ramp.apply(x) * t.weight
    });
    raw.clamp(FALLBACK_FLOOR, FALLBACK_CEILING)
}

/// Positive-class probability from the bundle's classifier.
pub fn model_probability(bundle: &ModelBundle, row: &[f64]) -> Result<f64, ScoreError> {
    let classes = bundle
        .classifier()
        .predict_proba(row)
        .map_err(|e| ScoreError::Prediction(format!("{e:#}")))?;

    let p = *classes.get(1).ok_or_else(|| {
        ScoreError::Prediction(format!(
            "classifier returned {} class probabilities, expected at least 2",
            classes.len()
        ))
    })?;

    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(ScoreError::Prediction(format!(
            "classifier returned probability {p} outside [0, 1]"
        )));
    }
    Ok(p)
}

/// Run whichever path the preprocessed input selects.
///
/// Input and bundle must agree: a vector without a bundle, or a raw observation
/// alongside a bundle, cannot come out of [`crate::preprocess::preprocess`].
/// Both are prediction failures; the heuristic never stands in for a loaded model.
pub fn estimate(prepared: &Prepared<'_>, bundle: Option<&ModelBundle>) -> Result<Estimate, ScoreError> {
    match (prepared, bundle) {
        (Prepared::Vector(row), Some(b)) => Ok(Estimate {
            probability: model_probability(b, row)?,
            source: EstimateSource::Model,
        }),
        (Prepared::Vector(_), None) => Err(ScoreError::Prediction(
            "model-ready vector supplied without a model bundle".to_string(),
        )),
        (Prepared::Raw(_), Some(_)) => Err(ScoreError::Prediction(
            "raw observation supplied while a model bundle is loaded".to_string(),
        )),
        (Prepared::Raw(obs), None) => Ok(Estimate {
            probability: fallback_probability(obs),
            source: EstimateSource::Fallback,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{Classifier, StandardScaler};
    use crate::schema::BirthWeightClass;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn minimal_risk() -> PatientObservation {
        PatientObservation {
            crp: 0.0,
            il6: 0.0,
            fibrinogen: 0.0,
            glucose: 5.0,
            bicarbonate: 30.0,
            creatinine: 0.0,
            hemoglobin: 180.0,
            platelets: 400.0,
            fixed_bowel_loops: false,
            birth_weight: BirthWeightClass::Nbw,
        }
    }

    fn maximal_risk() -> PatientObservation {
        PatientObservation {
            crp: 500.0,
            il6: 5000.0,
            fibrinogen: 15.0,
            glucose: 30.0,
            bicarbonate: 0.0,
            creatinine: 300.0,
            hemoglobin: 0.0,
            platelets: 0.0,
            fixed_bowel_loops: true,
            birth_weight: BirthWeightClass::Elbw,
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let s: f64 = FALLBACK_TERMS.iter().map(|t| t.weight).sum();
        assert!((s - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ramps_clip_to_unit_interval() {
        assert_eq!(Ramp::Rising { full: 200.0 }.apply(400.0), 1.0);
        assert_eq!(Ramp::Rising { full: 200.0 }.apply(50.0), 0.25);
        assert_eq!(Ramp::Falling { full: 30.0 }.apply(45.0), 0.0);
        assert_eq!(Ramp::Falling { full: 400.0 }.apply(0.0), 1.0);
        assert_eq!(Ramp::Flag.apply(1.0), 1.0);
        assert_eq!(Ramp::Flag.apply(0.0), 0.0);
    }

    #[test]
    fn clamp_holds_at_both_extremes() {
        assert_eq!(fallback_probability(&minimal_risk()), FALLBACK_FLOOR);
        assert_eq!(fallback_probability(&maximal_risk()), FALLBACK_CEILING);
    }

    #[test]
    fn glucose_and_birth_weight_do_not_move_the_heuristic() {
        let a = PatientObservation::schema_defaults();
        let mut b = a.clone();
        b.glucose = 29.0;
        b.birth_weight = BirthWeightClass::Elbw;
        assert_eq!(fallback_probability(&a).to_bits(), fallback_probability(&b).to_bits());
    }

    #[test]
    fn fallback_is_bit_reproducible() {
        let obs = PatientObservation::schema_defaults();
        let first = fallback_probability(&obs).to_bits();
        for _ in 0..100 {
            assert_eq!(fallback_probability(&obs).to_bits(), first);
        }
    }

    struct Fixed(Vec<f64>);
    impl Classifier for Fixed {
        fn predict_proba(&self, _row: &[f64]) -> anyhow::Result<Vec<f64>> {
            Ok(self.0.clone())
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct Broken;
    impl Classifier for Broken {
        fn predict_proba(&self, _row: &[f64]) -> anyhow::Result<Vec<f64>> {
            anyhow::bail!("booster not loaded")
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn bundle_with(c: Arc<dyn Classifier>) -> ModelBundle {
        ModelBundle::new(
            c,
            StandardScaler::identity(1),
            HashMap::new(),
            vec!["crp_mgL_24h".into()],
        )
        .unwrap()
    }

    #[test]
    fn model_path_takes_positive_class() {
        let b = bundle_with(Arc::new(Fixed(vec![0.2, 0.8])));
        let e = estimate(&Prepared::Vector(vec![1.0]), Some(&b)).unwrap();
        assert_eq!(e.probability, 0.8);
        assert_eq!(e.source, EstimateSource::Model);
    }

    #[test]
    fn model_failures_surface_instead_of_falling_back() {
        let broken = bundle_with(Arc::new(Broken));
        let err = estimate(&Prepared::Vector(vec![1.0]), Some(&broken)).unwrap_err();
        assert!(err.to_string().contains("booster not loaded"), "{err}");

        let one_class = bundle_with(Arc::new(Fixed(vec![1.0])));
        assert!(matches!(
            model_probability(&one_class, &[1.0]),
            Err(ScoreError::Prediction(_))
        ));

        let bogus = bundle_with(Arc::new(Fixed(vec![-0.5, 1.5])));
        assert!(matches!(
            model_probability(&bogus, &[1.0]),
            Err(ScoreError::Prediction(_))
        ));

        let nan = bundle_with(Arc::new(Fixed(vec![0.5, f64::NAN])));
        assert!(model_probability(&nan, &[1.0]).is_err());
    }

    #[test]
    fn raw_input_uses_fallback() {
        let obs = PatientObservation::schema_defaults();
        let e = estimate(&Prepared::Raw(&obs), None).unwrap();
        assert_eq!(e.source, EstimateSource::Fallback);
        assert_eq!(e.probability, fallback_probability(&obs));
    }

    #[test]
    fn vector_without_bundle_is_an_error() {
        assert!(estimate(&Prepared::Vector(vec![0.0]), None).is_err());
    }

    #[test]
    fn raw_input_with_bundle_is_an_error() {
        let b = bundle_with(Arc::new(Fixed(vec![0.2, 0.8])));
        let obs = PatientObservation::schema_defaults();
        let err = estimate(&Prepared::Raw(&obs), Some(&b)).unwrap_err();
        assert!(matches!(err, ScoreError::Prediction(_)), "{err}");
    }
}
