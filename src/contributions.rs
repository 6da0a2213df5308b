//! # Contribution Analyzer
//! Per-feature, non-negative push toward surgical risk, for bar-chart ranking.
//! Not a calibrated attribution: no Shapley guarantee, even with a trained model.
//!
//! The display table is versioned on its own and deliberately not shared with
//! [`crate::estimator::FALLBACK_TERMS`]. It covers all ten features (glucose and
//! birth weight included), the fallback weights cover eight.

use serde::Serialize;

use crate::observation::{FeatureValue, PatientObservation};
use crate::schema::Feature;

/// Version tag of [`DISPLAY_TABLE`]; bump on any change to the scales below.
pub const DISPLAY_TABLE_VERSION: &str = "display-v1";

/// Chart scale of one feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayScale {
    Rising(f64),
    Falling(f64),
    Flag,
    /// Fixed score by birth-weight class.
    Class { elevated: f64, other: f64 },
}

pub const DISPLAY_TABLE: [(Feature, DisplayScale); 10] = [
    (Feature::Crp, DisplayScale::Rising(200.0)),
    (Feature::Il6, DisplayScale::Rising(2000.0)),
    (Feature::Fibrinogen, DisplayScale::Rising(10.0)),
    (Feature::Glucose, DisplayScale::Rising(20.0)),
    (Feature::Bicarbonate, DisplayScale::Falling(30.0)),
    (Feature::Creatinine, DisplayScale::Rising(150.0)),
    (Feature::Hemoglobin, DisplayScale::Falling(180.0)),
    (Feature::Platelets, DisplayScale::Falling(400.0)),
    (Feature::FixedBowelLoops, DisplayScale::Flag),
    (
        Feature::BirthWeight,
        DisplayScale::Class {
            elevated: 0.3,
            other: 0.1,
        },
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contribution {
    pub feature: Feature,
    pub label: &'static str,
    /// In `[0, 1]`.
    pub score: f64,
}

impl DisplayScale {
    fn score(self, v: FeatureValue) -> f64 {
        let raw = match (self, v) {
            (DisplayScale::Rising(full), FeatureValue::Number(x)) => x / full,
            (DisplayScale::Falling(full), FeatureValue::Number(x)) => (full - x) / full,
            (DisplayScale::Flag, FeatureValue::Flag(b)) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            (DisplayScale::Class { elevated, other }, FeatureValue::Class(c)) => {
                if c.is_elevated_risk() {
                    elevated
                } else {
                    other
                }
            }
            // Scale/value kinds are fixed by the table; a mismatch contributes nothing.
            _ => 0.0,
        };
        if raw.is_nan() {
            0.0
        } else {
            raw.clamp(0.0, 1.0)
        }
    }
}

/// All ten contributions, sorted descending. Ties keep column order.
pub fn analyze(obs: &PatientObservation) -> Vec<Contribution> {
    let mut out: Vec<Contribution> = DISPLAY_TABLE
        .iter()
        .map(|&(feature, scale)| Contribution {
            feature,
            label: feature.label(),
            score: scale.score(obs.value(feature)),
        })
        .collect();
    // `sort_by` is stable.
    out.sort_by(|a, b| b.score.total_cmp(&a.score));
    out
}

/// First `n` entries of an already ranked list.
pub fn top_n(ranked: &[Contribution], n: usize) -> &[Contribution] {
    &ranked[..n.min(ranked.len())]
}
