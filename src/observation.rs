//! The unit of work: latest 24h values for one patient.
//!
//! Constructed fresh per request, immutable while scoring. The core assumes the
//! caller already enforced schema ranges; [`PatientObservation::validate`] is the
//! host-side check the HTTP layer runs before scoring.

use serde::{Deserialize, Serialize};

use crate::schema::{Band, BirthWeightClass, Feature, FeatureKind};

/// Worst values within the last 24 hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientObservation {
    #[serde(rename = "crp_mgL_24h")]
    pub crp: f64,
    #[serde(rename = "il6_pgml_24h")]
    pub il6: f64,
    #[serde(rename = "fibrinogen_gL_24h")]
    pub fibrinogen: f64,
    #[serde(rename = "glucose_mmolL_24h")]
    pub glucose: f64,
    #[serde(rename = "hco3_24h")]
    pub bicarbonate: f64,
    #[serde(rename = "creatinine_24h")]
    pub creatinine: f64,
    #[serde(rename = "hb_24h")]
    pub hemoglobin: f64,
    #[serde(rename = "plt_24h")]
    pub platelets: f64,
    #[serde(rename = "xray_fixed_loops", with = "flag")]
    pub fixed_bowel_loops: bool,
    #[serde(rename = "bw_cat")]
    pub birth_weight: BirthWeightClass,
}

/// Typed view of one input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Flag(bool),
    Class(BirthWeightClass),
}

impl FeatureValue {
    /// Numeric reading; flags read as 0/1, categories have none.
    pub fn as_f64(self) -> Option<f64> {
        match self {
            FeatureValue::Number(x) => Some(x),
            FeatureValue::Flag(b) => Some(if b { 1.0 } else { 0.0 }),
            FeatureValue::Class(_) => None,
        }
    }
}

impl std::fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureValue::Number(x) => write!(f, "{x:.1}"),
            FeatureValue::Flag(true) => f.write_str("present"),
            FeatureValue::Flag(false) => f.write_str("absent"),
            FeatureValue::Class(c) => write!(f, "{c}"),
        }
    }
}

/// One out-of-range input reported by [`PatientObservation::validate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeViolation {
    pub feature: Feature,
    pub value: f64,
    pub range: Band,
}

impl std::fmt::Display for RangeViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} = {} outside [{}, {}] {}",
            self.feature.label(),
            self.value,
            self.range.min,
            self.range.max,
            self.feature.unit()
        )
    }
}

impl PatientObservation {
    /// Observation pre-filled with the schema defaults (what the UI shows first).
    pub fn schema_defaults() -> Self {
        let num = |f: Feature| match f.spec().kind {
            FeatureKind::Numeric { default, .. } => default,
            _ => 0.0,
        };
        Self {
            crp: num(Feature::Crp),
            il6: num(Feature::Il6),
            fibrinogen: num(Feature::Fibrinogen),
            glucose: num(Feature::Glucose),
            bicarbonate: num(Feature::Bicarbonate),
            creatinine: num(Feature::Creatinine),
            hemoglobin: num(Feature::Hemoglobin),
            platelets: num(Feature::Platelets),
            fixed_bowel_loops: false,
            birth_weight: BirthWeightClass::Vlbw,
        }
    }

    pub fn value(&self, feature: Feature) -> FeatureValue {
        match feature {
            Feature::Crp => FeatureValue::Number(self.crp),
            Feature::Il6 => FeatureValue::Number(self.il6),
            Feature::Fibrinogen => FeatureValue::Number(self.fibrinogen),
            Feature::Glucose => FeatureValue::Number(self.glucose),
            Feature::Bicarbonate => FeatureValue::Number(self.bicarbonate),
            Feature::Creatinine => FeatureValue::Number(self.creatinine),
            Feature::Hemoglobin => FeatureValue::Number(self.hemoglobin),
            Feature::Platelets => FeatureValue::Number(self.platelets),
            Feature::FixedBowelLoops => FeatureValue::Flag(self.fixed_bowel_loops),
            Feature::BirthWeight => FeatureValue::Class(self.birth_weight),
        }
    }

    /// Check every numeric input against its declared range.
    /// Non-finite values are always violations.
    pub fn validate(&self) -> Result<(), Vec<RangeViolation>> {
        let violations: Vec<RangeViolation> = Feature::ALL
            .into_iter()
            .filter_map(|f| {
                let range = f.spec().range()?;
                let value = self.value(f).as_f64()?;
                if value.is_finite() && range.contains(value) {
                    None
                } else {
                    Some(RangeViolation {
                        feature: f,
                        value,
                        range,
                    })
                }
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Short anonymized id for log correlation. Raw values never reach the logs.
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&canonical);
        let mut out = String::with_capacity(12);
        for b in digest.iter().take(6) {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

/// The fixed-loop sign arrives from forms as 0/1 as often as true/false.
mod flag {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bool(*v)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Int(i64),
        }
        match Raw::deserialize(d)? {
            Raw::Bool(b) => Ok(b),
            Raw::Int(0) => Ok(false),
            Raw::Int(1) => Ok(true),
            Raw::Int(n) => Err(de::Error::custom(format!(
                "xray_fixed_loops must be 0/1 or a boolean, got {n}"
            ))),
        }
    }
}
