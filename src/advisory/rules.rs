//! Declarative threshold rules over the raw observation.
//!
//! Each rule is `(feature, condition) -> message`, evaluated independently:
//! every rule runs, in declaration order, and any number may fire.
//!
//! Conditions (TOML/JSON, externally tagged):
//! - `{ above = x }`:  value > x
//! - `{ below = x }`:  value < x
//! - `{ outside = { min = a, max = b } }`: value outside the closed band
//! - `"present"`:      flag set (numeric: > 0)
//! - `"elevated_class"`: birth-weight class is ELBW or VLBW
//!
//! Messages may use `{label}`, `{value}` and `{unit}`. A rule may carry a
//! `critical` escalation whose message replaces the base one when its own
//! condition also holds.

use serde::{Deserialize, Serialize};

use crate::observation::{FeatureValue, PatientObservation};
use crate::schema::Feature;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: Option<String>,
    pub feature: Feature,
    pub when: When,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<Escalation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Escalation {
    pub when: When,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum When {
    Above(f64),
    Below(f64),
    Outside { min: f64, max: f64 },
    Present,
    ElevatedClass,
}

impl When {
    pub fn matches(&self, value: FeatureValue) -> bool {
        match (*self, value) {
            (When::ElevatedClass, FeatureValue::Class(c)) => c.is_elevated_risk(),
            (When::Present, FeatureValue::Flag(b)) => b,
            (_, FeatureValue::Class(_)) | (When::ElevatedClass, _) => false,
            (cond, v) => {
                let Some(x) = v.as_f64() else {
                    return false;
                };
                match cond {
                    When::Above(t) => x > t,
                    When::Below(t) => x < t,
                    When::Outside { min, max } => !(x >= min && x <= max),
                    When::Present => x > 0.0,
                    When::ElevatedClass => false,
                }
            }
        }
    }

    /// Whether this condition can ever apply to `feature`.
    pub fn fits(&self, feature: Feature) -> bool {
        match self {
            When::ElevatedClass => feature == Feature::BirthWeight,
            _ => feature != Feature::BirthWeight,
        }
    }
}

impl Rule {
    pub fn new(feature: Feature, when: When, message: impl Into<String>) -> Self {
        Self {
            name: None,
            feature,
            when,
            message: message.into(),
            critical: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn critical(mut self, when: When, message: impl Into<String>) -> Self {
        self.critical = Some(Escalation {
            when,
            message: message.into(),
        });
        self
    }

    /// Rendered message if the rule fires for `obs`.
    pub fn fire(&self, obs: &PatientObservation) -> Option<String> {
        let v = obs.value(self.feature);
        if !self.when.matches(v) {
            return None;
        }
        let template = match &self.critical {
            Some(c) if c.when.matches(v) => &c.message,
            _ => &self.message,
        };
        Some(render(template, self.feature, v))
    }
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Every rule, in declaration order; no short-circuit.
    pub fn evaluate(&self, obs: &PatientObservation) -> Vec<String> {
        self.rules.iter().filter_map(|r| r.fire(obs)).collect()
    }

    /// Reject rules that could never fire or would render empty text.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (i, r) in self.rules.iter().enumerate() {
            let id = r.name.clone().unwrap_or_else(|| format!("#{i}"));
            if r.message.trim().is_empty() {
                anyhow::bail!("rule {id}: empty message");
            }
            if !r.when.fits(r.feature) {
                anyhow::bail!("rule {id}: condition {:?} does not apply to {}", r.when, r.feature);
            }
            if let Some(c) = &r.critical {
                if c.message.trim().is_empty() || !c.when.fits(r.feature) {
                    anyhow::bail!("rule {id}: invalid critical escalation");
                }
            }
        }
        Ok(())
    }
}

fn render(template: &str, feature: Feature, value: FeatureValue) -> String {
    template
        .replace("{label}", feature.label())
        .replace("{value}", &value.to_string())
        .replace("{unit}", feature.unit())
}
