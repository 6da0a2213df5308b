//! # Risk Classifier
//! Probability → ordinal tier. Intervals are closed-open, so a boundary value
//! belongs to the higher tier.

use serde::{Deserialize, Serialize};

/// Ordinal risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }

    /// One-line summary for the result banner.
    pub fn summary(self) -> &'static str {
        match self {
            RiskTier::Low => "Low probability of requiring surgery within 72 hours",
            RiskTier::Medium => "Surgery within 72 hours is possible; observe closely",
            RiskTier::High => "High probability of requiring surgery within 72 hours; prepare early",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_medium() -> f64 {
    0.40
}
fn default_high() -> f64 {
    0.70
}

/// Lower bounds of the Medium and High tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(default = "default_medium")]
    pub medium: f64,
    #[serde(default = "default_high")]
    pub high: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            medium: default_medium(),
            high: default_high(),
        }
    }
}

impl TierThresholds {
    /// Requires `0 < medium < high <= 1`.
    pub fn new(medium: f64, high: f64) -> anyhow::Result<Self> {
        let t = Self { medium, high };
        t.validate()?;
        Ok(t)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let ok = self.medium.is_finite()
            && self.high.is_finite()
            && self.medium > 0.0
            && self.medium < self.high
            && self.high <= 1.0;
        if !ok {
            anyhow::bail!(
                "invalid tier thresholds: need 0 < medium < high <= 1, got medium={} high={}",
                self.medium,
                self.high
            );
        }
        Ok(())
    }

    pub fn classify(&self, probability: f64) -> RiskTier {
        if probability >= self.high {
            RiskTier::High
        } else if probability >= self.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

/// Classify with the default 0.40 / 0.70 thresholds.
pub fn classify(probability: f64) -> RiskTier {
    TierThresholds::default().classify(probability)
}
