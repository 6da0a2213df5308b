//! Plain-data output of one scoring request.
//!
//! Produced fresh per request and never mutated afterwards; the UI layer renders
//! it as-is.

use serde::Serialize;

use crate::contributions::{top_n, Contribution};
use crate::estimator::EstimateSource;
use crate::tier::RiskTier;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Probability of surgery within 72h, in `[0, 1]`.
    pub probability: f64,
    pub tier: RiskTier,
    /// Banner line describing the tier.
    pub summary: &'static str,
    /// `model` or `fallback`; a heuristic number is never shown as model output.
    pub source: EstimateSource,
    /// Ranked descending.
    pub contributions: Vec<Contribution>,
    /// Version tag of the display table that produced `contributions`.
    pub contribution_table: &'static str,
    pub advisories: Vec<String>,
    pub warnings: Vec<String>,
}

impl PredictionResult {
    /// Probability as a percentage with one decimal, e.g. `"26.0%"`.
    pub fn percent(&self) -> String {
        format!("{:.1}%", self.probability * 100.0)
    }

    pub fn top_contributions(&self, n: usize) -> &[Contribution] {
        top_n(&self.contributions, n)
    }

    pub fn is_model_backed(&self) -> bool {
        self.source == EstimateSource::Model
    }
}
