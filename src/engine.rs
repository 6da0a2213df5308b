//! # Scoring Engine
//! Pure, testable pipeline that maps one `PatientObservation` (+ optional
//! `ModelBundle`) → `PredictionResult`. No I/O and no shared mutable state;
//! the bundle is only read.
//!
//! raw observation → preprocess → estimate → probability
//!   ├─ tier
//!   ├─ contributions (raw observation)
//!   └─ advisories + warnings (tier, raw observation)

use std::sync::Arc;

use tracing::debug;

use crate::advisory::AdvisoryEngine;
use crate::bundle::ModelBundle;
use crate::contributions::{self, DISPLAY_TABLE_VERSION};
use crate::error::ScoreError;
use crate::estimator;
use crate::observation::PatientObservation;
use crate::prediction::PredictionResult;
use crate::preprocess;
use crate::tier::TierThresholds;

/// Score with the default thresholds and rule tables.
pub fn score(
    obs: &PatientObservation,
    bundle: Option<&ModelBundle>,
) -> Result<PredictionResult, ScoreError> {
    score_with(obs, bundle, &TierThresholds::default(), &AdvisoryEngine::default())
}

/// Full pipeline with explicit thresholds and rule tables.
pub fn score_with(
    obs: &PatientObservation,
    bundle: Option<&ModelBundle>,
    thresholds: &TierThresholds,
    advisory: &AdvisoryEngine,
) -> Result<PredictionResult, ScoreError> {
    // 1) Preprocess + estimate: the only fallible steps
    let prepared = preprocess::preprocess(obs, bundle)?;
    let est = estimator::estimate(&prepared, bundle)?;

    // 2) Independent, total branches
    let tier = thresholds.classify(est.probability);
    let contributions = contributions::analyze(obs);
    let advice = advisory.advise(tier, obs);

    if tracing::enabled!(tracing::Level::DEBUG) {
        debug!(
            target: "nec::score",
            id = %obs.fingerprint(),
            source = est.source.as_str(),
            probability = est.probability,
            %tier,
            warnings = advice.warnings.len(),
            "scored observation"
        );
    }

    Ok(PredictionResult {
        probability: est.probability,
        tier,
        summary: tier.summary(),
        source: est.source,
        contributions,
        contribution_table: DISPLAY_TABLE_VERSION,
        advisories: advice.advisories,
        warnings: advice.warnings,
    })
}

/// Long-lived scorer: the bundle (if any) and rule tables, built once and
/// shared read-only across requests.
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    bundle: Option<Arc<ModelBundle>>,
    thresholds: TierThresholds,
    advisory: AdvisoryEngine,
}

impl Scorer {
    pub fn new(
        bundle: Option<Arc<ModelBundle>>,
        thresholds: TierThresholds,
        advisory: AdvisoryEngine,
    ) -> Self {
        Self {
            bundle,
            thresholds,
            advisory,
        }
    }

    pub fn with_bundle(mut self, bundle: Arc<ModelBundle>) -> Self {
        self.bundle = Some(bundle);
        self
    }

    pub fn bundle(&self) -> Option<&ModelBundle> {
        self.bundle.as_deref()
    }

    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    pub fn advisory(&self) -> &AdvisoryEngine {
        &self.advisory
    }

    pub fn score(&self, obs: &PatientObservation) -> Result<PredictionResult, ScoreError> {
        score_with(obs, self.bundle(), &self.thresholds, &self.advisory)
    }
}
