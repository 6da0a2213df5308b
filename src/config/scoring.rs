// src/config/scoring.rs
//! Scoring configuration (tier thresholds + advisory/warning rule tables).
//!
//! TOML shape (every section optional; missing sections use built-in defaults):
//! ```toml
//! [tiers]
//! medium = 0.40
//! high = 0.70
//!
//! [[advisories.rules]]
//! name = "crp_marked"
//! feature = "crp_mgL_24h"
//! when = { above = 100.0 }
//! message = "CRP markedly elevated ({value} {unit})"
//! ```
//! Supplying a rule table replaces the built-in table for that list.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::advisory::{default_advisory_rules, default_warning_rules, AdvisoryEngine, RuleSet};
use crate::bundle::ModelBundle;
use crate::engine::Scorer;
use crate::tier::TierThresholds;

pub const ENV_SCORING_CONFIG_PATH: &str = "NEC_SCORING_CONFIG_PATH";
pub const ENV_MODEL_BUNDLE_PATH: &str = "NEC_MODEL_BUNDLE_PATH";

pub const DEFAULT_TOML_PATH: &str = "config/scoring.toml";
pub const DEFAULT_JSON_PATH: &str = "config/scoring.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub tiers: TierThresholds,
    #[serde(default = "default_advisory_rules")]
    pub advisories: RuleSet,
    #[serde(default = "default_warning_rules")]
    pub warnings: RuleSet,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tiers: TierThresholds::default(),
            advisories: default_advisory_rules(),
            warnings: default_warning_rules(),
        }
    }
}

impl ScoringConfig {
    /// Load from an explicit path. TOML or JSON by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading scoring config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse(&content, ext.as_str())
            .with_context(|| format!("parsing scoring config {}", path.display()))?;
        info!(path = %path.display(), medium = cfg.tiers.medium, high = cfg.tiers.high, "scoring config loaded");
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $NEC_SCORING_CONFIG_PATH (must exist)
    /// 2) config/scoring.toml
    /// 3) config/scoring.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_SCORING_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            } else {
                return Err(anyhow!(
                    "{ENV_SCORING_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                ));
            }
        }
        for p in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        self.tiers.validate()?;
        self.advisories.validate().context("advisory rules")?;
        self.warnings.validate().context("warning rules")?;
        Ok(())
    }

    pub fn advisory_engine(&self) -> AdvisoryEngine {
        AdvisoryEngine::new(self.advisories.clone(), self.warnings.clone())
    }

    pub fn into_scorer(self, bundle: Option<Arc<ModelBundle>>) -> Scorer {
        let engine = self.advisory_engine();
        Scorer::new(bundle, self.tiers, engine)
    }
}

fn parse(s: &str, hint_ext: &str) -> Result<ScoringConfig> {
    let cfg: ScoringConfig = match hint_ext {
        "json" => serde_json::from_str(s)?,
        _ => toml::from_str(s)?,
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Optional model bundle from `$NEC_MODEL_BUNDLE_PATH`. Unset means fallback
/// mode; set but unreadable is an error (a half-configured deployment should
/// not quietly score with the heuristic).
pub fn load_bundle_default() -> Result<Option<ModelBundle>> {
    match std::env::var(ENV_MODEL_BUNDLE_PATH) {
        Ok(p) if !p.trim().is_empty() => ModelBundle::load_json(Path::new(p.trim())).map(Some),
        _ => {
            info!("no model bundle configured; using fallback heuristic");
            Ok(None)
        }
    }
}
