// src/advisory/mod.rs
//! # Advisory Engine
//! Two ordered string lists from the tier and the raw observation:
//!
//! - **advisories**: fixed guidance for the tier, then condition-triggered
//!   advisories. Their thresholds are advisory-specific constants, separate
//!   from the fallback formula and from the schema's normal bands.
//! - **warnings**: one "abnormal indicator" rule per feature, flagged against
//!   the schema's normal band, with critical wording past a harder threshold.
//!   When nothing fires the list is exactly [`ALL_CLEAR`].

pub mod rules;

use serde::Serialize;

use crate::observation::PatientObservation;
use crate::schema::{Feature, FEATURES};
use crate::tier::RiskTier;

pub use rules::{Escalation, Rule, RuleSet, When};

/// Sentinel warning emitted when no warning rule fires.
pub const ALL_CLEAR: &str = "All indicators are within acceptable range";

pub const DISCLAIMER: &str = "This tool supports clinical decision-making only. Final diagnostic \
and treatment decisions must be made by the treating clinician based on the complete clinical picture.";

/// Fixed guidance lines per tier.
pub fn tier_guidance(tier: RiskTier) -> &'static [&'static str] {
    match tier {
        RiskTier::High => &[
            "Immediate action: request a surgical consultation to evaluate operative indications",
            "Monitoring focus: closely track vital signs and abdominal examination findings",
            "Treatment: ensure adequate fluid resuscitation and antibiotic coverage",
        ],
        RiskTier::Medium => &[
            "Recommendation: intensify monitoring and consider a surgical consultation",
            "Monitoring frequency: reassess abdominal signs every 2-4 hours",
            "Treatment: optimize the conservative medical management plan",
        ],
        RiskTier::Low => &[
            "Current status: continue conservative medical management",
            "Routine monitoring: monitor vital signs at the standard frequency",
            "Treatment: maintain the current regimen",
        ],
    }
}

/// Condition-triggered advisories.
pub fn default_advisory_rules() -> RuleSet {
    RuleSet::new(vec![
        Rule::new(
            Feature::Crp,
            When::Above(100.0),
            "Inflammation: CRP markedly elevated ({value} {unit}); prioritize infection control",
        )
        .named("crp_marked"),
        Rule::new(
            Feature::Il6,
            When::Above(1000.0),
            "Inflammatory response: IL-6 markedly elevated ({value} {unit}), indicating a strong systemic response",
        )
        .named("il6_marked"),
        Rule::new(
            Feature::Bicarbonate,
            When::Below(18.0),
            "Metabolic status: metabolic acidosis (HCO3 {value} {unit}); correct promptly",
        )
        .named("acidosis"),
        Rule::new(
            Feature::Platelets,
            When::Below(100.0),
            "Coagulation: thrombocytopenia ({value} {unit}); watch for DIC",
        )
        .named("thrombocytopenia"),
        Rule::new(
            Feature::FixedBowelLoops,
            When::Present,
            "Imaging: fixed bowel loops present; observe closely",
        )
        .named("fixed_loops"),
    ])
}

/// Critical thresholds layered on top of the normal-band warnings.
fn critical_for(feature: Feature) -> Option<(When, &'static str)> {
    match feature {
        Feature::Crp => Some((
            When::Above(100.0),
            "CRP severely elevated: {value} {unit} (> 100 {unit})",
        )),
        Feature::Il6 => Some((
            When::Above(1000.0),
            "IL-6 severely elevated: {value} {unit} (> 1000 {unit})",
        )),
        Feature::Bicarbonate => Some((
            When::Below(18.0),
            "Metabolic acidosis: HCO3 {value} {unit} (< 18 {unit})",
        )),
        Feature::Platelets => Some((
            When::Below(100.0),
            "Thrombocytopenia: platelets {value} {unit} (< 100 {unit})",
        )),
        Feature::Creatinine => Some((
            When::Above(100.0),
            "Creatinine markedly elevated: {value} {unit} (> 100 {unit})",
        )),
        _ => None,
    }
}

/// One warning per feature, derived from the schema's normal bands.
pub fn default_warning_rules() -> RuleSet {
    let rules = FEATURES
        .iter()
        .map(|spec| {
            let f = spec.feature;
            let base = match (f, spec.normal()) {
                (_, Some(band)) => Rule::new(
                    f,
                    When::Outside {
                        min: band.min,
                        max: band.max,
                    },
                    format!(
                        "{{label}} outside normal range: {{value}} {{unit}} (normal {}-{} {{unit}})",
                        band.min, band.max
                    ),
                ),
                (Feature::FixedBowelLoops, None) => Rule::new(
                    f,
                    When::Present,
                    "Imaging abnormality: fixed bowel loops on abdominal X-ray",
                ),
                (_, None) => Rule::new(
                    f,
                    When::ElevatedClass,
                    "Birth weight class {value} carries elevated risk",
                ),
            };
            let base = base.named(f.column());
            match critical_for(f) {
                Some((when, msg)) => base.critical(when, msg),
                None => base,
            }
        })
        .collect();
    RuleSet::new(rules)
}

/// Advisory and warning lists for one result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advice {
    pub advisories: Vec<String>,
    pub warnings: Vec<String>,
}

/// Rule tables, built once and reused read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryEngine {
    advisories: RuleSet,
    warnings: RuleSet,
}

impl Default for AdvisoryEngine {
    fn default() -> Self {
        Self {
            advisories: default_advisory_rules(),
            warnings: default_warning_rules(),
        }
    }
}

impl AdvisoryEngine {
    pub fn new(advisories: RuleSet, warnings: RuleSet) -> Self {
        Self {
            advisories,
            warnings,
        }
    }

    pub fn advisory_rules(&self) -> &RuleSet {
        &self.advisories
    }

    pub fn warning_rules(&self) -> &RuleSet {
        &self.warnings
    }

    pub fn advise(&self, tier: RiskTier, obs: &PatientObservation) -> Advice {
        let mut advisories: Vec<String> = tier_guidance(tier).iter().map(|s| s.to_string()).collect();
        advisories.extend(self.advisories.evaluate(obs));

        let mut warnings = self.warnings.evaluate(obs);
        if warnings.is_empty() {
            warnings.push(ALL_CLEAR.to_string());
        }

        Advice {
            advisories,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BirthWeightClass;

    fn all_normal() -> PatientObservation {
        PatientObservation {
            crp: 5.0,
            il6: 3.0,
            fibrinogen: 3.0,
            glucose: 5.0,
            bicarbonate: 24.0,
            creatinine: 50.0,
            hemoglobin: 160.0,
            platelets: 250.0,
            fixed_bowel_loops: false,
            birth_weight: BirthWeightClass::Nbw,
        }
    }

    #[test]
    fn each_tier_has_distinct_guidance() {
        let h = tier_guidance(RiskTier::High);
        let m = tier_guidance(RiskTier::Medium);
        let l = tier_guidance(RiskTier::Low);
        assert_eq!(h.len(), 3);
        assert_ne!(h, m);
        assert_ne!(m, l);
        assert!(h[0].contains("surgical consultation"));
    }

    #[test]
    fn default_tables_are_valid() {
        assert!(default_advisory_rules().validate().is_ok());
        let w = default_warning_rules();
        assert!(w.validate().is_ok());
        assert_eq!(w.rules.len(), Feature::ALL.len());
    }

    #[test]
    fn all_clear_only_when_everything_normal() {
        let engine = AdvisoryEngine::default();
        let advice = engine.advise(RiskTier::Low, &all_normal());
        assert_eq!(advice.warnings, vec![ALL_CLEAR]);
        // Tier guidance only.
        assert_eq!(advice.advisories.len(), 3);
    }

    #[test]
    fn single_abnormal_value_names_its_feature() {
        let engine = AdvisoryEngine::default();
        let mut obs = all_normal();
        obs.glucose = 9.0;
        let advice = engine.advise(RiskTier::Low, &obs);
        assert_eq!(advice.warnings.len(), 1);
        assert!(advice.warnings[0].starts_with("Glucose outside normal range: 9.0 mmol/L"));
        assert!(!advice.warnings.iter().any(|w| w == ALL_CLEAR));
    }

    #[test]
    fn critical_wording_past_hard_threshold() {
        let engine = AdvisoryEngine::default();
        let mut obs = all_normal();
        obs.bicarbonate = 15.0;
        obs.creatinine = 90.0;
        let w = engine.advise(RiskTier::Low, &obs).warnings;
        assert_eq!(w.len(), 2);
        assert!(w[0].starts_with("Metabolic acidosis: HCO3 15.0 mmol/L"), "{w:?}");
        assert!(w[1].starts_with("Creatinine outside normal range: 90.0"), "{w:?}");
    }

    #[test]
    fn birth_weight_and_loops_warn() {
        let engine = AdvisoryEngine::default();
        let mut obs = all_normal();
        obs.birth_weight = BirthWeightClass::Elbw;
        obs.fixed_bowel_loops = true;
        let w = engine.advise(RiskTier::Low, &obs).warnings;
        assert_eq!(
            w,
            vec![
                "Imaging abnormality: fixed bowel loops on abdominal X-ray",
                "Birth weight class ELBW carries elevated risk",
            ]
        );
    }

    #[test]
    fn advisories_follow_tier_guidance_and_co_occur() {
        let engine = AdvisoryEngine::default();
        let mut obs = all_normal();
        obs.crp = 150.0;
        obs.il6 = 1500.0;
        obs.bicarbonate = 15.0;
        obs.platelets = 60.0;
        obs.fixed_bowel_loops = true;
        let a = engine.advise(RiskTier::High, &obs).advisories;
        assert_eq!(a.len(), 3 + 5);
        assert_eq!(a[0], tier_guidance(RiskTier::High)[0]);
        assert!(a[3].starts_with("Inflammation: CRP"));
        assert!(a[7].starts_with("Imaging: fixed bowel loops"));
    }

    #[test]
    fn advisory_thresholds_are_strict() {
        let engine = AdvisoryEngine::default();
        let mut obs = all_normal();
        obs.crp = 100.0;
        obs.il6 = 1000.0;
        obs.bicarbonate = 18.0;
        obs.platelets = 100.0;
        let a = engine.advise(RiskTier::Medium, &obs).advisories;
        assert_eq!(a.len(), 3, "{a:?}");
    }
}
