// tests/scenarios.rs
//
// End-to-end scoring through the public `score` operation without a model
// bundle (fallback path).

use nec_surgery_risk::advisory::{tier_guidance, ALL_CLEAR};
use nec_surgery_risk::estimator::EstimateSource;
use nec_surgery_risk::{score, BirthWeightClass, Feature, PatientObservation, RiskTier};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Typical admission values (the UI defaults).
fn scenario_a() -> PatientObservation {
    PatientObservation {
        crp: 50.0,
        il6: 500.0,
        fibrinogen: 3.0,
        glucose: 6.0,
        bicarbonate: 22.0,
        creatinine: 50.0,
        hemoglobin: 150.0,
        platelets: 200.0,
        fixed_bowel_loops: false,
        birth_weight: BirthWeightClass::Vlbw,
    }
}

/// Septic, acidotic ELBW infant with fixed loops.
fn scenario_b() -> PatientObservation {
    PatientObservation {
        crp: 150.0,
        il6: 1500.0,
        fibrinogen: 5.0,
        glucose: 6.0,
        bicarbonate: 15.0,
        creatinine: 120.0,
        hemoglobin: 90.0,
        platelets: 60.0,
        fixed_bowel_loops: true,
        birth_weight: BirthWeightClass::Elbw,
    }
}

#[test]
fn scenario_a_is_low_risk() {
    let r = score(&scenario_a(), None).expect("fallback scoring never fails");

    // 0.05 + 0.05 + 0.045 + 0.04 + 0.0333 + 0.0167 + 0.025 + 0
    assert!(approx(r.probability, 0.26), "got {}", r.probability);
    assert_eq!(r.tier, RiskTier::Low);
    assert_eq!(r.source, EstimateSource::Fallback);
    assert_eq!(r.percent(), "26.0%");

    // Guidance only: no advisory threshold is crossed
    assert_eq!(r.advisories, tier_guidance(RiskTier::Low));

    // CRP, IL-6 out of band; VLBW is an elevated-risk class
    assert_eq!(r.warnings.len(), 3, "{:?}", r.warnings);
    assert!(r.warnings[0].starts_with("CRP outside normal range: 50.0 mg/L"));
    assert!(r.warnings[1].starts_with("IL-6 outside normal range: 500.0 pg/mL"));
    assert_eq!(r.warnings[2], "Birth weight class VLBW carries elevated risk");
}

#[test]
fn scenario_b_is_medium_risk_with_critical_warnings() {
    let r = score(&scenario_b(), None).unwrap();

    // .15 + .15 + .075 + .075 + .08 + .05 + .0425 + .05
    assert!(approx(r.probability, 0.6725), "got {}", r.probability);
    assert_eq!(r.tier, RiskTier::Medium);

    // Tier guidance, then every condition advisory in declaration order
    assert_eq!(r.advisories.len(), 8, "{:?}", r.advisories);
    assert_eq!(&r.advisories[..3], tier_guidance(RiskTier::Medium));
    assert!(r.advisories[3].contains("CRP markedly elevated (150.0 mg/L)"));
    assert!(r.advisories[4].contains("IL-6 markedly elevated"));
    assert!(r.advisories[5].contains("metabolic acidosis"));
    assert!(r.advisories[6].contains("thrombocytopenia"));
    assert!(r.advisories[7].contains("fixed bowel loops"));

    // Every feature except glucose is abnormal
    let expected_prefixes = [
        "CRP severely elevated: 150.0 mg/L",
        "IL-6 severely elevated: 1500.0 pg/mL",
        "Fibrinogen outside normal range: 5.0 g/L",
        "Metabolic acidosis: HCO3 15.0 mmol/L",
        "Creatinine markedly elevated: 120.0",
        "Hemoglobin outside normal range: 90.0 g/L",
        "Thrombocytopenia: platelets 60.0",
        "Imaging abnormality: fixed bowel loops",
        "Birth weight class ELBW carries elevated risk",
    ];
    assert_eq!(r.warnings.len(), expected_prefixes.len(), "{:?}", r.warnings);
    for (w, p) in r.warnings.iter().zip(expected_prefixes) {
        assert!(w.starts_with(p), "warning {w:?} should start with {p:?}");
    }
    assert!(!r.warnings.iter().any(|w| w == ALL_CLEAR));
}

#[test]
fn scenario_b_contributions_rank_loops_and_platelets_first() {
    let r = score(&scenario_b(), None).unwrap();

    assert_eq!(r.contributions.len(), 10);
    assert!(r
        .contributions
        .windows(2)
        .all(|w| w[0].score >= w[1].score));
    assert!(r.contributions.iter().all(|c| (0.0..=1.0).contains(&c.score)));

    // Loops 1.0, then PLT (400-60)/400 = 0.85
    assert_eq!(r.contributions[0].feature, Feature::FixedBowelLoops);
    assert_eq!(r.contributions[1].feature, Feature::Platelets);

    let top = r.top_contributions(3);
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].feature, Feature::FixedBowelLoops);
}

#[test]
fn scoring_is_deterministic() {
    let obs = scenario_b();
    let a = score(&obs, None).unwrap();
    let b = score(&obs, None).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.probability.to_bits(), b.probability.to_bits());
}

#[test]
fn result_serializes_for_the_ui() {
    let r = score(&scenario_a(), None).unwrap();
    let v = serde_json::to_value(&r).unwrap();

    assert_eq!(v["tier"], "low");
    assert_eq!(v["source"], "fallback");
    assert_eq!(v["contribution_table"], "display-v1");
    assert!(v["contributions"][0]["feature"].is_string());
    assert!(v["warnings"].as_array().is_some_and(|w| !w.is_empty()));
}
