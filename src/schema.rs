//! # Feature Schema
//! Static definition of the ten clinical inputs: identifiers, units, declared
//! ranges, UI pre-fill defaults, and the "normal" bands the warning rules flag
//! against. Pure data; every lookup is a `match` or a constant slice.
//!
//! Column ids are the names a trained model bundle refers to in its ordered
//! feature list, so they double as the serde names of [`Feature`].

use serde::{Deserialize, Serialize};

/// One of the ten clinical inputs, in canonical column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    #[serde(rename = "crp_mgL_24h")]
    Crp,
    #[serde(rename = "il6_pgml_24h")]
    Il6,
    #[serde(rename = "fibrinogen_gL_24h")]
    Fibrinogen,
    #[serde(rename = "glucose_mmolL_24h")]
    Glucose,
    #[serde(rename = "hco3_24h")]
    Bicarbonate,
    #[serde(rename = "creatinine_24h")]
    Creatinine,
    #[serde(rename = "hb_24h")]
    Hemoglobin,
    #[serde(rename = "plt_24h")]
    Platelets,
    #[serde(rename = "xray_fixed_loops")]
    FixedBowelLoops,
    #[serde(rename = "bw_cat")]
    BirthWeight,
}

impl Feature {
    pub const ALL: [Feature; 10] = [
        Feature::Crp,
        Feature::Il6,
        Feature::Fibrinogen,
        Feature::Glucose,
        Feature::Bicarbonate,
        Feature::Creatinine,
        Feature::Hemoglobin,
        Feature::Platelets,
        Feature::FixedBowelLoops,
        Feature::BirthWeight,
    ];

    /// Model-column identifier (the name used in a bundle's feature list).
    pub fn column(self) -> &'static str {
        match self {
            Feature::Crp => "crp_mgL_24h",
            Feature::Il6 => "il6_pgml_24h",
            Feature::Fibrinogen => "fibrinogen_gL_24h",
            Feature::Glucose => "glucose_mmolL_24h",
            Feature::Bicarbonate => "hco3_24h",
            Feature::Creatinine => "creatinine_24h",
            Feature::Hemoglobin => "hb_24h",
            Feature::Platelets => "plt_24h",
            Feature::FixedBowelLoops => "xray_fixed_loops",
            Feature::BirthWeight => "bw_cat",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == column.trim())
    }

    /// Short display label ("CRP", "IL-6", ...).
    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn unit(self) -> &'static str {
        self.spec().unit
    }

    pub fn spec(self) -> &'static FeatureSpec {
        // FEATURES is declared in the same order as `Feature::ALL`.
        &FEATURES[self as usize]
    }

    pub fn is_categorical(self) -> bool {
        matches!(self.spec().kind, FeatureKind::Category { .. })
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Birth-weight class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BirthWeightClass {
    /// Extremely low birth weight, < 1000 g.
    Elbw,
    /// Very low birth weight, 1000–1499 g.
    Vlbw,
    /// Low birth weight, 1500–2499 g.
    Lbw,
    /// Normal birth weight, >= 2500 g.
    Nbw,
}

impl BirthWeightClass {
    pub const ALL: [BirthWeightClass; 4] = [
        BirthWeightClass::Elbw,
        BirthWeightClass::Vlbw,
        BirthWeightClass::Lbw,
        BirthWeightClass::Nbw,
    ];

    /// Label as a trained encoder knows it.
    pub fn label(self) -> &'static str {
        match self {
            BirthWeightClass::Elbw => "ELBW",
            BirthWeightClass::Vlbw => "VLBW",
            BirthWeightClass::Lbw => "LBW",
            BirthWeightClass::Nbw => "NBW",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let l = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(l))
    }

    /// ELBW and VLBW are the elevated-risk classes.
    pub fn is_elevated_risk(self) -> bool {
        matches!(self, BirthWeightClass::Elbw | BirthWeightClass::Vlbw)
    }
}

impl std::fmt::Display for BirthWeightClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.min && x <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric {
        range: Band,
        default: f64,
        normal: Band,
    },
    Flag {
        default: bool,
    },
    Category {
        labels: &'static [&'static str],
        default: BirthWeightClass,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureSpec {
    pub feature: Feature,
    pub label: &'static str,
    pub unit: &'static str,
    pub description: &'static str,
    #[serde(flatten)]
    pub kind: FeatureKind,
}

impl FeatureSpec {
    /// Declared value range (numeric features only).
    pub fn range(&self) -> Option<Band> {
        match self.kind {
            FeatureKind::Numeric { range, .. } => Some(range),
            _ => None,
        }
    }

    /// Normal band (numeric features only).
    pub fn normal(&self) -> Option<Band> {
        match self.kind {
            FeatureKind::Numeric { normal, .. } => Some(normal),
            _ => None,
        }
    }
}

const fn numeric(
    feature: Feature,
    label: &'static str,
    unit: &'static str,
    description: &'static str,
    range: (f64, f64),
    default: f64,
    normal: (f64, f64),
) -> FeatureSpec {
    FeatureSpec {
        feature,
        label,
        unit,
        description,
        kind: FeatureKind::Numeric {
            range: Band::new(range.0, range.1),
            default,
            normal: Band::new(normal.0, normal.1),
        },
    }
}

/// The schema table, in `Feature::ALL` order.
pub static FEATURES: [FeatureSpec; 10] = [
    numeric(
        Feature::Crp,
        "CRP",
        "mg/L",
        "C-reactive protein, inflammation marker",
        (0.0, 500.0),
        50.0,
        (0.0, 10.0),
    ),
    numeric(
        Feature::Il6,
        "IL-6",
        "pg/mL",
        "Interleukin-6, inflammatory cytokine",
        (0.0, 5000.0),
        500.0,
        (0.0, 7.0),
    ),
    numeric(
        Feature::Fibrinogen,
        "Fibrinogen",
        "g/L",
        "Plasma fibrinogen concentration",
        (0.0, 15.0),
        3.0,
        (2.0, 4.0),
    ),
    numeric(
        Feature::Glucose,
        "Glucose",
        "mmol/L",
        "Blood glucose",
        (0.0, 30.0),
        6.0,
        (3.9, 6.1),
    ),
    numeric(
        Feature::Bicarbonate,
        "HCO3",
        "mmol/L",
        "Serum bicarbonate, acid-base status",
        (0.0, 40.0),
        22.0,
        (22.0, 28.0),
    ),
    numeric(
        Feature::Creatinine,
        "Creatinine",
        "µmol/L",
        "Serum creatinine, renal function",
        (0.0, 300.0),
        50.0,
        (0.0, 80.0),
    ),
    numeric(
        Feature::Hemoglobin,
        "Hemoglobin",
        "g/L",
        "Hemoglobin concentration",
        (0.0, 250.0),
        150.0,
        (145.0, 225.0),
    ),
    numeric(
        Feature::Platelets,
        "Platelets",
        "x10^9/L",
        "Platelet count",
        (0.0, 800.0),
        200.0,
        (150.0, 400.0),
    ),
    FeatureSpec {
        feature: Feature::FixedBowelLoops,
        label: "Fixed bowel loops",
        unit: "",
        description: "Fixed bowel loop sign on abdominal X-ray",
        kind: FeatureKind::Flag { default: false },
    },
    FeatureSpec {
        feature: Feature::BirthWeight,
        label: "Birth weight",
        unit: "",
        description: "ELBW <1000 g, VLBW 1000-1499 g, LBW 1500-2499 g, NBW >=2500 g",
        kind: FeatureKind::Category {
            labels: &["ELBW", "VLBW", "LBW", "NBW"],
            default: BirthWeightClass::Vlbw,
        },
    },
];
