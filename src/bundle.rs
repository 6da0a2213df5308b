//! # Model Bundle
//! The trained classifier plus everything needed to feed it: feature scaler,
//! categorical encoders, and the ordered column list. Either fully present or
//! absent; [`ModelBundle::new`] refuses partial bundles.
//!
//! A bundle is built once per process and shared read-only (`Arc`) across
//! requests. Nothing in the crate mutates it after construction.
//!
//! JSON shape accepted by [`ModelBundle::from_json_str`]:
//! ```json
//! {
//!   "feature_cols": ["crp_mgL_24h", "il6_pgml_24h", "bw_cat"],
//!   "scaler": { "mean": [40.0, 600.0, 1.5], "scale": [30.0, 400.0, 1.1] },
//!   "encoders": { "bw_cat": ["ELBW", "LBW", "NBW", "VLBW"] },
//!   "classifier": { "coefficients": [0.8, 0.6, -0.2], "intercept": -1.1 },
//!   "info": { "algorithm": "logistic", "validation_auc": 0.81 }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::BundleError;
use crate::schema::Feature;

/// Trait object seam for the trained model.
pub trait Classifier: Send + Sync {
    /// Class probabilities for a single, already scaled row.
    /// Index 1 is the positive class ("surgery within 72h").
    fn predict_proba(&self, row: &[f64]) -> anyhow::Result<Vec<f64>>;

    /// Expected input width, when the model knows it.
    fn n_features(&self) -> Option<usize> {
        None
    }

    /// Model family name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Binary logistic regression over the scaled vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticClassifier {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl Classifier for LogisticClassifier {
    fn predict_proba(&self, row: &[f64]) -> anyhow::Result<Vec<f64>> {
        if row.len() != self.coefficients.len() {
            return Err(anyhow!(
                "feature count mismatch: got {}, model expects {}",
                row.len(),
                self.coefficients.len()
            ));
        }
        let z = self
            .coefficients
            .iter()
            .zip(row)
            .fold(self.intercept, |acc, (w, x)| acc + w * x);
        let p = 1.0 / (1.0 + (-z).exp());
        Ok(vec![1.0 - p, p])
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn name(&self) -> &'static str {
        "logistic"
    }
}

/// Standardization: `(x - mean) / scale`. A zero scale is treated as 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }

    /// Identity scaler of width `n`.
    pub fn identity(n: usize) -> Self {
        Self::new(vec![0.0; n], vec![1.0; n])
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| {
                let s = if *s == 0.0 { 1.0 } else { *s };
                (x - m) / s
            })
            .collect()
    }
}

/// Label encoder: a label maps to its index in the sorted class list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = classes.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Index of `label`, or `None` for an unseen label.
    pub fn transform(&self, label: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
    }
}

impl From<Vec<String>> for LabelEncoder {
    fn from(v: Vec<String>) -> Self {
        Self::new(v)
    }
}

impl From<LabelEncoder> for Vec<String> {
    fn from(e: LabelEncoder) -> Self {
        e.classes
    }
}

/// Display metadata about the trained model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub algorithm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_auc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specificity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_cases: Option<u32>,
}

/// Classifier + scaler + encoders + column order, as one immutable unit.
#[derive(Clone)]
pub struct ModelBundle {
    classifier: Arc<dyn Classifier>,
    scaler: StandardScaler,
    encoders: HashMap<Feature, LabelEncoder>,
    columns: Vec<Feature>,
    info: Option<ModelInfo>,
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("classifier", &self.classifier.name())
            .field("columns", &self.columns)
            .field("encoders", &self.encoders.keys().collect::<Vec<_>>())
            .field("info", &self.info)
            .finish()
    }
}

impl ModelBundle {
    /// Assemble and validate a bundle. Column and encoder keys are model column
    /// ids (e.g. `"bw_cat"`).
    pub fn new(
        classifier: Arc<dyn Classifier>,
        scaler: StandardScaler,
        encoders: HashMap<String, LabelEncoder>,
        columns: Vec<String>,
    ) -> Result<Self, BundleError> {
        if columns.is_empty() {
            return Err(BundleError::NoColumns);
        }

        let mut resolved = Vec::with_capacity(columns.len());
        for c in &columns {
            let f = Feature::from_column(c).ok_or_else(|| BundleError::UnknownColumn(c.clone()))?;
            if resolved.contains(&f) {
                return Err(BundleError::DuplicateColumn(c.clone()));
            }
            resolved.push(f);
        }

        for dim in [scaler.mean.len(), scaler.scale.len()] {
            if dim != resolved.len() {
                return Err(BundleError::ScalerDimension {
                    found: dim,
                    expected: resolved.len(),
                });
            }
        }

        if let Some(n) = classifier.n_features() {
            if n != resolved.len() {
                return Err(BundleError::ClassifierDimension {
                    found: n,
                    expected: resolved.len(),
                });
            }
        }

        let mut by_feature = HashMap::new();
        for (key, enc) in encoders {
            let f = Feature::from_column(&key).ok_or(BundleError::UnknownColumn(key))?;
            by_feature.insert(f, enc);
        }
        for f in resolved.iter().filter(|f| f.is_categorical()) {
            match by_feature.get(f) {
                None => return Err(BundleError::MissingEncoder(f.column().to_string())),
                Some(e) if e.classes().is_empty() => {
                    return Err(BundleError::EmptyEncoder(f.column().to_string()))
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            classifier,
            scaler,
            encoders: by_feature,
            columns: resolved,
            info: None,
        })
    }

    pub fn with_info(mut self, info: ModelInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn columns(&self) -> &[Feature] {
        &self.columns
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn encoder(&self, feature: Feature) -> Option<&LabelEncoder> {
        self.encoders.get(&feature)
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn info(&self) -> Option<&ModelInfo> {
        self.info.as_ref()
    }

    /// Parse the JSON bundle form (logistic classifier).
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let file: BundleFile = serde_json::from_str(s).context("parsing model bundle JSON")?;
        let bundle = ModelBundle::new(
            Arc::new(file.classifier),
            file.scaler,
            file.encoders,
            file.feature_cols,
        )?;
        Ok(match file.info {
            Some(i) => bundle.with_info(i),
            None => bundle,
        })
    }

    /// Load a bundle from disk. Called once at start-up.
    pub fn load_json(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading model bundle from {}", path.display()))?;
        let bundle = Self::from_json_str(&content)
            .with_context(|| format!("loading model bundle {}", path.display()))?;
        info!(
            path = %path.display(),
            classifier = bundle.classifier.name(),
            columns = bundle.columns.len(),
            "model bundle loaded"
        );
        Ok(bundle)
    }
}

#[derive(Deserialize)]
struct BundleFile {
    feature_cols: Vec<String>,
    scaler: StandardScaler,
    #[serde(default)]
    encoders: HashMap<String, LabelEncoder>,
    classifier: LogisticClassifier,
    #[serde(default)]
    info: Option<ModelInfo>,
}
