use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shuttle_axum::axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::advisory::{RuleSet, DISCLAIMER};
use crate::bundle::ModelInfo;
use crate::config::{load_bundle_default, ScoringConfig};
use crate::contributions::DISPLAY_TABLE_VERSION;
use crate::engine::Scorer;
use crate::error::ScoreError;
use crate::metrics::{self, Metrics};
use crate::observation::{PatientObservation, RangeViolation};
use crate::prediction::PredictionResult;
use crate::schema::{FeatureSpec, FEATURES};
use crate::tier::{RiskTier, TierThresholds};

#[derive(Clone)]
pub struct AppState {
    scorer: Arc<Scorer>,
}

impl AppState {
    pub fn new(scorer: Scorer) -> Self {
        Self {
            scorer: Arc::new(scorer),
        }
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }
}

/// Scoring routes only; `/metrics` is merged by [`app`].
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/schema", get(schema))
        .route("/model", get(model))
        .route("/score", post(score))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Full application as the binary runs it: config and bundle from the
/// environment, Prometheus recorder installed, `/metrics` exposed.
pub fn app() -> anyhow::Result<Router> {
    let cfg = ScoringConfig::load_default()?;
    let bundle = load_bundle_default()?.map(Arc::new);
    let metrics = Metrics::init(bundle.is_some());

    info!(
        model = bundle.is_some(),
        medium = cfg.tiers.medium,
        high = cfg.tiers.high,
        "scoring service ready"
    );

    let state = AppState::new(cfg.into_scorer(bundle));
    Ok(router(state).merge(metrics.router()))
}

#[derive(Serialize)]
struct TierOut {
    tier: RiskTier,
    summary: &'static str,
}

#[derive(Serialize)]
struct RulesOut {
    advisories: RuleSet,
    warnings: RuleSet,
}

#[derive(Serialize)]
struct SchemaOut {
    features: &'static [FeatureSpec],
    tiers: TierThresholds,
    tier_summaries: Vec<TierOut>,
    rules: RulesOut,
    contribution_table: &'static str,
    disclaimer: &'static str,
}

async fn schema(State(state): State<AppState>) -> Json<SchemaOut> {
    let advisory = state.scorer.advisory();
    Json(SchemaOut {
        features: &FEATURES,
        tiers: *state.scorer.thresholds(),
        tier_summaries: [RiskTier::Low, RiskTier::Medium, RiskTier::High]
            .into_iter()
            .map(|tier| TierOut {
                tier,
                summary: tier.summary(),
            })
            .collect(),
        rules: RulesOut {
            advisories: advisory.advisory_rules().clone(),
            warnings: advisory.warning_rules().clone(),
        },
        contribution_table: DISPLAY_TABLE_VERSION,
        disclaimer: DISCLAIMER,
    })
}

#[derive(Serialize)]
struct ModelOut {
    loaded: bool,
    classifier: Option<&'static str>,
    info: Option<ModelInfo>,
}

async fn model(State(state): State<AppState>) -> Json<ModelOut> {
    let bundle = state.scorer.bundle();
    Json(ModelOut {
        loaded: bundle.is_some(),
        classifier: bundle.map(|b| b.classifier().name()),
        info: bundle.and_then(|b| b.info().cloned()),
    })
}

#[derive(Serialize)]
struct ScoreOut {
    result: PredictionResult,
    scored_at: DateTime<Utc>,
}

async fn score(
    State(state): State<AppState>,
    payload: Result<Json<PatientObservation>, JsonRejection>,
) -> Result<Json<ScoreOut>, ApiError> {
    let Json(obs) = payload.map_err(ApiError::Malformed)?;
    obs.validate().map_err(ApiError::OutOfRange)?;

    let result = state.scorer.score(&obs).map_err(ApiError::Score)?;
    metrics::record_score(&result);

    Ok(Json(ScoreOut {
        result,
        scored_at: Utc::now(),
    }))
}

enum ApiError {
    /// Body is not a well-formed observation (syntax, unknown label, missing field).
    Malformed(JsonRejection),
    OutOfRange(Vec<RangeViolation>),
    Score(ScoreError),
}

#[derive(Serialize)]
struct ErrorOut {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    violations: Vec<RangeViolation>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Malformed(rejection) => (
                rejection.status(),
                ErrorOut {
                    error: "validation",
                    message: rejection.body_text(),
                    violations: Vec::new(),
                },
            ),
            ApiError::OutOfRange(violations) => {
                let message = violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorOut {
                        error: "validation",
                        message,
                        violations,
                    },
                )
            }
            ApiError::Score(e) => {
                let status = match e {
                    ScoreError::Encoding(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    ScoreError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (
                    status,
                    ErrorOut {
                        error: e.kind(),
                        message: e.to_string(),
                        violations: Vec::new(),
                    },
                )
            }
        };

        metrics::record_error(body.error);
        warn!(kind = body.error, status = status.as_u16(), "score request rejected");
        (status, Json(body)).into_response()
    }
}
