//! Prometheus metrics for the scoring service.
//!
//! Series:
//! - `nec_score_requests_total{source}`  (model | fallback)
//! - `nec_score_tier_total{tier}`        (low | medium | high)
//! - `nec_score_errors_total{kind}`      (validation | encoding | prediction)
//! - `nec_score_probability`             (histogram)
//! - `nec_model_bundle_loaded`           (gauge, 0/1)

use shuttle_axum::axum::{routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::warn;

use crate::prediction::PredictionResult;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process; later calls reuse it.
    pub fn init(bundle_loaded: bool) -> Self {
        let handle = HANDLE
            .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
                Ok(h) => h,
                Err(e) => {
                    // Another recorder owns the process; keep a detached handle.
                    warn!(error = %e, "prometheus recorder already installed");
                    PrometheusBuilder::new().build_recorder().handle()
                }
            })
            .clone();

        gauge!("nec_model_bundle_loaded").set(if bundle_loaded { 1.0 } else { 0.0 });

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

pub fn record_score(result: &PredictionResult) {
    counter!("nec_score_requests_total", "source" => result.source.as_str()).increment(1);
    counter!("nec_score_tier_total", "tier" => result.tier.as_str()).increment(1);
    histogram!("nec_score_probability").record(result.probability);
}

pub fn record_error(kind: &'static str) {
    counter!("nec_score_errors_total", "kind" => kind).increment(1);
}
