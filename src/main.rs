//! NEC Surgical Risk Service: binary entrypoint
//! Boots the Axum HTTP server around the scoring core.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - NEC_DEV_LOG=1
/// `NEC_LOG_FORMAT=json` switches from compact lines to JSON.
fn enable_dev_tracing() {
    let dev_flag = std::env::var("NEC_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("nec_surgery_risk=info,nec::score=debug,warn"));

    let json = std::env::var("NEC_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let router = nec_surgery_risk::app().map_err(|e| {
        tracing::error!(error = ?e, "failed to build scoring service");
        shuttle_runtime::Error::Custom(e)
    })?;

    Ok(router.into())
}
