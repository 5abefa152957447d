//! Health check endpoint for deployment probes and monitoring.

use axum::{Json, response::IntoResponse};
use serde::Serialize;

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Always "ok" while the process is serving
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
}

/// Liveness probe.
///
/// The bridge holds no connections or state of its own, so liveness is the
/// only meaningful signal; GitHub reachability is checked per request.
#[tracing::instrument(name = "health.check", skip_all)]
pub async fn health_check() -> impl IntoResponse {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
