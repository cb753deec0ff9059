/*!
 * # Health Check Module
 *
 * - Liveness (`/health`): the process is serving requests
 * - Readiness (`/health/ready`): the database answers a ping; 503 otherwise
 */

use crate::{errors::ServiceError, AppState};
use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use tracing::warn;

/// Component health status
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
}

/// Liveness check endpoint
pub async fn liveness_check() -> impl IntoResponse {
    Json(json!({
        "status": HealthStatus::Up,
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Readiness check endpoint
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServiceError> {
    let start = Instant::now();

    crate::db::check_connection(&state.db).await.map_err(|e| {
        warn!(error = %e, "readiness check failed");
        ServiceError::ServiceUnavailable("database is not reachable".to_string())
    })?;

    Ok(Json(json!({
        "status": HealthStatus::Up,
        "checks": {
            "database": {
                "status": HealthStatus::Up,
                "latency_ms": start.elapsed().as_millis() as u64,
            }
        }
    })))
}

/// Health routes, mounted under `/health`
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(liveness_check))
        .route("/ready", get(readiness_check))
}
