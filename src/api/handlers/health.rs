//! Handler for the health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health with per-component checks.
///
/// # Endpoint
///
/// `GET /api/health`
///
/// # Response Codes
///
/// - **200 OK**: all components healthy
/// - **503 Service Unavailable**: one or more components degraded
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = check_database(&state).await;
    let cache = check_cache(&state).await;
    let usage_queue = check_usage_queue(&state);

    let all_healthy = database.is_ok() && cache.is_ok() && usage_queue.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            cache,
            usage_queue,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

/// Probes the store with a lookup of a reserved identifier.
async fn check_database(state: &AppState) -> CheckStatus {
    match state.urls.find_by_identifier("__health__").await {
        Ok(_) => CheckStatus::ok("Store reachable"),
        Err(e) => CheckStatus::error(format!("Store error: {e}")),
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    if state.cache.health_check().await {
        CheckStatus::ok("Cache reachable")
    } else {
        CheckStatus::error("Cache unreachable")
    }
}

fn check_usage_queue(state: &AppState) -> CheckStatus {
    if state.usage_sender.is_closed() {
        CheckStatus::error("Usage worker not running")
    } else {
        CheckStatus::ok(format!(
            "Queue capacity: {}",
            state.usage_sender.max_capacity()
        ))
    }
}
