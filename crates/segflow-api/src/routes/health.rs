use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::state::AppState;
use segflow_core::repository::JobRepository;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/db", get(health_db))
        .route("/health/poller", get(health_poller))
}

/// Overall service health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let engine = state.engine.health().await;

    let status = if engine.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if engine.healthy { "healthy" } else { "unhealthy" },
            "version": segflow_core::VERSION,
            "database": engine.database_healthy,
            "poller": engine.manager_running,
        })),
    )
}

/// Database connectivity health
pub async fn health_db(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "healthy" })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "unhealthy",
                "error": e.to_string(),
            })),
        ),
    }
}

/// Reconciliation engine health with per-monitor detail and job totals
pub async fn health_poller(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let engine = state.engine.health().await;
    let manager_status = state.engine.status().await;

    let jobs = JobRepository::new(state.db.clone());
    let job_counts = match (jobs.count().await, jobs.active_jobs().await) {
        (Ok(total), Ok(active)) => serde_json::json!({
            "total": total,
            "active": active.len(),
        }),
        _ => serde_json::json!({ "unavailable": true }),
    };

    let status = if engine.manager_running {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if engine.manager_running { "healthy" } else { "unhealthy" },
            "manager": manager_status,
            "jobs": job_counts,
        })),
    )
}
