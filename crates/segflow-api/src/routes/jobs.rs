use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::state::AppState;
use segflow_core::Error;

pub fn router() -> Router<AppState> {
    Router::new().route("/jobs/:id/poll", get(poll_job))
}

/// Poll the scheduler once for a specific job, without mutating anything.
/// Routed through whichever monitor owns the job's kind.
pub async fn poll_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, Error> {
    let info = state
        .engine
        .manager()
        .poll_once(&id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Job not found: {}", id)))?;

    Ok(Json(serde_json::json!({ "jobId": id, "scheduler": info })))
}
