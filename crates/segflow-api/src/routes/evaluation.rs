use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use super::{iso_z, PaginationQuery};
use crate::state::AppState;
use segflow_core::models::EvaluateRequest;
use segflow_core::Error;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/evaluation/evaluate", post(evaluate))
        .route("/evaluation/:id/status", get(evaluation_status))
        .route("/evaluation/list", get(list_evaluations))
}

/// Submit an evaluation job
pub async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), Error> {
    let submission = state.evaluation_service.submit_evaluation(request).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "message": "Evaluation started.",
            "evaluationId": submission.evaluation.id,
            "batchJobId": submission.job.external_id,
        })),
    ))
}

/// Get evaluation status by ID
pub async fn evaluation_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, Error> {
    let evaluation = state.evaluation_service.get_evaluation_status(&id).await?;

    let mut response = serde_json::json!({
        "evaluationId": evaluation.id,
        "modelId": evaluation.model_id,
        "status": evaluation.status,
        "configurations": evaluation.configurations,
        "evaluationPath": evaluation.evaluation_path,
    });

    if let Some(start_time) = evaluation.start_time {
        response["startTime"] = serde_json::json!(iso_z(start_time));
    }
    if let Some(end_time) = evaluation.end_time {
        response["endTime"] = serde_json::json!(iso_z(end_time));
    }
    if let Some(error_message) = evaluation.error_message {
        response["errorMessage"] = serde_json::json!(error_message);
    }
    if let Some(results) = evaluation.results {
        response["results"] = results;
    }

    Ok(Json(response))
}

/// List evaluations with pagination
pub async fn list_evaluations(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<serde_json::Value>, Error> {
    let evaluation_list = state
        .evaluation_service
        .list_evaluations(pagination.limit, pagination.offset)
        .await?;

    let items: Vec<serde_json::Value> = evaluation_list
        .evaluations
        .into_iter()
        .map(|e| {
            serde_json::json!({
                "evaluationId": e.id,
                "modelId": e.model_id,
                "evaluationPath": e.evaluation_path,
                "status": e.status,
                "configurations": e.configurations,
                "createdAt": iso_z(e.created_at),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "evaluations": items,
        "meta": {
            "total": evaluation_list.total,
            "limit": pagination.limit,
            "offset": pagination.offset,
        }
    })))
}
