use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use super::{iso_z, PaginationQuery};
use crate::state::AppState;
use segflow_core::models::TrainRequest;
use segflow_core::Error;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/training/train", post(train))
        .route("/training/:id/status", get(training_status))
        .route("/training/list", get(list_trainings))
}

/// Submit a training job
pub async fn train(
    State(state): State<AppState>,
    Json(request): Json<TrainRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), Error> {
    let submission = state.training_service.submit_training(request).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "message": "Training started.",
            "trainingId": submission.training.id,
            "batchJobId": submission.job.external_id,
        })),
    ))
}

/// Get training status by ID
pub async fn training_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, Error> {
    let training = state.training_service.get_training_status(&id).await?;

    let mut response = serde_json::json!({
        "trainingId": training.id,
        "name": training.name,
        "status": training.status,
        "progress": training.progress,
    });

    if let Some(start_time) = training.start_time {
        response["startTime"] = serde_json::json!(iso_z(start_time));
    }
    if let Some(end_time) = training.end_time {
        response["endTime"] = serde_json::json!(iso_z(end_time));
    }
    if let Some(error_message) = training.error_message {
        response["errorMessage"] = serde_json::json!(error_message);
    }

    Ok(Json(response))
}

/// List trainings with pagination
pub async fn list_trainings(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<serde_json::Value>, Error> {
    let training_list = state
        .training_service
        .list_trainings(pagination.limit, pagination.offset)
        .await?;

    let items: Vec<serde_json::Value> = training_list
        .trainings
        .into_iter()
        .map(|t| {
            serde_json::json!({
                "trainingId": t.id,
                "name": t.name,
                "status": t.status,
                "progress": t.progress,
                "createdAt": iso_z(t.created_at),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "trainings": items,
        "meta": {
            "total": training_list.total,
            "limit": pagination.limit,
            "offset": pagination.offset,
        }
    })))
}
