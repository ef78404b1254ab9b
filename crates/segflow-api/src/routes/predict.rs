use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};

use super::{iso_z, PaginationQuery};
use crate::state::AppState;
use segflow_core::models::PredictRequest;
use segflow_core::Error;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/predict/predict", post(predict))
        .route("/predict/:id/status", get(prediction_status))
        .route("/predict/list", get(list_predictions))
}

/// Submit a prediction job
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<serde_json::Value>, Error> {
    let submission = state.inference_service.submit_prediction(request).await?;

    Ok(Json(serde_json::json!({
        "predictId": submission.inference.id,
        "modelId": submission.inference.model_id,
        "batchJobId": submission.job.external_id,
        "timestamp": iso_z(submission.inference.created_at),
    })))
}

/// Get prediction status by ID
pub async fn prediction_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, Error> {
    let inference = state.inference_service.get_prediction_status(&id).await?;

    let mut response = serde_json::json!({
        "predictId": inference.id,
        "modelId": inference.model_id,
        "status": inference.status,
        "outputDir": inference.output_dir,
    });

    if let Some(start_time) = inference.start_time {
        response["startTime"] = serde_json::json!(iso_z(start_time));
    }
    if let Some(end_time) = inference.end_time {
        response["endTime"] = serde_json::json!(iso_z(end_time));
    }
    if let Some(error_message) = inference.error_message {
        response["errorMessage"] = serde_json::json!(error_message);
    }
    if let Some(prediction) = inference.prediction {
        response["prediction"] = prediction;
    }

    Ok(Json(response))
}

/// List predictions with pagination
pub async fn list_predictions(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<serde_json::Value>, Error> {
    let prediction_list = state
        .inference_service
        .list_predictions(pagination.limit, pagination.offset)
        .await?;

    let items: Vec<serde_json::Value> = prediction_list
        .predictions
        .into_iter()
        .map(|p| {
            serde_json::json!({
                "predictId": p.id,
                "modelId": p.model_id,
                "status": p.status,
                "createdAt": iso_z(p.created_at),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "predictions": items,
        "meta": {
            "total": prediction_list.total,
            "limit": pagination.limit,
            "offset": pagination.offset,
        }
    })))
}
