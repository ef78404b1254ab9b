use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use super::{iso_z, PaginationQuery};
use crate::state::AppState;
use segflow_core::Error;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/model/list", get(list_models))
        .route("/model/:id", get(get_model))
}

/// Get model by ID
pub async fn get_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, Error> {
    let model = state.model_service.get_model(&id).await?;

    let mut response = serde_json::json!({
        "modelId": model.id,
        "modelName": model.model_name,
        "trainingId": model.training_id,
        "createdAt": iso_z(model.created_at),
    });

    if let Some(model_path) = model.model_path {
        response["modelPath"] = serde_json::json!(model_path);
    }

    Ok(Json(response))
}

/// List models with pagination
pub async fn list_models(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<serde_json::Value>, Error> {
    let model_list = state
        .model_service
        .list_models(pagination.limit, pagination.offset)
        .await?;

    let items: Vec<serde_json::Value> = model_list
        .models
        .into_iter()
        .map(|m| {
            serde_json::json!({
                "modelId": m.id,
                "modelName": m.model_name,
                "trainingId": m.training_id,
                "createdAt": iso_z(m.created_at),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "models": items,
        "meta": {
            "total": model_list.total,
            "limit": pagination.limit,
            "offset": pagination.offset,
        }
    })))
}
