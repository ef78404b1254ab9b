pub mod evaluation;
pub mod health;
pub mod jobs;
pub mod model;
pub mod predict;
pub mod training;

pub use evaluation::router as evaluation_router;
pub use health::router as health_router;
pub use jobs::router as jobs_router;
pub use model::router as model_router;
pub use predict::router as predict_router;
pub use training::router as training_router;

use crate::state::AppState;
use axum::{routing::get, Json, Router};
use chrono::NaiveDateTime;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router with all routes
pub fn create_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(api_info))
        .merge(health_router())
        .nest("/api/v1", api_v1_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(training_router())
        .merge(predict_router())
        .merge(evaluation_router())
        .merge(model_router())
        .merge(jobs_router())
}

/// API info endpoint
async fn api_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "segflow",
        "version": segflow_core::VERSION,
    }))
}

/// Pagination query parameters shared by the list endpoints
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    10
}

/// Render a stored timestamp as ISO-8601 with a trailing Z.
pub fn iso_z(ts: NaiveDateTime) -> String {
    format!("{}Z", ts.format("%Y-%m-%dT%H:%M:%S%.6f"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_iso_z_format() {
        let ts = NaiveDate::from_ymd_opt(2025, 9, 13)
            .unwrap()
            .and_hms_opt(12, 20, 0)
            .unwrap();
        assert_eq!(iso_z(ts), "2025-09-13T12:20:00.000000Z");
    }
}
