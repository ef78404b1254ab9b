use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::InferenceStatus;

/// Inference entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Inference {
    pub id: Uuid,
    pub model_id: Uuid,
    pub input_data: serde_json::Value,
    pub output_dir: String,
    pub prediction: Option<serde_json::Value>,
    pub status: InferenceStatus,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub error_message: Option<String>,
    pub job_id: Uuid,
    pub created_at: NaiveDateTime,
}

/// New inference row created at submission time
///
/// The id is generated before submission because the job's output directory
/// embeds it.
#[derive(Debug, Clone)]
pub struct NewInference {
    pub id: Uuid,
    pub model_id: Uuid,
    pub input_data: serde_json::Value,
    pub output_dir: String,
    pub job_id: Uuid,
}

/// Mutable inference columns; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct InferenceUpdate {
    pub status: Option<InferenceStatus>,
    pub prediction: Option<serde_json::Value>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub error_message: Option<String>,
}

impl InferenceUpdate {
    pub fn status(status: InferenceStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Predict request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    pub model_id: Uuid,

    /// Input image path or a structured payload the job script understands
    pub input_data: serde_json::Value,

    #[validate(range(min = 0, max = 4))]
    #[serde(default)]
    pub fold_index: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_request_validation() {
        let request = PredictRequest {
            model_id: Uuid::new_v4(),
            input_data: serde_json::json!({"image": "/data/scan.nii.gz"}),
            fold_index: 0,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_predict_request_fold_defaults_to_zero() {
        let json = serde_json::json!({
            "modelId": Uuid::new_v4(),
            "inputData": "/data/scan.nii.gz",
        });
        let request: PredictRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.fold_index, 0);
    }
}
