use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::TrainingStatus;

/// Training entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Training {
    pub id: Uuid,
    pub name: String,
    pub images_path: Option<String>,
    pub labels_path: Option<String>,
    /// Output root the training job writes the model under
    pub model_path: String,
    pub status: TrainingStatus,
    pub progress: f64,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub error_message: Option<String>,
    pub job_id: Uuid,
    pub created_at: NaiveDateTime,
}

/// New training row created at submission time
#[derive(Debug, Clone)]
pub struct NewTraining {
    pub name: String,
    pub images_path: Option<String>,
    pub labels_path: Option<String>,
    pub model_path: String,
    pub job_id: Uuid,
}

/// Mutable training columns; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct TrainingUpdate {
    pub status: Option<TrainingStatus>,
    pub progress: Option<f64>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub error_message: Option<String>,
}

impl TrainingUpdate {
    pub fn status(status: TrainingStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Train request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrainRequest {
    #[validate(length(min = 1, max = 255))]
    pub model_name: String,

    pub images_path: Option<String>,

    pub labels_path: Option<String>,

    #[validate(range(min = 0, max = 4))]
    pub fold_index: i32,

    #[validate(range(min = 1))]
    pub task_number: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_request_validation() {
        let request = TrainRequest {
            model_name: "seg-A".to_string(),
            images_path: Some("/data/images".to_string()),
            labels_path: Some("/data/labels".to_string()),
            fold_index: 1,
            task_number: 130,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_train_request_rejects_empty_name() {
        let request = TrainRequest {
            model_name: String::new(),
            images_path: None,
            labels_path: None,
            fold_index: 0,
            task_number: 130,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_train_request_rejects_bad_fold() {
        let request = TrainRequest {
            model_name: "seg-A".to_string(),
            images_path: None,
            labels_path: None,
            fold_index: 9,
            task_number: 130,
        };
        assert!(request.validate().is_err());
    }
}
