use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{EvalConfiguration, EvaluationStatus};

/// Evaluation entity
///
/// `configurations` is kept as a text array; `results` is written by the
/// evaluation job itself and may stay null even after completion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Evaluation {
    pub id: Uuid,
    pub model_id: Uuid,
    pub job_id: Uuid,
    pub evaluation_path: String,
    pub configurations: Vec<String>,
    pub status: EvaluationStatus,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub error_message: Option<String>,
    pub results: Option<serde_json::Value>,
    pub created_at: NaiveDateTime,
}

impl Evaluation {
    /// Typed view over the stored configuration strings.
    pub fn parsed_configurations(&self) -> Vec<EvalConfiguration> {
        self.configurations
            .iter()
            .filter_map(|c| c.parse().ok())
            .collect()
    }
}

/// New evaluation row created at submission time
#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub model_id: Uuid,
    pub job_id: Uuid,
    pub evaluation_path: String,
    pub configurations: Vec<EvalConfiguration>,
}

/// Mutable evaluation columns; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct EvaluationUpdate {
    pub status: Option<EvaluationStatus>,
    pub results: Option<serde_json::Value>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub error_message: Option<String>,
}

impl EvaluationUpdate {
    pub fn status(status: EvaluationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Evaluate request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    #[validate(length(min = 1, max = 255))]
    pub model_name: String,

    #[validate(length(min = 1, max = 500))]
    pub evaluation_path: String,

    #[validate(length(min = 1))]
    pub configurations: Vec<EvalConfiguration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_request_validation() {
        let request = EvaluateRequest {
            model_name: "seg-A".to_string(),
            evaluation_path: "/data/eval".to_string(),
            configurations: vec![EvalConfiguration::TwoD, EvalConfiguration::ThreeDFullres],
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_evaluate_request_requires_configurations() {
        let request = EvaluateRequest {
            model_name: "seg-A".to_string(),
            evaluation_path: "/data/eval".to_string(),
            configurations: vec![],
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_configuration_deserialization() {
        let json = serde_json::json!({
            "modelName": "seg-A",
            "evaluationPath": "/data/eval",
            "configurations": ["2d", "3d_lowres"],
        });
        let request: EvaluateRequest = serde_json::from_value(json).unwrap();
        assert_eq!(
            request.configurations,
            vec![EvalConfiguration::TwoD, EvalConfiguration::ThreeDLowres]
        );
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let json = serde_json::json!({
            "modelName": "seg-A",
            "evaluationPath": "/data/eval",
            "configurations": ["5d"],
        });
        assert!(serde_json::from_value::<EvaluateRequest>(json).is_err());
    }
}
