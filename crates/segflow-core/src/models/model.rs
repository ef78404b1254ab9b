use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Trained model entity, derived exactly once per successful training
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Model {
    pub id: Uuid,
    pub training_id: Uuid,
    pub model_name: String,
    pub model_path: Option<String>,
    pub created_at: NaiveDateTime,
}

/// New model row inserted inside the training-completion transaction
#[derive(Debug, Clone)]
pub struct NewModel {
    pub training_id: Uuid,
    pub model_name: String,
    pub model_path: Option<String>,
    pub created_at: NaiveDateTime,
}
