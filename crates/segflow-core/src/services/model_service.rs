//! Read-only model catalog operations

use crate::models::Model;
use crate::repository::{Database, ModelRepository};
use crate::{Error, Result};

use super::training_service::{parse_uuid, validate_pagination};

/// One page of models plus the overall row count
#[derive(Debug, Clone)]
pub struct ModelList {
    pub models: Vec<Model>,
    pub total: i64,
}

#[derive(Clone)]
pub struct ModelService {
    models: ModelRepository,
}

impl ModelService {
    pub fn new(db: Database) -> Self {
        Self {
            models: ModelRepository::new(db),
        }
    }

    pub async fn get_model(&self, model_id: &str) -> Result<Model> {
        let model_uuid = parse_uuid(model_id, "model ID")?;

        self.models
            .get(model_uuid)
            .await?
            .ok_or_else(|| Error::not_found(format!("Model not found: {}", model_id)))
    }

    pub async fn list_models(&self, limit: i64, offset: i64) -> Result<ModelList> {
        validate_pagination(limit, offset)?;

        let models = self.models.list(limit, offset).await?;
        let total = self.models.count().await?;

        Ok(ModelList { models, total })
    }
}
