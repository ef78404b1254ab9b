//! Training submission and status operations

use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Job, JobKind, NewJob, NewTraining, TrainRequest, Training};
use crate::repository::{Database, JobRepository, TrainingRepository};
use crate::slurm::SchedulerClient;
use crate::template::{TemplateRenderer, TrainingTemplateVariables};
use crate::{Error, Result};

/// Outcome of a training submission
#[derive(Debug, Clone)]
pub struct TrainingSubmission {
    pub training: Training,
    pub job: Job,
}

/// One page of trainings plus the overall row count
#[derive(Debug, Clone)]
pub struct TrainingList {
    pub trainings: Vec<Training>,
    pub total: i64,
}

#[derive(Clone)]
pub struct TrainingService {
    db: Database,
    trainings: TrainingRepository,
    scheduler: Arc<dyn SchedulerClient>,
    renderer: TemplateRenderer,
    models_base_path: PathBuf,
}

impl TrainingService {
    pub fn new(
        db: Database,
        scheduler: Arc<dyn SchedulerClient>,
        renderer: TemplateRenderer,
        models_base_path: PathBuf,
    ) -> Self {
        Self {
            trainings: TrainingRepository::new(db.clone()),
            db,
            scheduler,
            renderer,
            models_base_path,
        }
    }

    /// Submit a training job: render the script, create the output directory,
    /// hand the script to the scheduler, then persist Job + Training in one
    /// transaction. Nothing is persisted when any step fails.
    pub async fn submit_training(&self, request: TrainRequest) -> Result<TrainingSubmission> {
        request
            .validate()
            .map_err(|e| Error::validation(e.to_string()))?;

        info!("Starting training - name: {}", request.model_name);

        let now = Utc::now();
        let model_path = self
            .models_base_path
            .join(&request.model_name)
            .join(now.timestamp().to_string());
        let model_path_str = model_path.to_string_lossy().into_owned();

        let variables = TrainingTemplateVariables::new(
            request.model_name.clone(),
            model_path_str.clone(),
            request.fold_index,
            request.task_number,
            now.timestamp(),
        )?;

        let script = self
            .renderer
            .render(&variables)
            .map_err(|e| Error::submission(e.to_string()))?;

        std::fs::create_dir_all(&model_path)
            .map_err(|e| Error::submission(format!("Failed to create directory {}: {}", model_path_str, e)))?;

        let external_id = self.scheduler.submit(&script).await?;

        let mut tx = self.db.pool().begin().await?;

        let job = JobRepository::create_tx(
            &mut *tx,
            &NewJob {
                external_id: external_id.clone(),
                kind: JobKind::Training,
                script_content: script,
                fold_index: Some(request.fold_index),
            },
        )
        .await?;

        let training = TrainingRepository::create_tx(
            &mut *tx,
            &NewTraining {
                name: request.model_name.clone(),
                images_path: request.images_path,
                labels_path: request.labels_path,
                model_path: model_path_str,
                job_id: job.id,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            "Training job submitted - training id: {}, external id: {}",
            training.id, external_id
        );

        Ok(TrainingSubmission { training, job })
    }

    pub async fn get_training_status(&self, training_id: &str) -> Result<Training> {
        let training_uuid = parse_uuid(training_id, "training ID")?;

        self.trainings
            .get(training_uuid)
            .await?
            .ok_or_else(|| Error::not_found(format!("Training not found: {}", training_id)))
    }

    pub async fn list_trainings(&self, limit: i64, offset: i64) -> Result<TrainingList> {
        validate_pagination(limit, offset)?;

        let trainings = self.trainings.list(limit, offset).await.map_err(|e| {
            error!("Failed to list trainings: {}", e);
            e
        })?;
        let total = self.trainings.count().await?;

        Ok(TrainingList { trainings, total })
    }
}

/// Parse an HTTP path id into a UUID with a field-specific message.
pub(crate) fn parse_uuid(value: &str, field: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|_| Error::validation(format!("Invalid {} format", field)))
}

pub(crate) fn validate_pagination(limit: i64, offset: i64) -> Result<()> {
    if limit < 0 {
        return Err(Error::validation("Limit must not be negative"));
    }
    if offset < 0 {
        return Err(Error::validation("Offset must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uuid_rejects_garbage() {
        let err = parse_uuid("not-a-uuid", "training ID").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("training ID"));
    }

    #[test]
    fn test_parse_uuid_accepts_canonical_form() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(&id.to_string(), "job ID").unwrap(), id);
    }

    #[test]
    fn test_pagination_bounds() {
        assert!(validate_pagination(10, 0).is_ok());
        assert!(validate_pagination(0, 0).is_ok());
        assert!(validate_pagination(-1, 0).is_err());
        assert!(validate_pagination(10, -5).is_err());
    }
}
