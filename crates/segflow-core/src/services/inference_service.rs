//! Prediction submission and status operations

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::training_service::{parse_uuid, validate_pagination};
use crate::models::{
    Inference, Job, JobKind, NewInference, NewJob, PredictRequest, TrainingStatus,
};
use crate::repository::{
    Database, InferenceRepository, JobRepository, ModelRepository, TrainingRepository,
};
use crate::slurm::SchedulerClient;
use crate::template::{PredictionTemplateVariables, TemplateRenderer};
use crate::{Error, Result};

/// Outcome of a prediction submission
#[derive(Debug, Clone)]
pub struct PredictionSubmission {
    pub inference: Inference,
    pub job: Job,
}

/// One page of predictions plus the overall row count
#[derive(Debug, Clone)]
pub struct PredictionList {
    pub predictions: Vec<Inference>,
    pub total: i64,
}

#[derive(Clone)]
pub struct InferenceService {
    db: Database,
    inferences: InferenceRepository,
    models: ModelRepository,
    trainings: TrainingRepository,
    scheduler: Arc<dyn SchedulerClient>,
    renderer: TemplateRenderer,
}

impl InferenceService {
    pub fn new(
        db: Database,
        scheduler: Arc<dyn SchedulerClient>,
        renderer: TemplateRenderer,
    ) -> Self {
        Self {
            inferences: InferenceRepository::new(db.clone()),
            models: ModelRepository::new(db.clone()),
            trainings: TrainingRepository::new(db.clone()),
            db,
            scheduler,
            renderer,
        }
    }

    /// Submit a prediction job for an existing model.
    pub async fn submit_prediction(&self, request: PredictRequest) -> Result<PredictionSubmission> {
        request
            .validate()
            .map_err(|e| Error::validation(e.to_string()))?;

        let model = self
            .models
            .get(request.model_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Model not found: {}", request.model_id)))?;

        let training = self
            .trainings
            .get(model.training_id)
            .await?
            .ok_or_else(|| {
                Error::not_found(format!("Training not found for model: {}", model.id))
            })?;

        if training.status != TrainingStatus::Trained {
            return Err(Error::conflict(format!(
                "Model {} is not ready for predictions (training status: {})",
                model.id, training.status
            )));
        }

        // The inference id is minted up front so the output directory can
        // embed it.
        let inference_id = Uuid::new_v4();
        let now = Utc::now();
        let output_dir = format!(
            "{}/inference/{}-{}",
            training.model_path,
            inference_id,
            now.format("%Y%m%d_%H%M%S")
        );

        let variables = PredictionTemplateVariables::new(
            model.model_name.clone(),
            training.model_path.clone(),
            output_dir.clone(),
            request.fold_index,
            now.timestamp(),
        )?;

        let script = self
            .renderer
            .render(&variables)
            .map_err(|e| Error::submission(e.to_string()))?;

        std::fs::create_dir_all(&output_dir)
            .map_err(|e| Error::submission(format!("Failed to create directory {}: {}", output_dir, e)))?;

        let external_id = self.scheduler.submit(&script).await?;

        let mut tx = self.db.pool().begin().await?;

        let job = JobRepository::create_tx(
            &mut *tx,
            &NewJob {
                external_id: external_id.clone(),
                kind: JobKind::Inference,
                script_content: script,
                fold_index: Some(request.fold_index),
            },
        )
        .await?;

        let inference = InferenceRepository::create_tx(
            &mut *tx,
            &NewInference {
                id: inference_id,
                model_id: model.id,
                input_data: request.input_data,
                output_dir,
                job_id: job.id,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            "Prediction job submitted - inference id: {}, external id: {}",
            inference.id, external_id
        );

        Ok(PredictionSubmission { inference, job })
    }

    pub async fn get_prediction_status(&self, predict_id: &str) -> Result<Inference> {
        let predict_uuid = parse_uuid(predict_id, "prediction ID")?;

        self.inferences
            .get(predict_uuid)
            .await?
            .ok_or_else(|| Error::not_found(format!("Prediction not found: {}", predict_id)))
    }

    pub async fn list_predictions(&self, limit: i64, offset: i64) -> Result<PredictionList> {
        validate_pagination(limit, offset)?;

        let predictions = self.inferences.list(limit, offset).await?;
        let total = self.inferences.count().await?;

        Ok(PredictionList { predictions, total })
    }
}
