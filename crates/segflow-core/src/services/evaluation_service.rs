//! Evaluation submission and status operations

use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::training_service::{parse_uuid, validate_pagination};
use crate::models::{EvaluateRequest, Evaluation, Job, JobKind, NewEvaluation, NewJob};
use crate::repository::{
    Database, EvaluationRepository, JobRepository, ModelRepository, TrainingRepository,
};
use crate::slurm::SchedulerClient;
use crate::template::{EvaluationTemplateVariables, TemplateRenderer};
use crate::{Error, Result};

/// Outcome of an evaluation submission
#[derive(Debug, Clone)]
pub struct EvaluationSubmission {
    pub evaluation: Evaluation,
    pub job: Job,
}

/// One page of evaluations plus the overall row count
#[derive(Debug, Clone)]
pub struct EvaluationList {
    pub evaluations: Vec<Evaluation>,
    pub total: i64,
}

#[derive(Clone)]
pub struct EvaluationService {
    db: Database,
    evaluations: EvaluationRepository,
    models: ModelRepository,
    trainings: TrainingRepository,
    scheduler: Arc<dyn SchedulerClient>,
    renderer: TemplateRenderer,
    models_base_path: PathBuf,
}

impl EvaluationService {
    pub fn new(
        db: Database,
        scheduler: Arc<dyn SchedulerClient>,
        renderer: TemplateRenderer,
        models_base_path: PathBuf,
    ) -> Self {
        Self {
            evaluations: EvaluationRepository::new(db.clone()),
            models: ModelRepository::new(db.clone()),
            trainings: TrainingRepository::new(db.clone()),
            db,
            scheduler,
            renderer,
            models_base_path,
        }
    }

    /// Submit an evaluation job for a model, resolved by name.
    pub async fn submit_evaluation(&self, request: EvaluateRequest) -> Result<EvaluationSubmission> {
        request
            .validate()
            .map_err(|e| Error::validation(e.to_string()))?;

        info!(
            "Starting evaluation - model: {}, configurations: {:?}",
            request.model_name, request.configurations
        );

        let model = self
            .models
            .get_by_name(&request.model_name)
            .await?
            .ok_or_else(|| Error::not_found(format!("Model not found: {}", request.model_name)))?;

        let training = self
            .trainings
            .get(model.training_id)
            .await?
            .ok_or_else(|| {
                Error::not_found(format!("Training not found for model: {}", model.id))
            })?;

        let now = Utc::now();
        let output_path = self
            .models_base_path
            .join(&request.model_name)
            .join("evaluation")
            .join(now.timestamp().to_string());
        let output_path_str = output_path.to_string_lossy().into_owned();

        let variables = EvaluationTemplateVariables::new(
            model.model_name.clone(),
            training.model_path.clone(),
            request.evaluation_path.clone(),
            request.configurations.clone(),
            output_path_str.clone(),
        )?;

        let script = self
            .renderer
            .render(&variables)
            .map_err(|e| Error::submission(e.to_string()))?;

        std::fs::create_dir_all(&output_path)
            .map_err(|e| Error::submission(format!("Failed to create directory {}: {}", output_path_str, e)))?;

        let external_id = self.scheduler.submit(&script).await?;

        let mut tx = self.db.pool().begin().await?;

        let job = JobRepository::create_tx(
            &mut *tx,
            &NewJob {
                external_id: external_id.clone(),
                kind: JobKind::Evaluation,
                script_content: script,
                fold_index: None,
            },
        )
        .await?;

        let evaluation = EvaluationRepository::create_tx(
            &mut *tx,
            &NewEvaluation {
                model_id: model.id,
                job_id: job.id,
                evaluation_path: request.evaluation_path,
                configurations: request.configurations,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            "Evaluation job submitted - evaluation id: {}, external id: {}",
            evaluation.id, external_id
        );

        Ok(EvaluationSubmission { evaluation, job })
    }

    pub async fn get_evaluation_status(&self, evaluation_id: &str) -> Result<Evaluation> {
        let evaluation_uuid = parse_uuid(evaluation_id, "evaluation ID")?;

        self.evaluations
            .get(evaluation_uuid)
            .await?
            .ok_or_else(|| Error::not_found(format!("Evaluation not found: {}", evaluation_id)))
    }

    pub async fn list_evaluations(&self, limit: i64, offset: i64) -> Result<EvaluationList> {
        validate_pagination(limit, offset)?;

        let evaluations = self.evaluations.list(limit, offset).await?;
        let total = self.evaluations.count().await?;

        Ok(EvaluationList { evaluations, total })
    }
}
