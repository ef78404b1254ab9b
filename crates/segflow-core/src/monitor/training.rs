//! Training job monitor: terminal transitions derive the Model record

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

use super::base::MonitorKind;
use crate::models::{
    Job, JobKind, JobStatus, JobUpdate, NewModel, TrainingStatus, TrainingUpdate,
};
use crate::repository::{
    Database, JobRepository, ModelRepository, TrainingRepository,
};
use crate::slurm::JobInfo;
use crate::Result;

pub struct TrainingMonitor {
    db: Database,
    jobs: JobRepository,
}

impl TrainingMonitor {
    pub fn new(db: Database) -> Self {
        Self {
            jobs: JobRepository::new(db.clone()),
            db,
        }
    }

    /// Complete a training in one transaction: Job -> COMPLETED,
    /// Training -> TRAINED, and the derived Model row. Any failure aborts the
    /// whole group; the tick retries next interval.
    async fn handle_training_completion(&self, job: &Job, info: &JobInfo) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        let mut job_update = JobUpdate::status(JobStatus::Completed);
        if job.start_time.is_none() {
            job_update.start_time = info.start_time;
        }
        if job.end_time.is_none() {
            job_update.end_time = info.end_time;
        }

        if JobRepository::update_tx(&mut *tx, job.id, &job_update)
            .await?
            .is_none()
        {
            error!("Failed to update job {} to COMPLETED", job.id);
            return Ok(false);
        }

        let training = match TrainingRepository::get_by_job_id_tx(&mut *tx, job.id).await? {
            Some(t) => t,
            None => {
                error!("No training record found for completed job {}", job.id);
                return Ok(false);
            }
        };

        let mut training_update = TrainingUpdate::status(TrainingStatus::Trained);
        training_update.end_time = info.end_time;
        training_update.progress = Some(100.0);

        if TrainingRepository::update_tx(&mut *tx, training.id, &training_update)
            .await?
            .is_none()
        {
            error!("Failed to update training {} to TRAINED", training.id);
            return Ok(false);
        }

        // Idempotency guard: a retried completion must not mint a second model.
        if let Some(existing) = ModelRepository::get_by_training_id_tx(&mut *tx, training.id).await? {
            warn!(
                "Model {} already exists for training {}, skipping insert",
                existing.id, training.id
            );
            tx.commit().await?;
            return Ok(true);
        }

        let model = ModelRepository::create_tx(
            &mut *tx,
            &NewModel {
                training_id: training.id,
                model_name: format!("{}_model", training.name),
                model_path: Some(training.model_path.clone()),
                created_at: info.end_time.unwrap_or_else(|| Utc::now().naive_utc()),
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            "Training completion transaction successful: job {} -> COMPLETED, training {} -> TRAINED, model {} created",
            job.id, training.id, model.id
        );
        Ok(true)
    }

    /// Fail a training in one transaction: Job and Training both FAILED with
    /// the composed error message.
    async fn handle_training_failure(&self, job: &Job, info: &JobInfo) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        let mut job_update = JobUpdate::status(JobStatus::Failed);
        if job.start_time.is_none() {
            job_update.start_time = info.start_time;
        }
        if job.end_time.is_none() {
            job_update.end_time = info.end_time;
        }
        job_update.error_message = info.error_message.clone();

        if JobRepository::update_tx(&mut *tx, job.id, &job_update)
            .await?
            .is_none()
        {
            error!("Failed to update job {} to FAILED", job.id);
            return Ok(false);
        }

        let training = match TrainingRepository::get_by_job_id_tx(&mut *tx, job.id).await? {
            Some(t) => t,
            None => {
                error!("No training record found for failed job {}", job.id);
                return Ok(false);
            }
        };

        let mut training_update = TrainingUpdate::status(TrainingStatus::Failed);
        training_update.end_time = info.end_time;
        training_update.error_message = info.error_message.clone();

        if TrainingRepository::update_tx(&mut *tx, training.id, &training_update)
            .await?
            .is_none()
        {
            error!("Failed to update training {} to FAILED", training.id);
            return Ok(false);
        }

        tx.commit().await?;

        if let Some(msg) = &info.error_message {
            warn!("Training job {} failed: {}", job.id, msg);
        }

        info!(
            "Training failure transaction successful: job {} -> FAILED, training {} -> FAILED",
            job.id, training.id
        );
        Ok(true)
    }

    /// Non-terminal update: only the Job row changes.
    async fn handle_normal_update(&self, job: &Job, info: &JobInfo, new: JobStatus) -> Result<bool> {
        let mut update = JobUpdate::status(new);
        if job.start_time.is_none() {
            update.start_time = info.start_time;
        }
        if job.end_time.is_none() {
            update.end_time = info.end_time;
        }

        let updated = self.jobs.update(job.id, &update).await?;
        Ok(updated.is_some())
    }
}

#[async_trait]
impl MonitorKind for TrainingMonitor {
    fn kind(&self) -> JobKind {
        JobKind::Training
    }

    async fn candidates(&self) -> Result<Vec<Job>> {
        self.jobs.active_jobs_by_kind(JobKind::Training).await
    }

    async fn apply(
        &self,
        job: &Job,
        info: &JobInfo,
        _current: JobStatus,
        new: JobStatus,
    ) -> Result<bool> {
        match new {
            JobStatus::Completed => {
                info!("Training job {} completed, handling with transaction", job.id);
                match self.handle_training_completion(job, info).await {
                    Ok(applied) => Ok(applied),
                    Err(e) if e.is_connection_error() => Err(e),
                    Err(e) => {
                        error!(
                            "Error in training completion transaction for job {}: {}",
                            job.id, e
                        );
                        Ok(false)
                    }
                }
            }
            JobStatus::Failed => {
                info!("Training job {} failed, handling with transaction", job.id);
                match self.handle_training_failure(job, info).await {
                    Ok(applied) => Ok(applied),
                    Err(e) if e.is_connection_error() => Err(e),
                    Err(e) => {
                        error!(
                            "Error in training failure transaction for job {}: {}",
                            job.id, e
                        );
                        Ok(false)
                    }
                }
            }
            _ => self.handle_normal_update(job, info, new).await,
        }
    }
}
