//! Prediction job monitor: mirrors job state onto the inference record

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::base::MonitorKind;
use crate::models::{InferenceStatus, InferenceUpdate, Job, JobKind, JobStatus, JobUpdate};
use crate::repository::{Database, InferenceRepository, JobRepository};
use crate::slurm::JobInfo;
use crate::Result;

pub struct InferenceMonitor {
    db: Database,
    jobs: JobRepository,
    inferences: InferenceRepository,
}

impl InferenceMonitor {
    pub fn new(db: Database) -> Self {
        Self {
            jobs: JobRepository::new(db.clone()),
            inferences: InferenceRepository::new(db.clone()),
            db,
        }
    }

    /// Terminal transition: Job and Inference move together in one
    /// transaction.
    async fn handle_terminal(&self, job: &Job, info: &JobInfo, new: JobStatus) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        let mut job_update = JobUpdate::status(new);
        if job.start_time.is_none() {
            job_update.start_time = info.start_time;
        }
        if job.end_time.is_none() {
            job_update.end_time = info.end_time;
        }
        if new == JobStatus::Failed {
            job_update.error_message = info.error_message.clone();
        }

        if JobRepository::update_tx(&mut *tx, job.id, &job_update)
            .await?
            .is_none()
        {
            error!("Failed to update job {} to {}", job.id, new);
            return Ok(false);
        }

        let inference = match InferenceRepository::get_by_job_id_tx(&mut *tx, job.id).await? {
            Some(i) => i,
            None => {
                error!("No inference record found for job {}", job.id);
                return Ok(false);
            }
        };

        let mut inference_update = InferenceUpdate::status(match new {
            JobStatus::Completed => InferenceStatus::Completed,
            _ => InferenceStatus::Failed,
        });
        inference_update.end_time = info.end_time;
        if new == JobStatus::Failed {
            inference_update.error_message = info.error_message.clone();
        }

        if InferenceRepository::update_tx(&mut *tx, inference.id, &inference_update)
            .await?
            .is_none()
        {
            error!("Failed to update inference {} to {}", inference.id, new);
            return Ok(false);
        }

        tx.commit().await?;

        if new == JobStatus::Failed {
            if let Some(msg) = &info.error_message {
                warn!("Prediction job {} failed: {}", job.id, msg);
            }
        }

        info!(
            "Prediction {} transaction successful: job {} -> {}, inference {} -> {}",
            if new == JobStatus::Completed { "completion" } else { "failure" },
            job.id,
            new,
            inference.id,
            new
        );
        Ok(true)
    }

    /// Non-terminal update: the Job row changes; a freshly started job also
    /// bumps the inference from PENDING to PROCESSING (outside the
    /// transaction, it is not a terminal commit).
    async fn handle_normal_update(&self, job: &Job, info: &JobInfo, new: JobStatus) -> Result<bool> {
        let mut update = JobUpdate::status(new);
        if job.start_time.is_none() {
            update.start_time = info.start_time;
        }
        if job.end_time.is_none() {
            update.end_time = info.end_time;
        }

        let updated = self.jobs.update(job.id, &update).await?;
        if updated.is_none() {
            error!("Failed to update prediction job {} in database", job.id);
            return Ok(false);
        }

        if new == JobStatus::Running {
            if let Some(inference) = self.inferences.get_by_job_id(job.id).await? {
                if inference.status == InferenceStatus::Pending {
                    self.inferences
                        .update(inference.id, &InferenceUpdate::status(InferenceStatus::Processing))
                        .await?;
                    debug!("Inference {} moved to PROCESSING", inference.id);
                }
            }
        }

        Ok(true)
    }
}

#[async_trait]
impl MonitorKind for InferenceMonitor {
    fn kind(&self) -> JobKind {
        JobKind::Inference
    }

    async fn candidates(&self) -> Result<Vec<Job>> {
        self.jobs.active_jobs_by_kind(JobKind::Inference).await
    }

    async fn apply(
        &self,
        job: &Job,
        info: &JobInfo,
        _current: JobStatus,
        new: JobStatus,
    ) -> Result<bool> {
        match new {
            JobStatus::Completed | JobStatus::Failed => {
                info!(
                    "Prediction job {} reached {}, handling with transaction",
                    job.id, new
                );
                match self.handle_terminal(job, info, new).await {
                    Ok(applied) => Ok(applied),
                    Err(e) if e.is_connection_error() => Err(e),
                    Err(e) => {
                        error!(
                            "Error in prediction terminal transaction for job {}: {}",
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
