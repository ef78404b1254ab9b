//! Evaluation job monitor
//!
//! Symmetric to the prediction monitor; results are written by the evaluation
//! job itself and may stay null after completion.

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::base::MonitorKind;
use crate::models::{EvaluationStatus, EvaluationUpdate, Job, JobKind, JobStatus, JobUpdate};
use crate::repository::{Database, EvaluationRepository, JobRepository};
use crate::slurm::JobInfo;
use crate::Result;

pub struct EvaluationMonitor {
    db: Database,
    jobs: JobRepository,
    evaluations: EvaluationRepository,
}

impl EvaluationMonitor {
    pub fn new(db: Database) -> Self {
        Self {
            jobs: JobRepository::new(db.clone()),
            evaluations: EvaluationRepository::new(db.clone()),
            db,
        }
    }

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

        let evaluation = match EvaluationRepository::get_by_job_id_tx(&mut *tx, job.id).await? {
            Some(e) => e,
            None => {
                error!("No evaluation record found for job {}", job.id);
                return Ok(false);
            }
        };

        let mut evaluation_update = EvaluationUpdate::status(match new {
            JobStatus::Completed => EvaluationStatus::Completed,
            _ => EvaluationStatus::Failed,
        });
        evaluation_update.end_time = info.end_time;
        if new == JobStatus::Failed {
            evaluation_update.error_message = info.error_message.clone();
        }

        if EvaluationRepository::update_tx(&mut *tx, evaluation.id, &evaluation_update)
            .await?
            .is_none()
        {
            error!("Failed to update evaluation {} to {}", evaluation.id, new);
            return Ok(false);
        }

        tx.commit().await?;

        if new == JobStatus::Failed {
            if let Some(msg) = &info.error_message {
                warn!("Evaluation job {} failed: {}", job.id, msg);
            }
        }

        info!(
            "Evaluation {} transaction successful: job {} -> {}, evaluation {} -> {}",
            if new == JobStatus::Completed { "completion" } else { "failure" },
            job.id,
            new,
            evaluation.id,
            new
        );
        Ok(true)
    }

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
            error!("Failed to update evaluation job {} in database", job.id);
            return Ok(false);
        }

        if new == JobStatus::Running {
            if let Some(evaluation) = self.evaluations.get_by_job_id(job.id).await? {
                if evaluation.status == EvaluationStatus::Pending {
                    self.evaluations
                        .update(
                            evaluation.id,
                            &EvaluationUpdate::status(EvaluationStatus::Evaluating),
                        )
                        .await?;
                    debug!("Evaluation {} moved to EVALUATING", evaluation.id);
                }
            }
        }

        Ok(true)
    }
}

#[async_trait]
impl MonitorKind for EvaluationMonitor {
    fn kind(&self) -> JobKind {
        JobKind::Evaluation
    }

    async fn candidates(&self) -> Result<Vec<Job>> {
        self.jobs.active_jobs_by_kind(JobKind::Evaluation).await
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
                    "Evaluation job {} reached {}, handling with transaction",
                    job.id, new
                );
                match self.handle_terminal(job, info, new).await {
                    Ok(applied) => Ok(applied),
                    Err(e) if e.is_connection_error() => Err(e),
                    Err(e) => {
                        error!(
                            "Error in evaluation terminal transaction for job {}: {}",
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
