use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{JobKind, JobStatus};

/// Batch job entity
///
/// Created by a submission facade in state PENDING; mutated only by the
/// monitor of its kind afterwards. Terminal states are immutable.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    /// Scheduler-assigned identifier (numeric for SLURM, kept opaque here)
    pub external_id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub error_message: Option<String>,
    /// Rendered sbatch script submitted to the scheduler
    pub script_content: String,
    pub fold_index: Option<i32>,
    pub created_at: NaiveDateTime,
}

/// New job row written together with its domain sibling at submission time
#[derive(Debug, Clone)]
pub struct NewJob {
    pub external_id: String,
    pub kind: JobKind,
    pub script_content: String,
    pub fold_index: Option<i32>,
}

/// Mutable job columns; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub error_message: Option<String>,
}

impl JobUpdate {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.error_message.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_builder() {
        let update = JobUpdate::status(JobStatus::Running);
        assert_eq!(update.status, Some(JobStatus::Running));
        assert!(update.start_time.is_none());
        assert!(!update.is_empty());
    }

    #[test]
    fn test_empty_update() {
        assert!(JobUpdate::default().is_empty());
    }
}
