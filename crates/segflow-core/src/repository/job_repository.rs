use sqlx::PgConnection;
use uuid::Uuid;

use super::Database;
use crate::models::{Job, JobKind, JobStatus, JobUpdate, NewJob};
use crate::Result;

#[derive(Clone)]
pub struct JobRepository {
    db: Database,
}

impl JobRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(job)
    }

    pub async fn get_by_external_id(&self, external_id: &str) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(job)
    }

    /// Jobs still owned by the reconciliation engine (PENDING or RUNNING).
    pub async fn active_jobs(&self) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE status IN ('PENDING', 'RUNNING') ORDER BY created_at",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(jobs)
    }

    pub async fn active_jobs_by_kind(&self, kind: JobKind) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE status IN ('PENDING', 'RUNNING') AND kind = $1 ORDER BY created_at",
        )
        .bind(kind)
        .fetch_all(self.db.pool())
        .await?;

        Ok(jobs)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs ORDER BY start_time DESC NULLS LAST OFFSET $1 LIMIT $2",
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(jobs)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0)
    }

    pub async fn create_tx(conn: &mut PgConnection, new_job: &NewJob) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (id, external_id, kind, status, script_content, fold_index)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_job.external_id)
        .bind(new_job.kind)
        .bind(JobStatus::Pending)
        .bind(&new_job.script_content)
        .bind(new_job.fold_index)
        .fetch_one(conn)
        .await?;

        Ok(job)
    }

    pub async fn update(&self, id: Uuid, update: &JobUpdate) -> Result<Option<Job>> {
        let mut conn = self.db.pool().acquire().await?;
        Self::update_tx(&mut *conn, id, update).await
    }

    pub async fn update_tx(
        conn: &mut PgConnection,
        id: Uuid,
        update: &JobUpdate,
    ) -> Result<Option<Job>> {
        if update.is_empty() {
            return Err(crate::Error::validation("No fields to update"));
        }

        let mut sets = Vec::new();
        let mut param_count = 0;

        if update.status.is_some() {
            param_count += 1;
            sets.push(format!("status = ${}", param_count));
        }
        if update.start_time.is_some() {
            param_count += 1;
            sets.push(format!("start_time = ${}", param_count));
        }
        if update.end_time.is_some() {
            param_count += 1;
            sets.push(format!("end_time = ${}", param_count));
        }
        if update.error_message.is_some() {
            param_count += 1;
            sets.push(format!("error_message = ${}", param_count));
        }

        let query = format!(
            "UPDATE jobs SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            param_count + 1
        );

        let mut query_builder = sqlx::query_as::<_, Job>(&query);

        if let Some(status) = update.status {
            query_builder = query_builder.bind(status);
        }
        if let Some(start_time) = update.start_time {
            query_builder = query_builder.bind(start_time);
        }
        if let Some(end_time) = update.end_time {
            query_builder = query_builder.bind(end_time);
        }
        if let Some(ref error_message) = update.error_message {
            query_builder = query_builder.bind(error_message);
        }
        query_builder = query_builder.bind(id);

        let job = query_builder.fetch_optional(conn).await?;

        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_update_is_rejected_before_sql() {
        // The builder refuses to emit `UPDATE jobs SET  WHERE ...`
        let update = JobUpdate::default();
        assert!(update.is_empty());
    }
}
