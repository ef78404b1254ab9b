use sqlx::PgConnection;
use uuid::Uuid;

use super::Database;
use crate::models::{Evaluation, EvaluationStatus, EvaluationUpdate, NewEvaluation};
use crate::Result;

#[derive(Clone)]
pub struct EvaluationRepository {
    db: Database,
}

impl EvaluationRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Evaluation>> {
        let evaluation = sqlx::query_as::<_, Evaluation>("SELECT * FROM evaluation WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(evaluation)
    }

    pub async fn get_by_job_id(&self, job_id: Uuid) -> Result<Option<Evaluation>> {
        let evaluation =
            sqlx::query_as::<_, Evaluation>("SELECT * FROM evaluation WHERE job_id = $1")
                .bind(job_id)
                .fetch_optional(self.db.pool())
                .await?;

        Ok(evaluation)
    }

    pub async fn get_by_job_id_tx(
        conn: &mut PgConnection,
        job_id: Uuid,
    ) -> Result<Option<Evaluation>> {
        let evaluation =
            sqlx::query_as::<_, Evaluation>("SELECT * FROM evaluation WHERE job_id = $1")
                .bind(job_id)
                .fetch_optional(conn)
                .await?;

        Ok(evaluation)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Evaluation>> {
        let rows = sqlx::query_as::<_, Evaluation>(
            "SELECT * FROM evaluation ORDER BY created_at DESC OFFSET $1 LIMIT $2",
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM evaluation")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0)
    }

    pub async fn create_tx(
        conn: &mut PgConnection,
        new_evaluation: &NewEvaluation,
    ) -> Result<Evaluation> {
        let configurations: Vec<String> = new_evaluation
            .configurations
            .iter()
            .map(|c| c.to_string())
            .collect();

        let evaluation = sqlx::query_as::<_, Evaluation>(
            r#"
            INSERT INTO evaluation (id, model_id, job_id, evaluation_path, configurations, status, start_time)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_evaluation.model_id)
        .bind(new_evaluation.job_id)
        .bind(&new_evaluation.evaluation_path)
        .bind(&configurations)
        .bind(EvaluationStatus::Pending)
        .fetch_one(conn)
        .await?;

        Ok(evaluation)
    }

    pub async fn update(&self, id: Uuid, update: &EvaluationUpdate) -> Result<Option<Evaluation>> {
        let mut conn = self.db.pool().acquire().await?;
        Self::update_tx(&mut *conn, id, update).await
    }

    pub async fn update_tx(
        conn: &mut PgConnection,
        id: Uuid,
        update: &EvaluationUpdate,
    ) -> Result<Option<Evaluation>> {
        let mut sets = Vec::new();
        let mut param_count = 0;

        if update.status.is_some() {
            param_count += 1;
            sets.push(format!("status = ${}", param_count));
        }
        if update.results.is_some() {
            param_count += 1;
            sets.push(format!("results = ${}", param_count));
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

        if sets.is_empty() {
            return Err(crate::Error::validation("No fields to update"));
        }

        let query = format!(
            "UPDATE evaluation SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            param_count + 1
        );

        let mut query_builder = sqlx::query_as::<_, Evaluation>(&query);

        if let Some(status) = update.status {
            query_builder = query_builder.bind(status);
        }
        if let Some(ref results) = update.results {
            query_builder = query_builder.bind(results);
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

        let evaluation = query_builder.fetch_optional(conn).await?;

        Ok(evaluation)
    }
}
