use sqlx::PgConnection;
use uuid::Uuid;

use super::Database;
use crate::models::{Inference, InferenceStatus, InferenceUpdate, NewInference};
use crate::Result;

#[derive(Clone)]
pub struct InferenceRepository {
    db: Database,
}

impl InferenceRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Inference>> {
        let inference = sqlx::query_as::<_, Inference>("SELECT * FROM inference WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(inference)
    }

    pub async fn get_by_job_id(&self, job_id: Uuid) -> Result<Option<Inference>> {
        let inference = sqlx::query_as::<_, Inference>("SELECT * FROM inference WHERE job_id = $1")
            .bind(job_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(inference)
    }

    pub async fn get_by_job_id_tx(
        conn: &mut PgConnection,
        job_id: Uuid,
    ) -> Result<Option<Inference>> {
        let inference = sqlx::query_as::<_, Inference>("SELECT * FROM inference WHERE job_id = $1")
            .bind(job_id)
            .fetch_optional(conn)
            .await?;

        Ok(inference)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Inference>> {
        let rows = sqlx::query_as::<_, Inference>(
            "SELECT * FROM inference ORDER BY created_at DESC OFFSET $1 LIMIT $2",
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM inference")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0)
    }

    pub async fn create_tx(
        conn: &mut PgConnection,
        new_inference: &NewInference,
    ) -> Result<Inference> {
        let inference = sqlx::query_as::<_, Inference>(
            r#"
            INSERT INTO inference (id, model_id, input_data, output_dir, status, job_id, start_time)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING *
            "#,
        )
        .bind(new_inference.id)
        .bind(new_inference.model_id)
        .bind(&new_inference.input_data)
        .bind(&new_inference.output_dir)
        .bind(InferenceStatus::Pending)
        .bind(new_inference.job_id)
        .fetch_one(conn)
        .await?;

        Ok(inference)
    }

    pub async fn update(&self, id: Uuid, update: &InferenceUpdate) -> Result<Option<Inference>> {
        let mut conn = self.db.pool().acquire().await?;
        Self::update_tx(&mut *conn, id, update).await
    }

    pub async fn update_tx(
        conn: &mut PgConnection,
        id: Uuid,
        update: &InferenceUpdate,
    ) -> Result<Option<Inference>> {
        let mut sets = Vec::new();
        let mut param_count = 0;

        if update.status.is_some() {
            param_count += 1;
            sets.push(format!("status = ${}", param_count));
        }
        if update.prediction.is_some() {
            param_count += 1;
            sets.push(format!("prediction = ${}", param_count));
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
            "UPDATE inference SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            param_count + 1
        );

        let mut query_builder = sqlx::query_as::<_, Inference>(&query);

        if let Some(status) = update.status {
            query_builder = query_builder.bind(status);
        }
        if let Some(ref prediction) = update.prediction {
            query_builder = query_builder.bind(prediction);
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

        let inference = query_builder.fetch_optional(conn).await?;

        Ok(inference)
    }
}
