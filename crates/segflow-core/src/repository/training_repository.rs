use sqlx::PgConnection;
use uuid::Uuid;

use super::Database;
use crate::models::{NewTraining, Training, TrainingStatus, TrainingUpdate};
use crate::Result;

#[derive(Clone)]
pub struct TrainingRepository {
    db: Database,
}

impl TrainingRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Training>> {
        let training = sqlx::query_as::<_, Training>("SELECT * FROM training WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(training)
    }

    pub async fn get_by_job_id(&self, job_id: Uuid) -> Result<Option<Training>> {
        let training = sqlx::query_as::<_, Training>("SELECT * FROM training WHERE job_id = $1")
            .bind(job_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(training)
    }

    pub async fn get_by_job_id_tx(
        conn: &mut PgConnection,
        job_id: Uuid,
    ) -> Result<Option<Training>> {
        let training = sqlx::query_as::<_, Training>("SELECT * FROM training WHERE job_id = $1")
            .bind(job_id)
            .fetch_optional(conn)
            .await?;

        Ok(training)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<Training>> {
        let training = sqlx::query_as::<_, Training>("SELECT * FROM training WHERE name = $1")
            .bind(name)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(training)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Training>> {
        let rows = sqlx::query_as::<_, Training>(
            "SELECT * FROM training ORDER BY created_at DESC OFFSET $1 LIMIT $2",
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM training")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0)
    }

    pub async fn create_tx(conn: &mut PgConnection, new_training: &NewTraining) -> Result<Training> {
        let training = sqlx::query_as::<_, Training>(
            r#"
            INSERT INTO training (id, name, images_path, labels_path, model_path, status, progress, job_id, start_time)
            VALUES ($1, $2, $3, $4, $5, $6, 0.0, $7, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_training.name)
        .bind(&new_training.images_path)
        .bind(&new_training.labels_path)
        .bind(&new_training.model_path)
        .bind(TrainingStatus::Training)
        .bind(new_training.job_id)
        .fetch_one(conn)
        .await?;

        Ok(training)
    }

    pub async fn update(&self, id: Uuid, update: &TrainingUpdate) -> Result<Option<Training>> {
        let mut conn = self.db.pool().acquire().await?;
        Self::update_tx(&mut *conn, id, update).await
    }

    pub async fn update_tx(
        conn: &mut PgConnection,
        id: Uuid,
        update: &TrainingUpdate,
    ) -> Result<Option<Training>> {
        let mut sets = Vec::new();
        let mut param_count = 0;

        if update.status.is_some() {
            param_count += 1;
            sets.push(format!("status = ${}", param_count));
        }
        if update.progress.is_some() {
            param_count += 1;
            sets.push(format!("progress = ${}", param_count));
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
            "UPDATE training SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            param_count + 1
        );

        let mut query_builder = sqlx::query_as::<_, Training>(&query);

        if let Some(status) = update.status {
            query_builder = query_builder.bind(status);
        }
        if let Some(progress) = update.progress {
            query_builder = query_builder.bind(progress);
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

        let training = query_builder.fetch_optional(conn).await?;

        Ok(training)
    }
}
