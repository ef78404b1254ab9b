use sqlx::PgConnection;
use uuid::Uuid;

use super::Database;
use crate::models::{Model, NewModel};
use crate::Result;

#[derive(Clone)]
pub struct ModelRepository {
    db: Database,
}

impl ModelRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Model>> {
        let model = sqlx::query_as::<_, Model>("SELECT * FROM model WHERE id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(model)
    }

    pub async fn get_by_name(&self, model_name: &str) -> Result<Option<Model>> {
        let model = sqlx::query_as::<_, Model>("SELECT * FROM model WHERE model_name = $1")
            .bind(model_name)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(model)
    }

    pub async fn get_by_training_id(&self, training_id: Uuid) -> Result<Option<Model>> {
        let model = sqlx::query_as::<_, Model>("SELECT * FROM model WHERE training_id = $1")
            .bind(training_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(model)
    }

    /// Same lookup inside an open transaction; the training-completion commit
    /// uses it as the duplicate-model guard.
    pub async fn get_by_training_id_tx(
        conn: &mut PgConnection,
        training_id: Uuid,
    ) -> Result<Option<Model>> {
        let model = sqlx::query_as::<_, Model>("SELECT * FROM model WHERE training_id = $1")
            .bind(training_id)
            .fetch_optional(conn)
            .await?;

        Ok(model)
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Model>> {
        let models = sqlx::query_as::<_, Model>(
            "SELECT * FROM model ORDER BY created_at DESC OFFSET $1 LIMIT $2",
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(models)
    }

    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM model")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0)
    }

    pub async fn create_tx(conn: &mut PgConnection, new_model: &NewModel) -> Result<Model> {
        let model = sqlx::query_as::<_, Model>(
            r#"
            INSERT INTO model (id, training_id, model_name, model_path, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_model.training_id)
        .bind(&new_model.model_name)
        .bind(&new_model.model_path)
        .bind(new_model.created_at)
        .fetch_one(conn)
        .await?;

        Ok(model)
    }
}
