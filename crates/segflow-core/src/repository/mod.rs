//! Repository module for database access
//!
//! One repository per entity over a shared PostgreSQL pool. Multi-record
//! commits go through the `*_tx` variants inside a single `pool.begin()`
//! scope.

pub mod evaluation_repository;
pub mod inference_repository;
pub mod job_repository;
pub mod model_repository;
pub mod training_repository;

pub use evaluation_repository::EvaluationRepository;
pub use inference_repository::InferenceRepository;
pub use job_repository::JobRepository;
pub use model_repository::ModelRepository;
pub use training_repository::TrainingRepository;

use sqlx::{Pool, Postgres};
use std::time::Duration;

use crate::config::DatabaseConfig;

/// PostgreSQL database handle
#[derive(Clone)]
pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    /// Trivial round-trip used by health checks and the engine's self-heal.
    pub async fn ping(&self) -> crate::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create PostgreSQL connection pool
pub async fn create_pool(config: &DatabaseConfig) -> crate::Result<Pool<Postgres>> {
    use sqlx::postgres::PgPoolOptions;

    let database_url = format!(
        "postgres://{}:{}@{}:{}/{}",
        config.username, config.password, config.host, config.port, config.database
    );

    tracing::info!(
        "Connecting to PostgreSQL at {}:{}/{}...",
        config.host,
        config.port,
        config.database
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
        .idle_timeout(Duration::from_secs(config.stale_timeout_secs))
        .connect(&database_url)
        .await
        .map_err(|e| crate::Error::DatabaseUnavailable(e.to_string()))?;

    tracing::info!("PostgreSQL connected successfully");
    Ok(pool)
}
