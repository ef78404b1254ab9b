use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::routes::create_router;
use crate::state::AppState;
use segflow_core::monitor::{EngineHost, MonitorManager};
use segflow_core::repository::{create_pool, Database};
use segflow_core::services::{
    EvaluationService, InferenceService, ModelService, TrainingService,
};
use segflow_core::slurm::{SchedulerClient, SlurmClient};
use segflow_core::template::TemplateRenderer;
use segflow_core::{Config, Result};

pub async fn run(config: Config) -> Result<()> {
    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .map_err(|e| segflow_core::Error::Config(format!("Invalid host: {}", e)))?,
        config.server.port,
    ));

    // Missing templates are a startup failure, before anything is submitted.
    config.validate_templates()?;

    let app_state = create_app_state(&config).await?;
    let engine = app_state.engine.clone();

    engine.clone().start().await?;

    let app = create_router(app_state);

    info!("Segflow API server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| segflow_core::Error::Other(format!("Failed to bind {}: {}", addr, e)))?;

    let shutdown_engine = engine.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| segflow_core::Error::Other(format!("Server error: {}", e)))?;

    shutdown_engine.shutdown().await;

    Ok(())
}

/// Build shared state: pool, scheduler client, renderers, services, engine.
async fn create_app_state(config: &Config) -> Result<AppState> {
    let pool = create_pool(&config.database).await?;
    let db = Database::new(pool);

    let scheduler: Arc<dyn SchedulerClient> = Arc::new(SlurmClient::new(&config.slurm));

    let training_renderer = TemplateRenderer::from_file(&config.storage.training_template())?;
    let prediction_renderer = TemplateRenderer::from_file(&config.storage.prediction_template())?;
    let evaluation_renderer = TemplateRenderer::from_file(&config.storage.evaluation_template())?;

    let training_service = TrainingService::new(
        db.clone(),
        scheduler.clone(),
        training_renderer,
        config.storage.models_base_path.clone(),
    );
    let inference_service =
        InferenceService::new(db.clone(), scheduler.clone(), prediction_renderer);
    let evaluation_service = EvaluationService::new(
        db.clone(),
        scheduler.clone(),
        evaluation_renderer,
        config.storage.models_base_path.clone(),
    );
    let model_service = ModelService::new(db.clone());

    let manager = Arc::new(MonitorManager::new(
        db.clone(),
        scheduler,
        Duration::from_secs(config.slurm.poll_interval_secs),
    ));
    let engine = Arc::new(EngineHost::new(manager, db.clone()));

    Ok(AppState::new(
        training_service,
        inference_service,
        evaluation_service,
        model_service,
        db,
        engine,
    ))
}

/// Resolve on ctrl-c or SIGTERM so the engine gets a clean shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install ctrl-c handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}
