use std::sync::Arc;

use segflow_core::monitor::EngineHost;
use segflow_core::repository::Database;
use segflow_core::services::{
    EvaluationService, InferenceService, ModelService, TrainingService,
};

#[derive(Clone)]
pub struct AppState {
    pub training_service: TrainingService,
    pub inference_service: InferenceService,
    pub evaluation_service: EvaluationService,
    pub model_service: ModelService,
    pub db: Database,
    pub engine: Arc<EngineHost>,
}

impl AppState {
    pub fn new(
        training_service: TrainingService,
        inference_service: InferenceService,
        evaluation_service: EvaluationService,
        model_service: ModelService,
        db: Database,
        engine: Arc<EngineHost>,
    ) -> Self {
        Self {
            training_service,
            inference_service,
            evaluation_service,
            model_service,
            db,
            engine,
        }
    }
}
