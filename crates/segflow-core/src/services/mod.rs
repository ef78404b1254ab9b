//! Business services: submission facades plus the HTTP-facing operations

pub mod evaluation_service;
pub mod inference_service;
pub mod model_service;
pub mod training_service;

pub use evaluation_service::{EvaluationList, EvaluationService, EvaluationSubmission};
pub use inference_service::{InferenceService, PredictionList, PredictionSubmission};
pub use model_service::{ModelList, ModelService};
pub use training_service::{TrainingList, TrainingService, TrainingSubmission};
