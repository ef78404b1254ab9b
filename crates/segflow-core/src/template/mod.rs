//! Sbatch template rendering

pub mod renderer;
pub mod variables;

pub use renderer::TemplateRenderer;
pub use variables::{
    EvaluationTemplateVariables, PredictionTemplateVariables, TrainingTemplateVariables,
    VariableBundle,
};
