pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod repository;
pub mod services;
pub mod slurm;
pub mod template;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use models::{
    EvalConfiguration, Evaluation, EvaluationStatus, Inference, InferenceStatus, Job, JobKind,
    JobStatus, Model, Training, TrainingStatus,
};
pub use monitor::{EngineHost, MonitorManager};
pub use repository::{create_pool, Database};
pub use slurm::{SchedulerClient, SlurmClient};

/// Current version of segflow
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
