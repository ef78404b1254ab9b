//! Job reconciliation engine
//!
//! A family of cooperating monitors polls the scheduler for every active job,
//! validates transitions against the state machine, and applies terminal
//! transitions atomically together with the sibling record (and, for
//! training, the derived model).

pub mod base;
pub mod evaluation;
pub mod host;
pub mod inference;
pub mod manager;
pub mod training;

pub use base::{JobMonitor, MonitorKind, MonitorStatus};
pub use evaluation::EvaluationMonitor;
pub use host::{EngineHost, HostHealth};
pub use inference::InferenceMonitor;
pub use manager::{ManagerStatus, MonitorManager};
pub use training::TrainingMonitor;
