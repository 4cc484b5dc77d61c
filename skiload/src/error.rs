use skiload_core::{ConfigError, PhaseKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("Phase {phase} was interrupted waiting for {threshold} workers to finish")]
    ThresholdInterrupted { phase: PhaseKind, threshold: usize },

    #[error("A worker of phase {phase} failed: {reason}")]
    WorkerFailed { phase: PhaseKind, reason: String },
}

#[derive(Debug, Error)]
pub(crate) enum WorkerError {
    #[error("Result channel closed before all measurements were delivered")]
    ResultsClosed,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Unable to write measurement: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unable to build the HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Run aborted: {0}")]
    Phase(#[from] PhaseError),

    #[error("Unable to persist measurements: {0}")]
    Sink(#[from] SinkError),
}
