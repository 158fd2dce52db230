//! Error types for the controller.

use autophon_hardware::HardwareError;

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Errors that end a controller worker.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// An input or output line failed.
    #[error("Hardware failure: {0}")]
    Hardware(#[from] HardwareError),

    /// A worker stopped without being cancelled.
    #[error("Worker {worker} stopped unexpectedly")]
    WorkerStopped { worker: String },

    /// A worker task panicked or was aborted.
    #[error("Worker task failed: {message}")]
    Task { message: String },
}

impl ControllerError {
    /// Create a new worker stopped error.
    pub fn worker_stopped(worker: impl Into<String>) -> Self {
        Self::WorkerStopped {
            worker: worker.into(),
        }
    }

    /// Create a new task error.
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }
}
