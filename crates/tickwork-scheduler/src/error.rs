use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The cadence expression could not be parsed. Fatal at registration.
    #[error("Invalid cadence '{expression}': {reason}")]
    InvalidCadence { expression: String, reason: String },

    /// A job with this name is already registered. Fatal at registration.
    #[error("Duplicate job name: {name}")]
    DuplicateJobName { name: String },

    /// Caller-supplied input was rejected; nothing was mutated.
    #[error("Validation error: {field} {reason}")]
    Validation { field: String, reason: String },

    /// A handler returned an error or panicked.
    #[error("Job '{job}' failed: {reason}")]
    HandlerFailure { job: String, reason: String },

    /// A handler exceeded its per-job time budget.
    #[error("Job '{job}' timed out after {ms}ms")]
    HandlerTimeout { job: String, ms: u64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchedulerError {
    /// Short error code string returned to HTTP clients.
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::InvalidCadence { .. } => "INVALID_CADENCE",
            SchedulerError::DuplicateJobName { .. } => "DUPLICATE_JOB_NAME",
            SchedulerError::Validation { .. } => "VALIDATION_ERROR",
            SchedulerError::HandlerFailure { .. } => "HANDLER_FAILURE",
            SchedulerError::HandlerTimeout { .. } => "HANDLER_TIMEOUT",
            SchedulerError::Serialization(_) => "SERIALIZATION_ERROR",
            SchedulerError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
