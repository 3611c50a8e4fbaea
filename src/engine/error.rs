// ABOUTME: Error types for task runs and step execution
// ABOUTME: Separates precondition, transport, decode and check failures for callers

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Task does not exist: {name}")]
    TaskNotFound { name: String },

    #[error("Task does not contain any steps: {name}")]
    EmptyTask { name: String },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Failed to decode response body as {encoding}: {message}")]
    Decode { encoding: String, message: String },

    #[error("Check failed for '{key}': expected '{expected}', got {actual:?}")]
    CheckFailed {
        key: String,
        expected: String,
        actual: Option<String>,
    },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Login task '{task}' failed after {attempts} attempts: {message}")]
    LoginFailed {
        task: String,
        attempts: u32,
        message: String,
    },
}

impl ExecutionError {
    /// True when the run failed on task logic (a check) rather than on I/O.
    pub fn is_check_failure(&self) -> bool {
        matches!(self, ExecutionError::CheckFailed { .. })
    }

    /// True for failures raised before any request was attempted.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ExecutionError::TaskNotFound { .. } | ExecutionError::EmptyTask { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ExecutionError>;
