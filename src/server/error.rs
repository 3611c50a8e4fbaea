// ABOUTME: Front door errors and their HTTP status mapping
// ABOUTME: Check failures surface as 422 so callers can tell task logic from transport trouble

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::engine::ExecutionError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid token")]
    Unauthorized,

    #[error("invalid request body: {0}")]
    BadRequest(String),

    #[error("task not defined")]
    UnknownTask(String),

    #[error(transparent)]
    Execution(ExecutionError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server stopped: {0}")]
    Serve(#[source] std::io::Error),
}

impl From<ExecutionError> for ServerError {
    fn from(error: ExecutionError) -> Self {
        match error {
            ExecutionError::TaskNotFound { name } => ServerError::UnknownTask(name),
            other => ServerError::Execution(other),
        }
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Unauthorized => StatusCode::FORBIDDEN,
            ServerError::BadRequest(_) | ServerError::UnknownTask(_) => StatusCode::BAD_REQUEST,
            ServerError::Execution(e) if e.is_check_failure() => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, self.to_string()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServerError::Unauthorized.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ServerError::from(ExecutionError::TaskNotFound {
                name: "x".to_string()
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(ExecutionError::CheckFailed {
                key: "k".to_string(),
                expected: "a".to_string(),
                actual: None,
            })
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServerError::from(ExecutionError::Transport {
                url: "http://h".to_string(),
                message: "refused".to_string(),
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
