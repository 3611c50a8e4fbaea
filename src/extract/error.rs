// ABOUTME: Error types for response decoding and extraction
// ABOUTME: Context failures stop a rule pass, decode failures stop the step

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("Cannot build {kind} context: {message}")]
    Context { kind: &'static str, message: String },

    #[error("Cannot decode body as {encoding}: {message}")]
    Decode { encoding: String, message: String },
}

impl ExtractError {
    pub fn context(kind: &'static str, message: impl Into<String>) -> Self {
        ExtractError::Context {
            kind,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
