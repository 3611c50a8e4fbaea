// ABOUTME: Error types for agent config loading and task validation
// ABOUTME: Defines specific error types for parser module operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Failed to read agent config: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Agent config not found: {0}")]
    NotFound(String),

    #[error("Invalid agent config: {0}")]
    InvalidFormat(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Task at position {index} has an empty name")]
    EmptyTaskName { index: usize },

    #[error("Task '{task}' does not contain any steps")]
    NoSteps { task: String },

    #[error("Task '{task}' step {step}: empty url")]
    EmptyUrl { task: String, step: usize },

    #[error("Task '{task}' step {step}: invalid HTTP method '{method}'")]
    InvalidMethod {
        task: String,
        step: usize,
        method: String,
    },

    #[error("Task '{task}' step {step}: invalid regex in {field}: {error}")]
    InvalidRegex {
        task: String,
        step: usize,
        field: String,
        error: String,
    },

    #[error("Task '{task}' step {step}: invalid css selector in {field}: {error}")]
    InvalidSelector {
        task: String,
        step: usize,
        field: String,
        error: String,
    },

    #[error("Task '{task}' step {step}: template '{path}' does not compile: {error}")]
    InvalidTemplate {
        task: String,
        step: usize,
        path: String,
        error: String,
    },

    #[error("Task '{task}' step {step}: invalid parameter path '{path}'")]
    InvalidParameterPath {
        task: String,
        step: usize,
        path: String,
    },
}

pub type Result<T> = std::result::Result<T, ParserError>;
