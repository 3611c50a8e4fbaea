// ABOUTME: Parser module for agent configs and task definitions
// ABOUTME: Exports config loading, validation, and the task data structures

pub mod agent;
pub mod error;
pub mod task;
pub mod validation;

pub use agent::{AgentConfig, AgentConfigLoader};
pub use error::{ParserError, ValidationError};
pub use task::{
    Check, CollectionRule, ItemRule, KeyValue, Parameter, RequestSpec, ResponseSpec, RuleType,
    Step, Task,
};
pub use validation::{TaskValidator, ValidationReport};
