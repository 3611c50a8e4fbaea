// ABOUTME: Main library module for the steprunner HTTP task runner
// ABOUTME: Exports all core modules and provides the public API

pub mod cli;
pub mod engine;
pub mod extract;
pub mod parser;
pub mod server;
pub mod template;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use engine::{ExecutionError, HttpTransport, OutputValue, TaskOutput, TaskRunner};
pub use extract::ResponseExtractor;
pub use parser::{AgentConfig, Task, TaskValidator};
pub use server::{build_router, AppState, TokenVerifier};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
