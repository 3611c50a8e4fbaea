// ABOUTME: Task execution engine: context, request building, transport and step orchestration
// ABOUTME: Exports the task runner, its result types and the login bootstrap

pub mod context;
pub mod error;
pub mod executor;
pub mod request;
pub mod result;
pub mod session;
pub mod transport;

pub use context::Context;
pub use error::{ExecutionError, Result};
pub use executor::{evaluate_check, TaskRunner};
pub use request::RequestBuilder;
pub use result::{Fields, OutputValue, StepOutput, TaskOutput};
pub use session::{ensure_login, LoginPolicy};
pub use transport::{
    HttpTransport, PreparedRequest, ReqwestTransport, TransportOptions, TransportResponse,
};
