// ABOUTME: Front door routes: welcome page, favicon stub and the authenticated task call
// ABOUTME: Every call runs the task with its own context over the shared runner

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::auth::{TokenVerifier, TOKEN_HEADER};
use super::error::{Result, ServerError};
use crate::engine::{TaskOutput, TaskRunner};

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<TaskRunner>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(runner: Arc<TaskRunner>, verifier: TokenVerifier) -> Self {
        Self {
            runner,
            verifier: Arc::new(verifier),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CallRequest {
    pub task: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/favicon.ico", get(favicon))
        .route("/call", post(call_task))
        .fallback(not_found)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn welcome() -> &'static str {
    "Welcome"
}

async fn favicon() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn call_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TaskOutput>> {
    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !state.verifier.verify(token) {
        return Err(ServerError::Unauthorized);
    }

    let request: CallRequest =
        serde_json::from_slice(&body).map_err(|e| ServerError::BadRequest(e.to_string()))?;
    debug!("Calling task {}", request.task);

    let output = state.runner.run_by_name(&request.task).await?;
    Ok(Json(output))
}

async fn log_requests(request: Request, next: Next) -> Response {
    info!("<<< {} {}", request.method(), request.uri().path());
    let response = next.run(request).await;
    info!(">>> {}", response.status());
    response
}
