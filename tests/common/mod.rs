// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides a scripted in-memory transport and agent config fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use steprunner::engine::{
    ExecutionError, HttpTransport, PreparedRequest, Result, TaskRunner, TransportResponse,
};
use steprunner::parser::AgentConfig;
use steprunner::template::TemplateEngine;

struct Route {
    prefix: String,
    status: u16,
    body: Vec<u8>,
}

/// Transport answering from canned routes and recording every request.
pub struct ScriptedTransport {
    routes: Vec<Route>,
    failures_left: AtomicUsize,
    requests: Mutex<Vec<PreparedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            failures_left: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer 200 with `body` for urls starting with `prefix`. First match wins.
    pub fn route(self, prefix: &str, body: &str) -> Self {
        self.route_bytes(prefix, 200, body.as_bytes().to_vec())
    }

    pub fn route_status(self, prefix: &str, status: u16, body: &str) -> Self {
        self.route_bytes(prefix, status, body.as_bytes().to_vec())
    }

    pub fn route_bytes(mut self, prefix: &str, status: u16, body: Vec<u8>) -> Self {
        self.routes.push(Route {
            prefix: prefix.to_string(),
            status,
            body,
        });
        self
    }

    /// The first `count` requests fail with a transport error.
    pub fn failing_first(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: PreparedRequest) -> Result<TransportResponse> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ExecutionError::Transport {
                url,
                message: "connection refused".to_string(),
            });
        }

        let response = match self.routes.iter().find(|route| url.starts_with(&route.prefix)) {
            Some(route) => TransportResponse {
                status: route.status,
                body: route.body.clone(),
            },
            None => TransportResponse {
                status: 404,
                body: Vec::new(),
            },
        };
        Ok(response)
    }
}

pub fn agent(yaml: &str) -> Arc<AgentConfig> {
    Arc::new(AgentConfig::from_yaml(yaml).expect("Invalid agent config fixture"))
}

pub fn runner(yaml: &str, transport: Arc<ScriptedTransport>) -> TaskRunner {
    TaskRunner::new(agent(yaml), transport, TemplateEngine::new("."))
}

pub fn runner_with_templates(
    yaml: &str,
    transport: Arc<ScriptedTransport>,
    template_dir: &Path,
) -> TaskRunner {
    TaskRunner::new(agent(yaml), transport, TemplateEngine::new(template_dir))
}

/// Temporary directory holding an agent config and its templates.
pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.path().join("templates")
    }

    pub fn write_agent(&self, file_name: &str, content: &str) -> PathBuf {
        let path = self.path().join(file_name);
        std::fs::write(&path, content).expect("Failed to write agent config");
        path
    }

    pub fn write_template(&self, name: &str, content: &str) -> PathBuf {
        let dir = self.templates_dir();
        std::fs::create_dir_all(&dir).expect("Failed to create templates dir");
        let path = dir.join(name);
        std::fs::write(&path, content).expect("Failed to write template");
        path
    }
}
