// ABOUTME: HTTP transport seam between the step executor and the network
// ABOUTME: Shared reqwest client with a cookie store so login sessions carry across runs

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

use super::error::{ExecutionError, Result};

/// Fully resolved outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send the request and read the whole body. Non-2xx statuses are not errors.
    async fn send(&self, request: PreparedRequest) -> Result<TransportResponse>;
}

#[derive(Debug, Clone, Default)]
pub struct TransportOptions {
    pub timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(options: &TransportOptions) -> Result<Self> {
        let mut builder = Client::builder().cookie_store(true);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(ref user_agent) = options.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder
            .build()
            .map_err(|e| ExecutionError::InvalidRequest {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    fn header_map(headers: &IndexMap<String, String>) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ExecutionError::InvalidRequest {
                    message: format!("Invalid header name '{}': {}", name, e),
                }
            })?;
            let value =
                HeaderValue::from_str(value).map_err(|e| ExecutionError::InvalidRequest {
                    message: format!("Invalid value for header '{}': {}", name, e),
                })?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: PreparedRequest) -> Result<TransportResponse> {
        let headers = Self::header_map(&request.headers)?;
        let url = request.url;

        let mut builder = self
            .client
            .request(request.method.clone(), url.as_str())
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ExecutionError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        debug!("{} {} -> {}", request.method, url, status);

        let body = response
            .bytes()
            .await
            .map_err(|e| ExecutionError::Transport {
                url: url.clone(),
                message: format!("Failed to read response body: {}", e),
            })?;

        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}
