// ABOUTME: Request builder turning a step's request spec plus the run context into a request
// ABOUTME: Handles url substitution, query/form/json bodies, templates and header overrides

use indexmap::IndexMap;
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::context::Context;
use super::error::{ExecutionError, Result};
use super::transport::PreparedRequest;
use crate::parser::{Parameter, RequestSpec};
use crate::template::TemplateEngine;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    templates: TemplateEngine,
}

impl RequestBuilder {
    pub fn new(templates: TemplateEngine) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &TemplateEngine {
        &self.templates
    }

    /// Build the outbound request for one step against the current context
    pub async fn build(&self, spec: &RequestSpec, context: &Context) -> Result<PreparedRequest> {
        let method = resolve_method(&spec.method)?;
        let mut url = resolve_url(spec, context);
        let mut headers = IndexMap::new();
        let mut body = None;

        if method == Method::GET {
            if !spec.parameters.is_empty() {
                url = append_query(&url, &form_string(&spec.parameters, context));
            }
        } else {
            headers.insert(CONTENT_TYPE.to_string(), content_type(spec));
            let rendered = self.build_body(spec, context).await;
            if !rendered.is_empty() {
                body = Some(rendered);
            }
        }

        // Declared headers go on last so they can override the computed content type
        for (name, value) in &spec.headers {
            headers.retain(|existing: &String, _| !existing.eq_ignore_ascii_case(name));
            headers.insert(name.clone(), value.clone());
        }

        debug!("Prepared {} {}", method, url);

        Ok(PreparedRequest {
            method,
            url,
            headers,
            body,
        })
    }

    async fn build_body(&self, spec: &RequestSpec, context: &Context) -> String {
        if let Some(ref template_path) = spec.template_path {
            let variables = context.merged_with(&spec.parameters);
            return match self.templates.render_file(template_path, &variables).await {
                Ok(rendered) => rendered,
                Err(e) => {
                    warn!("Template {} unusable, sending empty body: {}", template_path, e);
                    String::new()
                }
            };
        }

        if spec.parameters.is_empty() {
            return String::new();
        }

        if content_type(spec).contains("json") {
            json_body(&spec.parameters, context)
        } else {
            form_string(&spec.parameters, context)
        }
    }
}

/// Empty method means GET; comparison is case-insensitive.
pub fn resolve_method(method: &str) -> Result<Method> {
    let trimmed = method.trim();
    if trimmed.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(trimmed.to_ascii_uppercase().as_bytes()).map_err(|_| {
        ExecutionError::InvalidRequest {
            message: format!("Unsupported HTTP method: {}", method),
        }
    })
}

/// Replace every occurrence of each token whose context key is present.
pub fn resolve_url(spec: &RequestSpec, context: &Context) -> String {
    let mut url = spec.url.clone();
    for (token, context_key) in &spec.url_substitutions {
        if let Some(value) = context.get(context_key) {
            url = url.replace(token.as_str(), value);
        }
    }
    url
}

/// `key=value` pairs concatenated with no separator and no escaping.
pub fn form_string(parameters: &[Parameter], context: &Context) -> String {
    let mut out = String::new();
    for parameter in parameters {
        out.push_str(&parameter.key);
        out.push('=');
        out.push_str(&context.resolve(parameter));
    }
    out
}

pub fn append_query(url: &str, query: &str) -> String {
    let mut url = url.to_string();
    if !url.contains('?') {
        url.push('?');
    }
    if !url.ends_with('?') && !url.ends_with('&') {
        url.push('&');
    }
    url.push_str(query);
    url
}

/// Explicitly declared content type, else JSON for parameter bodies and
/// form encoding for template bodies.
pub fn content_type(spec: &RequestSpec) -> String {
    let declared = spec
        .headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE))
        .map(|(_, value)| value.clone());

    match declared {
        Some(value) => value,
        None if spec.template_path.is_some() => FORM_CONTENT_TYPE.to_string(),
        None => JSON_CONTENT_TYPE.to_string(),
    }
}

/// JSON object with each resolved value set at its dotted key path.
pub fn json_body(parameters: &[Parameter], context: &Context) -> String {
    let mut root = Value::Object(Map::new());
    for parameter in parameters {
        set_path(&mut root, &parameter.key, Value::String(context.resolve(parameter)));
    }
    root.to_string()
}

fn set_path(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        warn!("Skipping parameter with malformed path '{}'", path);
        return;
    }

    let mut current = root;
    for segment in &segments[..segments.len() - 1] {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        map.insert(segments[segments.len() - 1].to_string(), value);
    }
}
