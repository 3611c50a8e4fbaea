// ABOUTME: Handlebars-backed renderer for request body templates
// ABOUTME: Resolves template paths against a directory and renders flat string variables

use handlebars::Handlebars;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::error::{Result, TemplateError};
use super::helpers;

#[derive(Clone)]
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
    template_dir: PathBuf,
}

impl TemplateEngine {
    /// Create an engine resolving template files under `template_dir`
    pub fn new<P: Into<PathBuf>>(template_dir: P) -> Self {
        let mut handlebars = Handlebars::new();

        handlebars.set_strict_mode(false);
        handlebars.set_dev_mode(false);
        // Bodies are JSON or form text, never HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        helpers::register_helpers(&mut handlebars);

        Self {
            handlebars,
            template_dir: template_dir.into(),
        }
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    pub fn resolve_path(&self, template_path: &str) -> PathBuf {
        self.template_dir.join(template_path)
    }

    /// Render a template string with flat string variables
    pub fn render(&self, template: &str, variables: &HashMap<String, String>) -> Result<String> {
        self.handlebars
            .render_template(template, variables)
            .map_err(TemplateError::HandlebarsError)
    }

    /// Load a template file relative to the template directory and render it
    pub async fn render_file(
        &self,
        template_path: &str,
        variables: &HashMap<String, String>,
    ) -> Result<String> {
        let path = self.resolve_path(template_path);
        let template = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| TemplateError::ReadError { path, source })?;
        self.render(&template, variables)
    }

    /// Validate template syntax without rendering
    pub fn validate_template(&self, template: &str) -> Result<()> {
        handlebars::Template::compile(template)
            .map(|_| ())
            .map_err(|e| TemplateError::SyntaxError(e.to_string()))
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("template_dir", &self.template_dir)
            .finish()
    }
}
