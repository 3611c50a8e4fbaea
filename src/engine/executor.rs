// ABOUTME: Task runner orchestrating the steps of a task against one shared transport
// ABOUTME: Builds, sends, decodes, extracts and checks each step, folding outputs as it goes

use indexmap::IndexMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::context::Context;
use super::error::{ExecutionError, Result};
use super::request::RequestBuilder;
use super::result::{OutputValue, StepOutput, TaskOutput};
use super::transport::HttpTransport;
use crate::extract::{decode_body, ExtractError, ResponseExtractor};
use crate::parser::{AgentConfig, Check, Step, Task};
use crate::template::TemplateEngine;

/// Runs tasks from an agent config. Cheap to share; every run owns its own context.
pub struct TaskRunner {
    config: Arc<AgentConfig>,
    transport: Arc<dyn HttpTransport>,
    requests: RequestBuilder,
}

impl TaskRunner {
    pub fn new(
        config: Arc<AgentConfig>,
        transport: Arc<dyn HttpTransport>,
        templates: TemplateEngine,
    ) -> Self {
        Self {
            config,
            transport,
            requests: RequestBuilder::new(templates),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Look up a task by name and run it with the preset arguments.
    pub async fn run_by_name(&self, name: &str) -> Result<TaskOutput> {
        self.run_by_name_with(name, &IndexMap::new()).await
    }

    /// Same as `run_by_name`, with extra context entries layered over the presets.
    pub async fn run_by_name_with(
        &self,
        name: &str,
        variables: &IndexMap<String, String>,
    ) -> Result<TaskOutput> {
        let task = self
            .config
            .get_task_by_name(name)
            .ok_or_else(|| ExecutionError::TaskNotFound {
                name: name.to_string(),
            })?;
        self.run_task(task, variables).await
    }

    /// Run every step of `task` in ascending order. The first failing step
    /// aborts the run and no partial output is returned.
    #[instrument(skip_all, fields(task = %task.name, run_id = %uuid::Uuid::new_v4()))]
    pub async fn run_task(
        &self,
        task: &Task,
        variables: &IndexMap<String, String>,
    ) -> Result<TaskOutput> {
        if task.steps.is_empty() {
            return Err(ExecutionError::EmptyTask {
                name: task.name.clone(),
            });
        }

        let start_time = Instant::now();
        let mut steps: Vec<&Step> = task.steps.iter().collect();
        steps.sort_by_key(|step| step.order);

        let mut context = Context::seeded(&self.config.arguments);
        context.extend(variables.iter().map(|(k, v)| (k.clone(), v.clone())));

        info!("Starting task {} with {} steps", task.name, steps.len());

        let mut output = TaskOutput::new();
        for (index, step) in steps.iter().enumerate() {
            if let Err(e) = self.run_step(index, step, &mut context, &mut output).await {
                error!("Task {} failed at step {}: {}", task.name, index + 1, e);
                return Err(e);
            }
        }

        info!(
            "Task {} completed in {:?} with {} outputs",
            task.name,
            start_time.elapsed(),
            output.len()
        );
        Ok(output)
    }

    async fn run_step(
        &self,
        index: usize,
        step: &Step,
        context: &mut Context,
        output: &mut TaskOutput,
    ) -> Result<()> {
        let request = self.requests.build(&step.input, context).await?;
        debug!(
            "Step {}: {} {} ({} headers)",
            index + 1,
            request.method,
            request.url,
            request.headers.len()
        );

        let response = self.transport.send(request).await?;
        if response.status >= 400 {
            warn!("Step {} returned status {}", index + 1, response.status);
        } else {
            debug!("Step {} returned status {}", index + 1, response.status);
        }

        let body = decode_body(&response.body, &step.output.encoding).map_err(decode_error)?;

        // The extractor parses synchronously and must not live across an await
        let step_output = ResponseExtractor::new(&step.output).extract(&body);
        debug!("Step {} extracted {} values", index + 1, step_output.len());

        if let Some(ref check) = step.output.check {
            evaluate_check(check, context, &step_output)?;
        }

        context.absorb(&step_output);
        output.merge_step(step_output);
        Ok(())
    }
}

/// Compare the step's extracted value against the expected one. `context`
/// must be the state before this step's outputs are folded in.
pub fn evaluate_check(check: &Check, context: &Context, output: &StepOutput) -> Result<()> {
    let expected = if check.is_constant {
        check.expected_value.clone()
    } else {
        context.get(&check.key).unwrap_or_default().to_string()
    };

    let actual = output.get(&check.key).and_then(OutputValue::as_scalar);
    match actual {
        Some(actual) if actual == expected => Ok(()),
        _ => Err(ExecutionError::CheckFailed {
            key: check.key.clone(),
            expected,
            actual: actual.map(str::to_string),
        }),
    }
}

fn decode_error(error: ExtractError) -> ExecutionError {
    match error {
        ExtractError::Decode { encoding, message } => ExecutionError::Decode { encoding, message },
        other => ExecutionError::Decode {
            encoding: String::new(),
            message: other.to_string(),
        },
    }
}
