// ABOUTME: Command implementations for the steprunner CLI
// ABOUTME: Handles run, serve, validate, list and token commands

use anyhow::{anyhow, Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::args::Args;
use super::config::Config;
use crate::engine::{ensure_login, ReqwestTransport, TaskRunner};
use crate::parser::{AgentConfig, AgentConfigLoader, TaskValidator};
use crate::server::{self, AppState, TokenVerifier};
use crate::template::TemplateEngine;

/// Load the agent config named by the settings
pub async fn load_agent_config(config: &Config) -> Result<Arc<AgentConfig>> {
    let agent = AgentConfigLoader::new()
        .load_file(&config.agent_config)
        .await
        .with_context(|| {
            format!(
                "Failed to load agent config {}",
                config.agent_config.display()
            )
        })?;
    info!(
        "Loaded {} tasks from {}",
        agent.tasks.len(),
        config.agent_config.display()
    );
    Ok(Arc::new(agent))
}

/// Build a runner over a fresh cookie-keeping transport
pub fn build_runner(config: &Config, agent: Arc<AgentConfig>) -> Result<TaskRunner> {
    let transport = ReqwestTransport::new(&config.transport_options())
        .map_err(|e| anyhow!("Failed to create HTTP transport: {}", e))?;
    let templates = TemplateEngine::new(config.resolved_template_dir());
    Ok(TaskRunner::new(agent, Arc::new(transport), templates))
}

/// Run a single task and print or write its result
pub async fn run_task(
    task: String,
    vars: Vec<String>,
    output: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let variables = Args::parse_variables(&vars)?;
    info!("Parsed {} context variables", variables.len());

    let agent = load_agent_config(config).await?;
    let runner = build_runner(config, agent)?;

    let result = runner
        .run_by_name_with(&task, &variables)
        .await
        .map_err(|e| anyhow!("Task '{}' failed: {}", task, e))?;

    let json_content = serde_json::to_string_pretty(&result)
        .map_err(|e| anyhow!("Failed to serialize result to JSON: {}", e))?;

    if let Some(output_path) = output {
        std::fs::write(&output_path, json_content).map_err(|e| {
            anyhow!(
                "Failed to write output file '{}': {}",
                output_path.display(),
                e
            )
        })?;
        info!("Result written to: {}", output_path.display());
    } else {
        println!("{}", json_content);
    }

    Ok(())
}

/// Log in once, then serve the front door
pub async fn serve(port: Option<u16>, config: &Config) -> Result<()> {
    let agent = load_agent_config(config).await?;
    let port = port.unwrap_or(agent.port);
    let verifier = TokenVerifier::from_config(&agent);
    let runner = Arc::new(build_runner(config, agent)?);

    ensure_login(&runner, &config.login)
        .await
        .map_err(|e| anyhow!("Login bootstrap failed: {}", e))?;

    server::serve(AppState::new(runner, verifier), port).await?;
    Ok(())
}

/// Validate the agent config and report findings
pub async fn validate(config: &Config) -> Result<()> {
    let agent = load_agent_config(config).await?;
    let report = TaskValidator::new()
        .with_template_dir(config.resolved_template_dir())
        .validate(&agent);

    for warning in &report.warnings {
        println!("⚠ {}", warning);
    }
    for error in &report.errors {
        println!("✗ {}", error);
    }

    if !report.is_valid {
        return Err(anyhow!(
            "Agent config has {} validation errors",
            report.errors.len()
        ));
    }

    println!(
        "✓ Agent config {} is valid",
        config.agent_config.display()
    );
    println!("  Tasks: {}", agent.tasks.len());
    println!("  Preset arguments: {}", agent.arguments.len());
    Ok(())
}

/// Print task names with their step counts
pub async fn list_tasks(config: &Config) -> Result<()> {
    let agent = load_agent_config(config).await?;
    if agent.tasks.is_empty() {
        println!("No tasks defined");
        return Ok(());
    }
    for task in &agent.tasks {
        println!("{} ({} steps)", task.name, task.steps.len());
    }
    Ok(())
}

/// Print the token the front door expects
pub async fn print_token(config: &Config) -> Result<()> {
    let agent = load_agent_config(config).await?;
    let token = TokenVerifier::from_config(&agent)
        .issue()
        .ok_or_else(|| anyhow!("Agent config has no secret"))?;
    println!("{}", token);
    Ok(())
}
