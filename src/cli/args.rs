// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the main CLI structure and subcommands for steprunner

use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "steprunner")]
#[command(about = "Run configured multi-step HTTP tasks and extract their results")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one task and print its result as JSON
    Run {
        #[arg(help = "Name of the task to run")]
        task: String,

        #[arg(
            short = 'V',
            long = "var",
            help = "Extra context entries for this run (key=value)"
        )]
        vars: Vec<String>,

        #[arg(short, long, help = "Write the result to a file instead of stdout")]
        output: Option<PathBuf>,
    },

    /// Log in, then serve the task front door
    Serve {
        #[arg(short, long, help = "Port to listen on (defaults to the agent config port)")]
        port: Option<u16>,
    },

    /// Check the agent config for errors without sending requests
    Validate,

    /// List the configured tasks
    List,

    /// Print the x-token value for the configured secret
    Token,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse variables from key=value format
    pub fn parse_variables(vars: &[String]) -> anyhow::Result<IndexMap<String, String>> {
        let mut variables = IndexMap::new();

        for var in vars {
            if let Some((key, value)) = var.split_once('=') {
                variables.insert(key.to_string(), value.to_string());
            } else {
                return Err(anyhow::anyhow!(
                    "Invalid variable format '{}'. Expected 'key=value'",
                    var
                ));
            }
        }

        Ok(variables)
    }
}
