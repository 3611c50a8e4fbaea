// ABOUTME: Application settings for steprunner: logging, agent config location and transport
// ABOUTME: Loaded from steprunner.yaml or the home directory, then overridden from the environment

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::{LoginPolicy, TransportOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Task definitions, JSON or YAML by extension.
    #[serde(default = "default_agent_config")]
    pub agent_config: PathBuf,

    /// Body templates; defaults to `templates/` next to the agent config.
    #[serde(default)]
    pub template_dir: Option<PathBuf>,

    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,

    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub login: LoginPolicy,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_agent_config() -> PathBuf {
    PathBuf::from("config").join("agent.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent_config: default_agent_config(),
            template_dir: None,
            request_timeout: None,
            user_agent: None,
            login: LoginPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Invalid settings in {}", config_path.display()))?
        } else {
            Config::default()
        };

        config.merge_env();
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let possible_paths = [
            PathBuf::from("steprunner.yaml"),
            PathBuf::from("steprunner.yml"),
            PathBuf::from(".steprunner.yaml"),
        ];

        for path in possible_paths {
            if path.exists() {
                return path;
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".steprunner").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        // Default path (may not exist)
        PathBuf::from("steprunner.yaml")
    }

    fn merge_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `STEPRUNNER_*` overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("STEPRUNNER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("STEPRUNNER_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(path) = lookup("STEPRUNNER_AGENT_CONFIG") {
            self.agent_config = PathBuf::from(path);
        }
        if let Some(dir) = lookup("STEPRUNNER_TEMPLATE_DIR") {
            self.template_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn resolved_template_dir(&self) -> PathBuf {
        match self.template_dir {
            Some(ref dir) => dir.clone(),
            None => self
                .agent_config
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("templates"),
        }
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            timeout: self.request_timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}
