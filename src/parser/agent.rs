// ABOUTME: Agent config: preset arguments, front door credentials and the task list
// ABOUTME: Loads JSON or YAML definitions and sorts every task's steps on load

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use super::error::{ParserError, Result};
use super::task::{null_as_default, KeyValue, Task};

fn default_port() -> u16 {
    8080
}

/// Unknown top-level keys are rejected so a file in the wrong shape fails to
/// load instead of loading empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    #[serde(default = "default_port", alias = "Port")]
    pub port: u16,
    /// Key for the front door token check.
    #[serde(default, alias = "aes_key", alias = "AesKey", alias = "aesKey")]
    pub secret: String,
    #[serde(default, alias = "CheckData", alias = "checkData")]
    pub check_data: String,
    /// Preset arguments seeding every run's context.
    #[serde(default, alias = "Arguments", deserialize_with = "null_as_default")]
    pub arguments: Vec<KeyValue>,
    #[serde(default, alias = "Tasks", deserialize_with = "null_as_default")]
    pub tasks: Vec<Task>,
}

impl AgentConfig {
    /// Parse from a file; `.yaml`/`.yml` selects YAML, anything else JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ParserError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, is_yaml(path))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Self::parse(content, false)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Self::parse(content, true)
    }

    fn parse(content: &str, yaml: bool) -> Result<Self> {
        let mut config: AgentConfig = if yaml {
            serde_yaml::from_str(content)?
        } else {
            serde_json::from_str(content)?
        };

        for task in &mut config.tasks {
            task.sort_steps();
        }

        Ok(config)
    }

    /// First task with the given name. Names are not required to be unique.
    pub fn get_task_by_name(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name == name)
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|task| task.name.as_str()).collect()
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[derive(Debug, Clone, Default)]
pub struct AgentConfigLoader;

impl AgentConfigLoader {
    pub fn new() -> Self {
        Self
    }

    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<AgentConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ParserError::NotFound(path.display().to_string())
            } else {
                ParserError::IoError(e)
            }
        })?;
        AgentConfig::parse(&content, is_yaml(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    const CONFIG_JSON: &str = r#"{
        "port": 9000,
        "aes_key": "k",
        "check_data": "ok",
        "arguments": [{"key": "user", "value": "alice"}],
        "tasks": [
            {"name": "fetch", "steps": [
                {"order": 2, "input": {"url": "http://h/second"}},
                {"order": 1, "input": {"url": "http://h/first"}}
            ]},
            {"name": "fetch", "steps": [{"input": {"url": "http://h/other"}}]}
        ]
    }"#;

    #[test]
    fn test_parse_json_sorts_steps() {
        let config = AgentConfig::from_json(CONFIG_JSON).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.secret, "k");
        assert_eq!(config.arguments[0].value, "alice");

        let task = config.get_task_by_name("fetch").unwrap();
        assert_eq!(task.steps[0].input.url, "http://h/first");
        assert_eq!(task.steps[1].input.url, "http://h/second");
    }

    #[test]
    fn test_get_task_by_name_first_match_wins() {
        let config = AgentConfig::from_json(CONFIG_JSON).unwrap();
        let task = config.get_task_by_name("fetch").unwrap();
        assert_eq!(task.steps.len(), 2);
        assert!(config.get_task_by_name("missing").is_none());
    }

    #[test]
    fn test_parse_yaml_file() {
        let yaml = r#"
secret: s3cret
check_data: hello
tasks:
  - name: login
    steps:
      - input:
          url: "http://h/login"
          method: post
"#;
        let mut file = Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = AgentConfig::from_file(file.path()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.task_names(), vec!["login"]);
    }

    #[test]
    fn test_parse_pascal_case_file() {
        let json = r#"{
            "Port": 9000,
            "AesKey": "k",
            "CheckData": "ok",
            "Arguments": [{"Key": "user", "Value": "alice"}],
            "Tasks": [{"Name": "login", "Steps": [
                {"Sort": 1, "Input": {"Url": "http://h/login", "UrlParams": {},
                 "Params": [{"Key": "a", "Value": "1", "IsConst": true}]},
                 "Output": {"Extract": false}}
            ]}]
        }"#;

        let config = AgentConfig::from_json(json).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.secret, "k");
        assert_eq!(config.check_data, "ok");
        assert_eq!(config.arguments[0].key, "user");
        assert_eq!(config.tasks.len(), 1);
        let step = &config.get_task_by_name("login").unwrap().steps[0];
        assert_eq!(step.input.parameters[0], crate::parser::Parameter::constant("a", "1"));
    }

    #[test]
    fn test_unknown_top_level_field_is_rejected() {
        let result = AgentConfig::from_json(r#"{"Jobs": [{"Name": "login"}]}"#);
        assert!(matches!(result, Err(ParserError::JsonError(_))));

        let result = AgentConfig::from_yaml("workflows: []\n");
        assert!(matches!(result, Err(ParserError::YamlError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = AgentConfig::from_file("/nonexistent/agent.json");
        assert!(matches!(result, Err(ParserError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_loader_reads_json() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(CONFIG_JSON.as_bytes()).unwrap();

        let config = AgentConfigLoader::new().load_file(file.path()).await.unwrap();
        assert_eq!(config.tasks.len(), 2);
    }
}
