// ABOUTME: Static validation of agent configs before any request is sent
// ABOUTME: Reports broken expressions and methods as errors, suspicious setups as warnings

use regex::Regex;
use scraper::Selector;
use std::collections::HashSet;
use std::path::PathBuf;

use super::agent::AgentConfig;
use super::error::ValidationError;
use super::task::{ItemRule, RuleType, Step, Task};

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TaskValidator {
    template_dir: Option<PathBuf>,
}

impl TaskValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also compile every referenced body template found under `dir`.
    pub fn with_template_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    /// Validate every task of an agent config
    pub fn validate(&self, config: &AgentConfig) -> ValidationReport {
        let mut report = ValidationReport::new();
        let mut seen = HashSet::new();

        for (index, task) in config.tasks.iter().enumerate() {
            if task.name.trim().is_empty() {
                report.errors.push(ValidationError::EmptyTaskName { index });
            } else if !seen.insert(task.name.as_str()) {
                report.warnings.push(format!(
                    "Task '{}' is defined more than once; only the first definition is used",
                    task.name
                ));
            }
            self.validate_task(task, &mut report);
        }

        report.is_valid = report.errors.is_empty();
        report
    }

    fn validate_task(&self, task: &Task, report: &mut ValidationReport) {
        if task.steps.is_empty() {
            report.errors.push(ValidationError::NoSteps {
                task: task.name.clone(),
            });
            return;
        }

        let mut orders = HashSet::new();
        for step in &task.steps {
            if let Some(order) = step.order {
                if !orders.insert(order) {
                    report.warnings.push(format!(
                        "Task '{}' has several steps with order {}; they run in declared order",
                        task.name, order
                    ));
                }
            }
        }

        for (index, step) in task.steps.iter().enumerate() {
            self.validate_step(&task.name, index + 1, step, report);
        }
    }

    fn validate_step(&self, task: &str, number: usize, step: &Step, report: &mut ValidationReport) {
        let input = &step.input;
        if input.url.trim().is_empty() {
            report.errors.push(ValidationError::EmptyUrl {
                task: task.to_string(),
                step: number,
            });
        }

        let method = input.method.trim();
        if !method.is_empty()
            && reqwest::Method::from_bytes(method.to_ascii_uppercase().as_bytes()).is_err()
        {
            report.errors.push(ValidationError::InvalidMethod {
                task: task.to_string(),
                step: number,
                method: input.method.clone(),
            });
        }

        if builds_json_body(step) {
            for parameter in &input.parameters {
                if parameter.key.split('.').any(|segment| segment.is_empty()) {
                    report.errors.push(ValidationError::InvalidParameterPath {
                        task: task.to_string(),
                        step: number,
                        path: parameter.key.clone(),
                    });
                }
            }
        }

        if let Some(ref template_path) = input.template_path {
            self.validate_template(task, number, template_path, report);
        }

        let output = &step.output;
        if !output.extract {
            if !output.item_rules.is_empty() || !output.collection_rules.is_empty() {
                report.warnings.push(format!(
                    "Task '{}' step {}: extraction is disabled, rules are ignored",
                    task, number
                ));
            }
        } else if let Some(ref scope) = output.scope {
            check_regex(task, number, "scope", scope, report);
        }

        for rule in &output.item_rules {
            check_item_rule(task, number, rule, report);
        }

        for rule in &output.collection_rules {
            match rule.rule_type {
                RuleType::Css => check_selector(
                    task,
                    number,
                    &format!("collection '{}'", rule.key),
                    &rule.expression,
                    report,
                ),
                RuleType::Json => {}
                RuleType::Regex => report.warnings.push(format!(
                    "Task '{}' step {}: regex collection rule '{}' is ignored",
                    task, number, rule.key
                )),
            }
            for item in &rule.item_rules {
                check_item_rule(task, number, item, report);
            }
        }

        if let Some(ref check) = output.check {
            let produced = output.item_rules.iter().any(|rule| rule.key == check.key)
                || (!output.extract && check.key == "body");
            if !produced {
                report.warnings.push(format!(
                    "Task '{}' step {}: no rule produces check key '{}'; the check always fails",
                    task, number, check.key
                ));
            }
        }
    }

    fn validate_template(
        &self,
        task: &str,
        number: usize,
        template_path: &str,
        report: &mut ValidationReport,
    ) {
        let Some(ref dir) = self.template_dir else {
            return;
        };
        let path = dir.join(template_path);
        match std::fs::read_to_string(&path) {
            Ok(template) => {
                if let Err(e) = handlebars::Template::compile(&template) {
                    report.errors.push(ValidationError::InvalidTemplate {
                        task: task.to_string(),
                        step: number,
                        path: template_path.to_string(),
                        error: e.to_string(),
                    });
                }
            }
            Err(e) => report.warnings.push(format!(
                "Task '{}' step {}: template {} is unreadable ({}); the body will be empty",
                task,
                number,
                path.display(),
                e
            )),
        }
    }
}

/// Non-GET step without template whose content type selects a JSON body.
fn builds_json_body(step: &Step) -> bool {
    let input = &step.input;
    let method = input.method.trim();
    if method.is_empty() || method.eq_ignore_ascii_case("get") || input.template_path.is_some() {
        return false;
    }
    input
        .headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .map_or(true, |(_, value)| value.contains("json"))
}

fn check_item_rule(task: &str, number: usize, rule: &ItemRule, report: &mut ValidationReport) {
    let field = format!("rule '{}'", rule.key);
    match rule.rule_type {
        RuleType::Css => check_selector(task, number, &field, &rule.expression, report),
        RuleType::Json => {}
        RuleType::Regex => check_regex(task, number, &field, &rule.expression, report),
    }
    if let Some(ref filter) = rule.filter {
        check_regex(task, number, &format!("filter of '{}'", rule.key), filter, report);
    }
}

fn check_regex(task: &str, number: usize, field: &str, pattern: &str, report: &mut ValidationReport) {
    if let Err(e) = Regex::new(pattern) {
        report.errors.push(ValidationError::InvalidRegex {
            task: task.to_string(),
            step: number,
            field: field.to_string(),
            error: e.to_string(),
        });
    }
}

fn check_selector(
    task: &str,
    number: usize,
    field: &str,
    selector: &str,
    report: &mut ValidationReport,
) {
    if let Err(e) = Selector::parse(selector) {
        report.errors.push(ValidationError::InvalidSelector {
            task: task.to_string(),
            step: number,
            field: field.to_string(),
            error: e.to_string(),
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            is_valid: true,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_validator_skips_templates() {
        let yaml = r#"
tasks:
  - name: submit
    steps:
      - input: {url: http://a, method: post, template_path: absent.json}
"#;
        let config = AgentConfig::from_yaml(yaml).unwrap();
        let report = TaskValidator::default().validate(&config);
        assert!(report.is_valid, "{:?}", report.errors);
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_valid_config() {
        let yaml = r#"
tasks:
  - name: login
    steps:
      - order: 1
        input:
          url: http://example.test/login
          method: post
          params:
            - {key: user.name, value: alice, is_const: true}
        output:
          extract: true
          item_rules:
            - {type: json, expr: data.status, key: status}
          check: {key: status, value: ok, is_const: true}
"#;
        let config = AgentConfig::from_yaml(yaml).unwrap();
        let report = TaskValidator::new().validate(&config);

        assert!(report.is_valid);
        assert!(!report.has_warnings(), "{:?}", report.warnings);
    }

    #[test]
    fn test_structural_errors() {
        let yaml = r#"
tasks:
  - name: ""
    steps:
      - input: {url: "", method: "bad method"}
  - name: empty
    steps: []
"#;
        let config = AgentConfig::from_yaml(yaml).unwrap();
        let report = TaskValidator::new().validate(&config);

        assert!(!report.is_valid);
        assert!(report.errors.contains(&ValidationError::EmptyTaskName { index: 0 }));
        assert!(report.errors.contains(&ValidationError::EmptyUrl {
            task: String::new(),
            step: 1
        }));
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidMethod { .. })));
        assert!(report.errors.contains(&ValidationError::NoSteps {
            task: "empty".to_string()
        }));
    }

    #[test]
    fn test_expression_errors() {
        let yaml = r#"
tasks:
  - name: scrape
    steps:
      - input:
          url: http://example.test
          method: post
          params:
            - {key: "a..b", value: x, is_const: true}
        output:
          extract: true
          scope: "(unclosed"
          item_rules:
            - {type: css, expr: "li[", key: broken}
            - {type: json, expr: "data.value", key: value, regex: "[z-a]"}
"#;
        let config = AgentConfig::from_yaml(yaml).unwrap();
        let report = TaskValidator::new().validate(&config);

        let regex_errors = report
            .errors
            .iter()
            .filter(|e| matches!(e, ValidationError::InvalidRegex { .. }))
            .count();
        assert_eq!(regex_errors, 2);
        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidSelector { .. })));
        assert!(report.errors.contains(&ValidationError::InvalidParameterPath {
            task: "scrape".to_string(),
            step: 1,
            path: "a..b".to_string()
        }));
    }

    #[test]
    fn test_warnings() {
        let yaml = r#"
tasks:
  - name: dup
    steps:
      - order: 1
        input: {url: http://a}
        output:
          extract: true
          collection_rules:
            - {type: regex, expr: "(.*)", key: all}
          check: {key: missing, value: x, is_const: true}
      - order: 1
        input: {url: http://b}
        output:
          item_rules:
            - {type: css, expr: p, key: text}
  - name: dup
    steps:
      - input: {url: http://c}
"#;
        let config = AgentConfig::from_yaml(yaml).unwrap();
        let report = TaskValidator::new().validate(&config);

        assert!(report.is_valid);
        let joined = report.warnings.join("\n");
        assert!(joined.contains("more than once"));
        assert!(joined.contains("several steps with order 1"));
        assert!(joined.contains("regex collection rule 'all'"));
        assert!(joined.contains("check key 'missing'"));
        assert!(joined.contains("extraction is disabled"));
    }

    #[test]
    fn test_template_checks() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{{#if x}}open").unwrap();

        let yaml = r#"
tasks:
  - name: t
    steps:
      - input: {url: http://a, method: post, template_path: broken.json}
      - input: {url: http://a, method: post, template_path: absent.json}
"#;
        let config = AgentConfig::from_yaml(yaml).unwrap();
        let report = TaskValidator::new()
            .with_template_dir(dir.path())
            .validate(&config);

        assert!(report
            .errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidTemplate { step: 1, .. })));
        assert!(report.warnings.iter().any(|w| w.contains("absent.json")));
    }
}
