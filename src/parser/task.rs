// ABOUTME: Task definition structures: steps, request specs, extraction rules and checks
// ABOUTME: Deserialized from the agent config; aliases accept the PascalCase and camelCase legacy keys

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Missing and `null` both deserialize to the default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An empty string counts as absent.
fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|value| !value.is_empty()))
}

/// A named, ordered sequence of steps executed as one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Steps", deserialize_with = "null_as_default")]
    pub steps: Vec<Step>,
}

/// One request/response cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, alias = "sort", alias = "Sort")]
    pub order: Option<i64>,
    #[serde(alias = "Input")]
    pub input: RequestSpec,
    #[serde(default, alias = "Output", deserialize_with = "null_as_default")]
    pub output: ResponseSpec,
}

/// Key/value parameter. Constant parameters carry their value literally,
/// otherwise `value` names a context key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(alias = "Key")]
    pub key: String,
    #[serde(default, alias = "Value")]
    pub value: String,
    #[serde(default, alias = "is_const", alias = "IsConst", alias = "isConst")]
    pub is_constant: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestSpec {
    #[serde(alias = "Url", alias = "URL")]
    pub url: String,
    /// Literal token in `url` -> context key whose value replaces it.
    #[serde(
        default,
        alias = "url_params",
        alias = "UrlParams",
        alias = "urlParams",
        deserialize_with = "null_as_default"
    )]
    pub url_substitutions: IndexMap<String, String>,
    #[serde(default, alias = "Method")]
    pub method: String,
    #[serde(default, alias = "Headers", deserialize_with = "null_as_default")]
    pub headers: IndexMap<String, String>,
    #[serde(
        default,
        alias = "params",
        alias = "Params",
        deserialize_with = "null_as_default"
    )]
    pub parameters: Vec<Parameter>,
    #[serde(
        default,
        alias = "TemplatePath",
        alias = "templatePath",
        deserialize_with = "empty_as_none"
    )]
    pub template_path: Option<String>,
    #[serde(default, alias = "Encoding")]
    pub encoding: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Css,
    Json,
    #[serde(alias = "reg")]
    Regex,
}

/// Extracts a single scalar value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRule {
    #[serde(rename = "type", alias = "Type")]
    pub rule_type: RuleType,
    #[serde(alias = "expr", alias = "Expr")]
    pub expression: String,
    #[serde(alias = "Key")]
    pub key: String,
    /// Post-filter applied to the css/json result; capture group 1 is kept.
    #[serde(default, alias = "regex", alias = "Regex")]
    pub filter: Option<String>,
}

/// Extracts a list of fragments, each re-scanned with its own item rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRule {
    #[serde(rename = "type", alias = "Type")]
    pub rule_type: RuleType,
    #[serde(alias = "expr", alias = "Expr")]
    pub expression: String,
    #[serde(alias = "Key")]
    pub key: String,
    #[serde(
        default,
        alias = "ItemRules",
        alias = "itemRules",
        deserialize_with = "null_as_default"
    )]
    pub item_rules: Vec<ItemRule>,
}

/// Post-step assertion on one extracted key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Check {
    #[serde(alias = "Key")]
    pub key: String,
    #[serde(default, alias = "value", alias = "Value")]
    pub expected_value: String,
    #[serde(default, alias = "is_const", alias = "IsConst", alias = "isConst")]
    pub is_constant: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseSpec {
    #[serde(default, alias = "Extract")]
    pub extract: bool,
    #[serde(default, alias = "Scope")]
    pub scope: Option<String>,
    #[serde(default, alias = "Encoding")]
    pub encoding: String,
    #[serde(
        default,
        alias = "ItemRules",
        alias = "itemRules",
        deserialize_with = "null_as_default"
    )]
    pub item_rules: Vec<ItemRule>,
    #[serde(
        default,
        alias = "CollectionRules",
        alias = "collectionRules",
        deserialize_with = "null_as_default"
    )]
    pub collection_rules: Vec<CollectionRule>,
    #[serde(default, alias = "Check")]
    pub check: Option<Check>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(alias = "Key")]
    pub key: String,
    #[serde(default, alias = "Value")]
    pub value: String,
}

impl Parameter {
    pub fn constant(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            is_constant: true,
        }
    }

    pub fn from_context(key: &str, context_key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: context_key.to_string(),
            is_constant: false,
        }
    }
}

impl Task {
    /// Stable sort by `order`; steps without an order come first.
    pub fn sort_steps(&mut self) {
        self.steps.sort_by_key(|step| step.order);
    }
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Css => "css",
            RuleType::Json => "json",
            RuleType::Regex => "regex",
        }
    }
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(order: Option<i64>, url: &str) -> Step {
        Step {
            order,
            input: RequestSpec {
                url: url.to_string(),
                ..Default::default()
            },
            output: ResponseSpec::default(),
        }
    }

    #[test]
    fn test_sort_steps_missing_order_first() {
        let mut task = Task {
            name: "t".to_string(),
            steps: vec![
                step(Some(2), "b"),
                step(None, "first"),
                step(Some(1), "a"),
                step(Some(2), "c"),
            ],
        };
        task.sort_steps();

        let urls: Vec<&str> = task.steps.iter().map(|s| s.input.url.as_str()).collect();
        assert_eq!(urls, vec!["first", "a", "b", "c"]);
    }

    #[test]
    fn test_legacy_field_aliases() {
        let json = r#"{
            "sort": 3,
            "input": {
                "url": "http://h/{id}",
                "url_params": {"{id}": "user_id"},
                "params": [{"key": "q", "value": "x", "is_const": true}]
            },
            "output": {
                "extract": true,
                "item_rules": [{"type": "reg", "expr": "id=(\\d+)", "key": "id"}],
                "check": {"key": "id", "value": "7", "is_const": true}
            }
        }"#;

        let step: Step = serde_json::from_str(json).unwrap();
        assert_eq!(step.order, Some(3));
        assert_eq!(step.input.url_substitutions.get("{id}").unwrap(), "user_id");
        assert_eq!(step.input.parameters[0], Parameter::constant("q", "x"));
        assert_eq!(step.output.item_rules[0].rule_type, RuleType::Regex);
        assert_eq!(step.output.item_rules[0].expression, "id=(\\d+)");
        let check = step.output.check.unwrap();
        assert_eq!(check.expected_value, "7");
        assert!(check.is_constant);
    }

    #[test]
    fn test_pascal_case_step() {
        let json = r#"{
            "Sort": 1,
            "Input": {
                "Url": "http://h/{id}",
                "UrlParams": {"{id}": "user_id"},
                "Method": "POST",
                "Headers": null,
                "Params": [{"Key": "q", "Value": "x", "IsConst": true}],
                "TemplatePath": "",
                "Encoding": "gbk"
            },
            "Output": {
                "Extract": true,
                "Scope": "",
                "ItemRules": [{"Type": "css", "Expr": "h1", "Key": "title", "Regex": "(\\w+)"}],
                "CollectionRules": [
                    {"Type": "json", "Expr": "rows", "Key": "rows", "ItemRules": null}
                ],
                "Check": {"Key": "title", "Value": "ok", "IsConst": true}
            }
        }"#;

        let step: Step = serde_json::from_str(json).unwrap();
        assert_eq!(step.order, Some(1));
        assert_eq!(step.input.url, "http://h/{id}");
        assert_eq!(step.input.url_substitutions["{id}"], "user_id");
        assert!(step.input.headers.is_empty());
        assert_eq!(step.input.parameters[0], Parameter::constant("q", "x"));
        assert_eq!(step.input.template_path, None);
        assert_eq!(step.input.encoding, "gbk");
        assert_eq!(step.output.item_rules[0].filter.as_deref(), Some("(\\w+)"));
        assert!(step.output.collection_rules[0].item_rules.is_empty());
        assert!(step.output.check.unwrap().is_constant);
    }

    #[test]
    fn test_camel_case_and_null_output() {
        let json = r#"{
            "input": {"url": "http://h", "urlParams": {"{a}": "a"}, "templatePath": "body.txt",
                      "params": [{"key": "k", "value": "v", "isConst": true}]},
            "output": null
        }"#;

        let step: Step = serde_json::from_str(json).unwrap();
        assert_eq!(step.order, None);
        assert_eq!(step.input.url_substitutions["{a}"], "a");
        assert_eq!(step.input.template_path.as_deref(), Some("body.txt"));
        assert!(step.input.parameters[0].is_constant);
        assert!(!step.output.extract);
    }

    #[test]
    fn test_rule_type_display() {
        assert_eq!(RuleType::Css.to_string(), "css");
        assert_eq!(RuleType::Regex.to_string(), "regex");
    }
}
