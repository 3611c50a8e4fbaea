// ABOUTME: Tagged output values and the accumulated result of a task run
// ABOUTME: Scalars flow back into the context, groups only into the result

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Values extracted for one collection fragment.
pub type Fields = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputValue {
    Scalar(String),
    Group(Vec<Fields>),
}

/// Output mapping of a single step.
pub type StepOutput = IndexMap<String, OutputValue>;

/// Result of a whole run; serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskOutput {
    values: IndexMap<String, OutputValue>,
}

impl OutputValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            OutputValue::Scalar(text) => Some(text),
            OutputValue::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&[Fields]> {
        match self {
            OutputValue::Group(rows) => Some(rows),
            OutputValue::Scalar(_) => None,
        }
    }
}

impl From<String> for OutputValue {
    fn from(value: String) -> Self {
        OutputValue::Scalar(value)
    }
}

impl From<&str> for OutputValue {
    fn from(value: &str) -> Self {
        OutputValue::Scalar(value.to_string())
    }
}

impl TaskOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites keys already present.
    pub fn merge_step(&mut self, output: StepOutput) {
        self.values.extend(output);
    }

    pub fn get(&self, key: &str) -> Option<&OutputValue> {
        self.values.get(key)
    }

    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(OutputValue::as_scalar)
    }

    pub fn group(&self, key: &str) -> Option<&[Fields]> {
        self.get(key).and_then(OutputValue::as_group)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn into_inner(self) -> IndexMap<String, OutputValue> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_step_overwrites() {
        let mut result = TaskOutput::new();
        let mut first = StepOutput::new();
        first.insert("token".to_string(), "a".into());
        result.merge_step(first);

        let mut second = StepOutput::new();
        second.insert("token".to_string(), "b".into());
        second.insert("items".to_string(), OutputValue::Group(Vec::new()));
        result.merge_step(second);

        assert_eq!(result.len(), 2);
        assert_eq!(result.scalar("token"), Some("b"));
        assert_eq!(result.group("items").map(|g| g.len()), Some(0));
        assert!(result.scalar("items").is_none());
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let mut row = Fields::new();
        row.insert("title".to_string(), "first".to_string());

        let mut step = StepOutput::new();
        step.insert("user".to_string(), "alice".into());
        step.insert("posts".to_string(), OutputValue::Group(vec![row]));

        let mut result = TaskOutput::new();
        result.merge_step(step);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({"user": "alice", "posts": [{"title": "first"}]})
        );
    }
}
