// ABOUTME: Per-run context store of accumulated string facts
// ABOUTME: Seeded from preset arguments and grown by each step's scalar outputs

use std::collections::HashMap;

use super::result::{OutputValue, StepOutput};
use crate::parser::{KeyValue, Parameter};

/// Mutable key/value store owned by a single task run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    values: HashMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from preset arguments; later duplicates overwrite earlier ones.
    pub fn seeded(presets: &[KeyValue]) -> Self {
        let mut context = Self::new();
        for preset in presets {
            context.insert(preset.key.clone(), preset.value.clone());
        }
        context
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: String, value: String) {
        self.values.insert(key, value);
    }

    pub fn extend<I: IntoIterator<Item = (String, String)>>(&mut self, entries: I) {
        self.values.extend(entries);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Constant parameters never consult the context; absent keys resolve to "".
    pub fn resolve(&self, parameter: &Parameter) -> String {
        if parameter.is_constant {
            parameter.value.clone()
        } else {
            self.get(&parameter.value).unwrap_or_default().to_string()
        }
    }

    /// Fold the scalar outputs of a step. Groups never reach the context.
    pub fn absorb(&mut self, output: &StepOutput) {
        for (key, value) in output {
            if let OutputValue::Scalar(text) = value {
                self.values.insert(key.clone(), text.clone());
            }
        }
    }

    /// Template variables: context merged with resolved parameters, parameters win.
    pub fn merged_with(&self, parameters: &[Parameter]) -> HashMap<String, String> {
        let mut merged = self.values.clone();
        for parameter in parameters {
            merged.insert(parameter.key.clone(), self.resolve(parameter));
        }
        merged
    }

    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn test_seeded_from_presets() {
        let presets = vec![
            KeyValue {
                key: "user".to_string(),
                value: "alice".to_string(),
            },
            KeyValue {
                key: "user".to_string(),
                value: "bob".to_string(),
            },
        ];
        let context = Context::seeded(&presets);
        assert_eq!(context.get("user"), Some("bob"));
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn test_resolve_constant_ignores_context() {
        let mut context = Context::new();
        context.insert("literal".to_string(), "from-context".to_string());

        assert_eq!(context.resolve(&Parameter::constant("k", "literal")), "literal");
        assert_eq!(
            context.resolve(&Parameter::from_context("k", "literal")),
            "from-context"
        );
        assert_eq!(context.resolve(&Parameter::from_context("k", "absent")), "");
    }

    #[test]
    fn test_absorb_only_scalars() {
        let mut output: StepOutput = IndexMap::new();
        output.insert("token".to_string(), OutputValue::Scalar("abc".to_string()));
        output.insert("rows".to_string(), OutputValue::Group(vec![IndexMap::new()]));

        let mut context = Context::new();
        context.insert("token".to_string(), "old".to_string());
        context.absorb(&output);

        assert_eq!(context.get("token"), Some("abc"));
        assert!(!context.contains("rows"));
    }

    #[test]
    fn test_merged_with_parameters_take_precedence() {
        let mut context = Context::new();
        context.insert("name".to_string(), "ctx".to_string());
        context.insert("session".to_string(), "s1".to_string());

        let merged = context.merged_with(&[
            Parameter::constant("name", "param"),
            Parameter::from_context("sid", "session"),
        ]);

        assert_eq!(merged.get("name").unwrap(), "param");
        assert_eq!(merged.get("sid").unwrap(), "s1");
        assert_eq!(merged.get("session").unwrap(), "s1");
    }
}
