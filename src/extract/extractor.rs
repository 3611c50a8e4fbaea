// ABOUTME: Rule-driven extraction of scalar values and collections from a response body
// ABOUTME: Applies scope narrowing, item rules with filters, then collection rules

use tracing::{debug, warn};

use super::document::Document;
use super::error::Result;
use super::pattern::first_capture;
use crate::engine::{Fields, OutputValue, StepOutput};
use crate::parser::{CollectionRule, ItemRule, ResponseSpec, RuleType};

/// Output key used when extraction is disabled.
pub const RAW_BODY_KEY: &str = "body";

pub struct ResponseExtractor<'s> {
    spec: &'s ResponseSpec,
}

impl<'s> ResponseExtractor<'s> {
    pub fn new(spec: &'s ResponseSpec) -> Self {
        Self { spec }
    }

    /// Produce the step output for an already decoded body.
    pub fn extract(&self, body: &str) -> StepOutput {
        let mut output = StepOutput::new();

        if !self.spec.extract {
            output.insert(RAW_BODY_KEY.to_string(), OutputValue::from(body));
            return output;
        }
        if body.is_empty() {
            debug!("Empty body, nothing to extract");
            return output;
        }

        let working = self.narrow(body);
        let document = Document::new(working);

        for (key, value) in apply_item_rules(&document, &self.spec.item_rules) {
            output.insert(key, OutputValue::Scalar(value));
        }

        for rule in &self.spec.collection_rules {
            match extract_collection(&document, rule) {
                Ok(Some(rows)) => {
                    output.insert(rule.key.clone(), OutputValue::Group(rows));
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping collection '{}': {}", rule.key, e),
            }
        }

        output
    }

    fn narrow<'b>(&self, body: &'b str) -> &'b str {
        let Some(ref scope) = self.spec.scope else {
            return body;
        };
        if scope.is_empty() {
            return body;
        }
        match scope_range(scope, body) {
            Some((start, end)) => &body[start..end],
            None => {
                debug!("Scope '{}' did not match, using full body", scope);
                body
            }
        }
    }
}

/// Byte range of the scope match: group 1, or the whole match.
fn scope_range(pattern: &str, body: &str) -> Option<(usize, usize)> {
    let regex = match regex::Regex::new(pattern) {
        Ok(regex) => regex,
        Err(e) => {
            warn!("Invalid scope pattern '{}': {}", pattern, e);
            return None;
        }
    };
    let captures = regex.captures(body)?;
    let m = captures.get(1).or_else(|| captures.get(0))?;
    Some((m.start(), m.end()))
}

/// Run item rules in order. A context failure ends the pass and keeps what
/// was extracted so far.
fn apply_item_rules(document: &Document<'_>, rules: &[ItemRule]) -> Fields {
    let mut fields = Fields::new();
    for rule in rules {
        match extract_item(document, rule) {
            Ok(value) => {
                fields.insert(rule.key.clone(), value);
            }
            Err(e) => {
                warn!("Stopping item rules at '{}': {}", rule.key, e);
                break;
            }
        }
    }
    fields
}

fn extract_item(document: &Document<'_>, rule: &ItemRule) -> Result<String> {
    let value = match rule.rule_type {
        RuleType::Css => document.css_text(&rule.expression)?,
        RuleType::Json => document.json_text(&rule.expression)?,
        RuleType::Regex => {
            return Ok(first_capture(&rule.expression, document.text()).unwrap_or_default())
        }
    };

    Ok(match rule.filter.as_deref() {
        Some(filter) if !filter.is_empty() => first_capture(filter, &value).unwrap_or_default(),
        _ => value,
    })
}

/// `None` for rule types that do not produce collections.
fn extract_collection(document: &Document<'_>, rule: &CollectionRule) -> Result<Option<Vec<Fields>>> {
    let fragments = match rule.rule_type {
        RuleType::Css => document.css_fragments(&rule.expression)?,
        RuleType::Json => document.json_fragments(&rule.expression)?,
        RuleType::Regex => {
            debug!("Regex collection rule '{}' ignored", rule.key);
            return Ok(None);
        }
    };

    let rows = fragments
        .iter()
        .map(|fragment| apply_item_rules(&Document::new(fragment), &rule.item_rules))
        .collect();
    Ok(Some(rows))
}
