// ABOUTME: Lazily parsed view of a response body as HTML or JSON
// ABOUTME: Provides CSS text/fragment selection and dotted JSON path lookup

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::cell::OnceCell;
use tracing::{debug, warn};

use super::error::{ExtractError, Result};

/// A body under extraction. Each parse context is built at most once.
pub struct Document<'a> {
    text: &'a str,
    html: OnceCell<Html>,
    json: OnceCell<std::result::Result<Value, String>>,
}

impl<'a> Document<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            html: OnceCell::new(),
            json: OnceCell::new(),
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    fn html(&self) -> Result<&Html> {
        if self.text.trim().is_empty() {
            return Err(ExtractError::context("html", "empty body"));
        }
        Ok(self.html.get_or_init(|| Html::parse_document(self.text)))
    }

    fn json(&self) -> Result<&Value> {
        if self.text.trim().is_empty() {
            return Err(ExtractError::context("json", "empty body"));
        }
        self.json
            .get_or_init(|| serde_json::from_str(self.text).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|message| ExtractError::context("json", message.clone()))
    }

    /// Concatenated text of every element matching `selector`.
    pub fn css_text(&self, selector: &str) -> Result<String> {
        let html = self.html()?;
        let Some(selector) = parse_selector(selector) else {
            return Ok(String::new());
        };
        Ok(html
            .select(&selector)
            .flat_map(|element| element.text())
            .collect())
    }

    /// Outer HTML of every element matching `selector`, in document order.
    /// Table parts are wrapped in the table markup they need to survive a
    /// re-parse.
    pub fn css_fragments(&self, selector: &str) -> Result<Vec<String>> {
        let html = self.html()?;
        let Some(selector) = parse_selector(selector) else {
            return Ok(Vec::new());
        };
        let fragments: Vec<String> = html.select(&selector).map(fragment_html).collect();
        debug!("Selector matched {} fragments", fragments.len());
        Ok(fragments)
    }

    /// String leaf at `path`; anything else is an empty string.
    pub fn json_text(&self, path: &str) -> Result<String> {
        let root = self.json()?;
        Ok(match lookup(root, path) {
            Some(Value::String(text)) => text.clone(),
            _ => String::new(),
        })
    }

    /// Children of the array or object at `path`.
    pub fn json_fragments(&self, path: &str) -> Result<Vec<String>> {
        let root = self.json()?;
        let children: Vec<&Value> = match lookup(root, path) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Object(map)) => map.values().collect(),
            _ => Vec::new(),
        };
        Ok(children
            .into_iter()
            .map(|child| match child {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect())
    }
}

fn fragment_html(element: ElementRef<'_>) -> String {
    let outer = element.html();
    match element.value().name() {
        "tr" => format!("<table><tbody>{}</tbody></table>", outer),
        "td" | "th" => format!("<table><tbody><tr>{}</tr></tbody></table>", outer),
        "thead" | "tbody" | "tfoot" | "caption" | "colgroup" => {
            format!("<table>{}</table>", outer)
        }
        _ => outer,
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!("Invalid CSS selector '{}': {}", selector, e);
            None
        }
    }
}

/// Dotted path lookup. Numeric segments index arrays; empty segments are ignored.
pub fn lookup<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = root;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
