// ABOUTME: Regular expression helpers shared by regex rules, filters and scopes
// ABOUTME: First match wins; capture group 1 is preferred over the whole match

use regex::Regex;
use tracing::warn;

/// First capture group of the first match, or the whole match when the
/// pattern has no groups. `None` on a miss or an invalid pattern.
pub fn first_capture(pattern: &str, text: &str) -> Option<String> {
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(e) => {
            warn!("Invalid pattern '{}': {}", pattern, e);
            return None;
        }
    };

    let captures = regex.captures(text)?;
    captures
        .get(1)
        .or_else(|| captures.get(0))
        .map(|m| m.as_str().to_string())
}
