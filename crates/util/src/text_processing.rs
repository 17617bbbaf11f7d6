//! # Text Processing Utilities
//!
//! Helpers that keep diagnostic output safe and readable: secret redaction for anything
//! that may end up in traces, and truncation for large generated payloads.

use once_cell::sync::Lazy;
use regex::Regex;

const REDACTED: &str = "[REDACTED]";

/// Redacts values that look like secrets in a string.
///
/// Key names are preserved so the redacted text stays useful for debugging.
///
/// # Example
/// ```rust
/// use agentflow_util::redact_sensitive;
///
/// let redacted = redact_sensitive("GEMINI_API_KEY=abc123 TOKEN=xyz789");
/// assert_eq!(redacted, "GEMINI_API_KEY=[REDACTED] TOKEN=[REDACTED]");
///
/// let redacted = redact_sensitive("Authorization: Bearer secret123");
/// assert_eq!(redacted, "Authorization: [REDACTED]");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in REDACT_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                let suffix = captures.get(3).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}{REDACTED}{suffix}")
            })
            .to_string();
    }
    redacted
}

static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(build_redact_patterns);

/// Ordered from most specific to most general.
fn build_redact_patterns() -> Vec<Regex> {
    [
        r"(?i)(authorization:\s+)([^\r\n]+)()",
        r"(?i)((?:^|\b)Bearer\s+)([A-Za-z0-9\-._~+/]+=*)()",
        r"(?i)([?&]key=)([^&\s]+)()",
        r#"(?i)("(?:api_?key|token|secret|password)"\s*:\s*")([^"]*)(")"#,
        r"(?i)(\b[A-Z0-9_]*(?:KEY|TOKEN|SECRET|PASSWORD)=)([^\s&]+)()",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
}

/// Shortens `input` to at most `max_chars` characters, appending an ellipsis when cut.
pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let mut characters = input.chars();
    let prefix: String = characters.by_ref().take(max_chars).collect();
    if characters.next().is_some() { format!("{prefix}…") } else { prefix }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_query_string_keys() {
        let url = "https://example.com/v1beta/models/m:generateContent?key=AIzaSecret&alt=json";
        assert_eq!(
            redact_sensitive(url),
            "https://example.com/v1beta/models/m:generateContent?key=[REDACTED]&alt=json"
        );
    }

    #[test]
    fn redacts_json_secret_fields() {
        let body = r#"{"api_key": "abc", "name": "demo"}"#;
        assert_eq!(redact_sensitive(body), r#"{"api_key": "[REDACTED]", "name": "demo"}"#);
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        let text = "Filter condition met. Continuing branch.";
        assert_eq!(redact_sensitive(text), text);
    }

    #[test]
    fn truncates_on_character_boundaries() {
        assert_eq!(truncate_for_log("héllo wörld", 5), "héllo…");
        assert_eq!(truncate_for_log("short", 10), "short");
    }
}
