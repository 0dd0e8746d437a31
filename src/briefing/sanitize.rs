//! Provider Output Sanitizer
//!
//! LLM completions arrive as "JSON, mostly": stray control characters,
//! fullwidth punctuation variants and Markdown code fences all show up
//! in practice despite the prompts forbidding them. The sanitizer
//! normalizes those and parses the result; anything still unparseable
//! is a generation error for the owning section, never silently
//! coerced.

use super::types::Section;
use thiserror::Error;

/// Cap on how much raw provider text a parse error may carry.
const EXCERPT_LIMIT: usize = 500;

/// A sanitized payload that still failed to parse as JSON. Carries a
/// bounded excerpt of the raw text so diagnostics never ship an
/// unbounded provider response.
#[derive(Debug, Error)]
#[error("{section} response is not valid JSON: {source}")]
pub struct SanitizeError {
    pub section: Section,
    pub excerpt: String,
    #[source]
    pub source: serde_json::Error,
}

/// Clean raw completion text: drop C0/C1 control characters, normalize
/// fullwidth corner brackets to their canonical codepoints, strip a
/// surrounding Markdown code fence, trim.
pub fn clean(raw: &str) -> String {
    let normalized: String = raw
        .chars()
        .filter(|c| !is_stripped_control(*c))
        .map(normalize_punctuation)
        .collect();

    strip_code_fence(&normalized).trim().to_string()
}

/// Clean and parse one section payload. On failure, logs the topic for
/// attribution and returns a typed error with a bounded excerpt.
pub fn parse_payload(
    section: Section,
    raw: &str,
    topic: &str,
) -> Result<serde_json::Value, SanitizeError> {
    let cleaned = clean(raw);
    serde_json::from_str(&cleaned).map_err(|source| {
        log::debug!("unparseable {section} payload for topic \"{topic}\"");
        SanitizeError {
            section,
            excerpt: excerpt(raw),
            source,
        }
    })
}

/// Unicode C0 and C1 control characters, including newlines and tabs.
/// JSON strings may not contain raw control characters anyway, so
/// dropping them only ever removes inter-token whitespace or garbage.
fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}')
}

/// Corner brackets map to their canonical codepoints U+300C..U+300F.
fn normalize_punctuation(c: char) -> char {
    match c {
        '「' => '\u{300C}',
        '」' => '\u{300D}',
        '『' => '\u{300E}',
        '』' => '\u{300F}',
        other => other,
    }
}

/// Strip a ``` / ```json fence when the payload is fully fenced.
/// Partial fences are left alone; the JSON parser will reject them
/// with a better error than a half-stripped string would produce.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(inner) = rest.strip_suffix("```") {
            let inner = inner.strip_prefix("json").unwrap_or(inner);
            return inner.trim();
        }
    }
    trimmed
}

fn excerpt(raw: &str) -> String {
    raw.chars().take(EXCERPT_LIMIT).collect()
}
