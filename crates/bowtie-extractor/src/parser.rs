//! Parse raw provider output into a JSON document

use crate::error::ParseError;
use serde_json::Value;

/// Parse a raw response as exactly one JSON document
///
/// Surrounding whitespace is ignored, and so is a single markdown code fence
/// (optionally tagged `json`) wrapping the whole response. Any other text
/// before or after the document is rejected; no attempt is made to dig a
/// JSON object out of prose.
pub fn parse_response(raw: &str) -> Result<Value, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let body = if trimmed.starts_with("```") {
        unwrap_fence(trimmed)?
    } else {
        trimmed
    };

    Ok(serde_json::from_str(body)?)
}

/// Inner text of a response that is one fenced block
fn unwrap_fence(text: &str) -> Result<&str, ParseError> {
    let (opening, rest) = text.split_once('\n').ok_or(ParseError::Fence)?;
    let tag = opening.trim_start_matches('`').trim();
    if !(tag.is_empty() || tag.eq_ignore_ascii_case("json")) {
        return Err(ParseError::Fence);
    }

    let inner = rest.trim_end().strip_suffix("```").ok_or(ParseError::Fence)?;
    if inner.contains("```") {
        return Err(ParseError::Fence);
    }
    Ok(inner.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        assert_eq!(parse_response(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(parse_response("\n  {\"a\": 1}\n\n").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_markdown_fenced_json() {
        assert_eq!(parse_response("```json\n{\"a\": 1}\n```").unwrap(), json!({"a": 1}));
        assert_eq!(parse_response("```\n{\"a\": 1}\n```\n").unwrap(), json!({"a": 1}));
        assert_eq!(parse_response("```JSON\n{\"a\": 1}```").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_prose_is_rejected() {
        assert!(matches!(
            parse_response("Here is the result:\n{\"a\": 1}"),
            Err(ParseError::Json(_))
        ));
        assert!(matches!(
            parse_response("{\"a\": 1}\nLet me know if you need anything else."),
            Err(ParseError::Json(_))
        ));
        assert!(matches!(
            parse_response("Sure!\n```json\n{\"a\": 1}\n```"),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn test_malformed_fences_are_rejected() {
        assert!(matches!(parse_response("```json\n{\"a\": 1}"), Err(ParseError::Fence)));
        assert!(matches!(parse_response("```python\n{\"a\": 1}\n```"), Err(ParseError::Fence)));
        assert!(matches!(
            parse_response("```json\n{\"a\": 1}\n```\nmore\n```json\n{}\n```"),
            Err(ParseError::Fence)
        ));
        assert!(matches!(parse_response("```json {\"a\": 1} ```"), Err(ParseError::Fence)));
    }

    #[test]
    fn test_empty_and_truncated() {
        assert!(matches!(parse_response("   \n"), Err(ParseError::Empty)));
        assert!(matches!(parse_response("{\"a\": [1, 2"), Err(ParseError::Json(_))));
    }

    #[test]
    fn test_two_documents_are_rejected() {
        assert!(parse_response("{\"a\": 1} {\"b\": 2}").is_err());
    }
}
