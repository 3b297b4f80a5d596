//! Parsing of model completions that are expected to hold a JSON document.

use thiserror::Error;

/// Message reported for every completion that is not valid JSON.
///
/// Kept verbatim for compatibility with existing consumers of this tool's
/// error output; the cause is any JSON syntax failure, not only size.
pub const PARSE_FAILURE_MESSAGE: &str = "Context too big. Unable to parse jobs.";

/// A completion could not be parsed as JSON.
#[derive(Debug, Error)]
#[error("{}", PARSE_FAILURE_MESSAGE)]
pub struct ParseError {
    #[source]
    source: serde_json::Error,
}

impl ParseError {
    /// Returns the underlying syntax error.
    pub fn cause(&self) -> &serde_json::Error {
        &self.source
    }
}

/// Parses a completion into a JSON value.
///
/// The trimmed completion is parsed as-is first. If that fails and the text
/// contains a Markdown code fence (```` ```json ```` or bare ```` ``` ````),
/// the body of the first fence is parsed instead, so a short preamble before
/// the fence is tolerated.
///
/// # Examples
///
/// ```
/// use postags::response::parse_json_response;
///
/// let value = parse_json_response("```json\n{\"tags\": [\"Hiring\"]}\n```").unwrap();
/// assert_eq!(value["tags"][0], "Hiring");
///
/// let err = parse_json_response("Sure! Here are your tags.").unwrap_err();
/// assert_eq!(err.to_string(), "Context too big. Unable to parse jobs.");
/// ```
pub fn parse_json_response(completion: &str) -> Result<serde_json::Value, ParseError> {
    let text = completion.trim();
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(source) => fenced_body(text)
            .and_then(|body| serde_json::from_str(body).ok())
            .ok_or(ParseError { source }),
    }
}

/// Returns the body of the first Markdown code fence in `text`.
fn fenced_body(text: &str) -> Option<&str> {
    let start = text.find("```")? + 3;
    let rest = &text[start..];

    // Drop the info string on the opening fence, if any
    let body = match rest.strip_prefix("json") {
        Some(after) => after,
        None => match rest.find('\n') {
            Some(newline) if rest[..newline].trim().chars().all(char::is_alphanumeric) => {
                &rest[newline + 1..]
            }
            _ => rest,
        },
    };

    let end = body.find("```")?;
    Some(body[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_object() {
        let value = parse_json_response(r#"{"line_count": 3}"#).unwrap();
        assert_eq!(value["line_count"], 3);
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let value = parse_json_response("\n\n  {\"a\": 1}  \n").unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn strips_json_code_fence() {
        let value = parse_json_response("```json\n{\"a\": \"b\"}\n```").unwrap();
        assert_eq!(value["a"], "b");
    }

    #[test]
    fn strips_bare_code_fence() {
        let value = parse_json_response("```\n[1, 2]\n```").unwrap();
        assert_eq!(value[1], 2);
    }

    #[test]
    fn rejects_preamble_text() {
        let err = parse_json_response("Here is the JSON: {\"a\": 1}").unwrap_err();
        assert_eq!(err.to_string(), PARSE_FAILURE_MESSAGE);
    }

    #[test]
    fn rejects_truncated_json_and_keeps_cause() {
        let err = parse_json_response(r#"{"tags": ["Hiring", "#).unwrap_err();
        assert!(err.cause().is_eof());
    }

    #[test]
    fn finds_fence_after_preamble() {
        let value = parse_json_response("Here is the JSON:\n```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn strips_single_line_fence() {
        let value = parse_json_response("```json{\"a\": 1}```").unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn ignores_text_after_closing_fence() {
        let value = parse_json_response("```\n{\"tags\": []}\n```\nLet me know if you need more.")
            .unwrap();
        assert_eq!(value["tags"], serde_json::json!([]));
    }

    #[test]
    fn invalid_fenced_body_reports_parse_failure() {
        let err = parse_json_response("Result:\n```json\n{not json}\n```").unwrap_err();
        assert_eq!(err.to_string(), PARSE_FAILURE_MESSAGE);
    }

    #[test]
    fn unterminated_fence_is_not_stripped() {
        assert!(parse_json_response("```json\n{\"a\": 1}").is_err());
    }
}
