use serde_json::Value;
use thiserror::Error;

const CODE_MARKER: &str = "\"code\":\"";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("empty response body")]
    EmptyBody,
    #[error("no status code in response body")]
    MissingCode,
}

/// Extract the status `code` from a Magic Link API response body.
///
/// The body is parsed as JSON and the top-level `code` string is returned. When the body is
/// not JSON or carries no such field, the raw text is searched for `"code":"<value>"` instead.
///
/// # Errors
/// Returns `ExtractError` if neither path finds a code.
pub fn extract_code(body: &str) -> Result<String, ExtractError> {
    if body.trim().is_empty() {
        return Err(ExtractError::EmptyBody);
    }

    if let Some(code) = structured_code(body) {
        return Ok(code);
    }

    scan_code(body).ok_or(ExtractError::MissingCode)
}

fn structured_code(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("code")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn scan_code(body: &str) -> Option<String> {
    let start = body.find(CODE_MARKER)? + CODE_MARKER.len();
    let len = body[start..].find('"')?;
    Some(body[start..start + len].to_string())
}
