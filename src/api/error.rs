use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Fallback message when the backend payload has no usable shape
const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// The single error taxonomy all presentation code consumes.
///
/// Authorization failures are handled inside the transport (refresh and
/// retry) and only escalate to `SessionExpired` when recovery is
/// impossible. Everything else reaches the caller through one of the
/// other variants; the `Display` string is what the UI shows.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Refresh failed or was impossible. The session has been logged out;
    /// the user must sign in again.
    #[error("Session expired - please sign in again")]
    SessionExpired,

    /// The backend rejected the input. Recoverable by correcting it; no
    /// session impact.
    #[error("{0}")]
    Validation(String),

    /// Network-level failure. Not auto-retried by the core.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Anything that matched none of the known shapes.
    #[error("{0}")]
    Unexpected(String),
}

impl ApiError {
    /// Classify a non-success response, normalizing whatever error shape
    /// the body carries. 401 never reaches this: it is consumed by the
    /// transport's refresh cycle.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let message = normalize_error_body(body);
        match status.as_u16() {
            400 | 422 => ApiError::Validation(message),
            _ => ApiError::Unexpected(message),
        }
    }
}

/// Reduce a raw backend error body to one display string.
///
/// The backend emits a FastAPI-style envelope: the interesting payload
/// usually sits under `detail`, and may be a plain string (business
/// error), a list (field validation problems), or a single object.
pub fn normalize_error_body(body: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        let text = String::from_utf8_lossy(body);
        let text = text.trim();
        if text.is_empty() {
            return GENERIC_ERROR_MESSAGE.to_string();
        }
        return text.to_string();
    };

    let payload = value.get("detail").unwrap_or(&value);
    normalize_error_payload(payload)
}

/// Normalize one error payload:
/// - plain string: used verbatim
/// - list: the message-like field of each element (structural dump when
///   none exists), joined with `", "`
/// - object: its message-like field, else a structural dump
/// - anything else: a generic fallback
pub fn normalize_error_payload(payload: &Value) -> String {
    match payload {
        Value::String(message) => message.clone(),
        Value::Array(items) => items
            .iter()
            .map(element_message)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => message_field(payload).unwrap_or_else(|| payload.to_string()),
        _ => GENERIC_ERROR_MESSAGE.to_string(),
    }
}

fn element_message(item: &Value) -> String {
    match item {
        Value::String(message) => message.clone(),
        Value::Object(_) => message_field(item).unwrap_or_else(|| item.to_string()),
        other => other.to_string(),
    }
}

fn message_field(value: &Value) -> Option<String> {
    value
        .get("msg")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_string_is_used_verbatim() {
        assert_eq!(normalize_error_payload(&json!("bad request")), "bad request");
    }

    #[test]
    fn test_list_joins_message_fields() {
        let payload = json!([
            {"msg": "field x required"},
            {"msg": "field y invalid"}
        ]);
        assert_eq!(
            normalize_error_payload(&payload),
            "field x required, field y invalid"
        );
    }

    #[test]
    fn test_list_element_without_message_dumps_structure() {
        let payload = json!([{"msg": "field x required"}, {"loc": ["body", "rim"]}]);
        assert_eq!(
            normalize_error_payload(&payload),
            r#"field x required, {"loc":["body","rim"]}"#
        );
    }

    #[test]
    fn test_object_uses_message_field() {
        assert_eq!(
            normalize_error_payload(&json!({"message": "quota exceeded"})),
            "quota exceeded"
        );
        assert_eq!(
            normalize_error_payload(&json!({"msg": "quota exceeded"})),
            "quota exceeded"
        );
    }

    #[test]
    fn test_empty_object_dumps_structure_not_empty_string() {
        assert_eq!(normalize_error_payload(&json!({})), "{}");
    }

    #[test]
    fn test_unrecognized_payload_falls_back_to_generic() {
        assert_eq!(normalize_error_payload(&json!(42)), GENERIC_ERROR_MESSAGE);
        assert_eq!(normalize_error_payload(&json!(null)), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_body_with_detail_envelope_is_unwrapped() {
        let body = br#"{"detail": "upload too large"}"#;
        assert_eq!(normalize_error_body(body), "upload too large");
    }

    #[test]
    fn test_non_json_body_is_used_as_text() {
        assert_eq!(normalize_error_body(b"service unavailable"), "service unavailable");
        assert_eq!(normalize_error_body(b"  "), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_validation_statuses_map_to_validation() {
        let err = ApiError::from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            br#"{"detail": [{"msg": "car_file required"}]}"#,
        );
        assert!(matches!(err, ApiError::Validation(ref m) if m == "car_file required"));

        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, b"boom");
        assert!(matches!(err, ApiError::Unexpected(ref m) if m == "boom"));
    }
}
