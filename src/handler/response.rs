//! Response builders.

use serde::Serialize;
use tracing::error;

use crate::core::models::Response;
use crate::errors::{HandlerError, StatusCodeError};

/// Returns a 200 OK response with the serialized result as its body.
///
/// # Errors
///
/// Returns an error if the result cannot be serialized to JSON.
pub fn ok<T: Serialize>(result: &T) -> Result<Response, HandlerError> {
    Ok(Response {
        status_code: 200,
        body: serde_json::to_string(result)?,
    })
}

/// Returns a response carrying the error's status code and its diagnoses.
#[must_use]
pub fn failure(err: &StatusCodeError) -> Response {
    let body = serde_json::to_string(err.diagnoses()).unwrap_or_else(|e| {
        error!("Failed to serialize diagnoses: {}", e);
        "[]".to_string()
    });
    Response {
        status_code: err.status_code(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::specs;
    use serde_json::json;

    #[test]
    fn test_ok_serializes_body() {
        let response = ok(&json!({ "status": "done" })).unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"status":"done"}"#);
    }

    #[test]
    fn test_failure_uses_error_status() {
        let err = StatusCodeError::from_spec(specs::INVALID_EVENT);
        let response = failure(&err);
        assert_eq!(response.status_code, 400);

        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body[0]["applicationCode"], "InvalidEvent");
        assert!(body[0].get("params").is_none());
    }
}
