use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Span;

use crate::logging::create_logger;

/// One inbound request together with its logger.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub payload: Value,
    pub request_id: String,
    span: Span,
}

impl InvocationContext {
    /// Attach a logger for `service`. A missing request id is replaced by a
    /// fresh UUID so log lines stay correlatable.
    #[must_use]
    pub fn new(payload: Value, request_id: impl Into<String>, service: &str) -> Self {
        let mut request_id = request_id.into();
        if request_id.is_empty() {
            request_id = uuid::Uuid::new_v4().to_string();
        }
        let span = create_logger(service, &request_id);
        Self {
            payload,
            request_id,
            span,
        }
    }

    #[must_use]
    pub fn logger(&self) -> &Span {
        &self.span
    }
}

/// The uniform response emitted for every invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub body: String,
}
