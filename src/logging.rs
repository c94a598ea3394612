//! Structured logging for Lambda invocations.

use serde_json::{Value, json};
use tracing::Span;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// The filter is taken from `RUST_LOG` and defaults to `info`. Call it once at
/// the start of the binary, before handing control to the Lambda runtime.
///
/// # Example
///
/// ```
/// lifecycle::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Build the per-invocation logger. Every event recorded inside the span
/// carries the service name and request id.
#[must_use]
pub fn create_logger(service: &str, request_id: &str) -> Span {
    tracing::info_span!("invocation", service = %service, request_id = %request_id)
}

/// Render an error and its cause chain as a JSON value suitable for a log field.
#[must_use]
pub fn stringifiable_error(error: &(dyn std::error::Error + 'static)) -> Value {
    let mut causes = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }

    json!({
        "message": error.to_string(),
        "causes": causes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_stringifiable_error_includes_causes() {
        let err = Outer(std::io::Error::other("disk gone"));
        let value = stringifiable_error(&err);
        assert_eq!(value["message"], "outer");
        assert_eq!(value["causes"], json!(["disk gone"]));
    }

    #[test]
    fn test_stringifiable_error_without_source() {
        let err = std::io::Error::other("plain");
        let value = stringifiable_error(&err);
        assert_eq!(value["message"], "plain");
        assert_eq!(value["causes"], json!([]));
    }
}
