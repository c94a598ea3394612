use lifecycle::core::models::InvocationContext;
use lifecycle::setup_logging;
use serde_json::json;

#[test]
fn test_logging_setup() {
    // setup_logging installs a global subscriber, so it is only called once here
    let result = std::panic::catch_unwind(|| {
        setup_logging();
    });

    assert!(result.is_ok(), "setup_logging function should not panic");
}

#[test]
fn test_invocation_context_generates_request_id() {
    let request = InvocationContext::new(json!({}), "", "report");
    assert!(!request.request_id.is_empty());

    let request = InvocationContext::new(json!({}), "req-1", "report");
    assert_eq!(request.request_id, "req-1");
}
