//! Lambda request lifecycle and response shaping

pub mod lifecycle;
pub mod response;

// Re-export the runner surface for convenience
pub use lifecycle::{Invocation, LambdaHandler, LifecycleRunner, Phase, serve};
