//! Lifecycle - a shared request lifecycle for MongoDB-backed AWS Lambda functions.
//!
//! Every Lambda built on this crate runs the same sequence per invocation:
//! 1. Attach a logger and validate the runtime environment
//! 2. Load secrets and settings from SSM Parameter Store
//! 3. Create the MongoDB service (plus any handler-specific services) and connect it
//! 4. Run the handler's business logic
//! 5. Answer with `{ statusCode, body }`, then disconnect the database
//!
//! # Architecture
//!
//! The system uses:
//! - AWS Lambda for serverless execution
//! - SSM Parameter Store for credentials, scoped by environment
//! - the official `mongodb` driver for database access
//! - Tokio for async runtime
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use lifecycle::core::config::HandlerConfig;
//! use lifecycle::core::models::InvocationContext;
//! use lifecycle::core::parameters::Parameters;
//! use lifecycle::errors::HandlerError;
//! use lifecycle::handler::{LambdaHandler, LifecycleRunner, serve};
//! use lifecycle::services::{MongoService, ServiceSet};
//!
//! struct Done;
//!
//! #[async_trait]
//! impl LambdaHandler for Done {
//!     type Output = serde_json::Value;
//!
//!     fn name(&self) -> &str {
//!         "done"
//!     }
//!
//!     async fn load_additional_services(
//!         &self,
//!         _params: &Parameters,
//!         _services: &mut ServiceSet,
//!     ) -> Result<(), HandlerError> {
//!         Ok(())
//!     }
//!
//!     async fn handle(
//!         &self,
//!         _request: &InvocationContext,
//!         _params: &Parameters,
//!         _services: &ServiceSet,
//!     ) -> Result<Self::Output, HandlerError> {
//!         Ok(serde_json::json!({ "status": "done" }))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lambda_runtime::Error> {
//!     lifecycle::setup_logging();
//!
//!     let config = HandlerConfig::new("bank_db", ["defaultMongo.username", "defaultMongo.password"])?;
//!     serve(LifecycleRunner::new(config, MongoService::create, Done)).await
//! }
//! ```

pub mod core;
pub mod errors;
pub mod handler;
pub mod logging;
pub mod services;
pub mod utils;

pub use logging::setup_logging;
