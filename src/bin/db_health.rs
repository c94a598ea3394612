//! Lambda entry point for the database health check.
//!
//! ## Environment Variables
//!
//! - `ENVIRONMENT`: parameter-store scope (default: `test`)
//! - `AWS_REGION`: region for SSM (default: `local`)
//! - `MONGO_DOMAIN`: MongoDB host when `defaultMongo.domain` is not stored
//! - `SSM_ENDPOINT_URL`: alternative SSM endpoint for local stacks
//! - `RUST_LOG`: log level (e.g., `info`, `debug`)

use anyhow::anyhow;
use async_trait::async_trait;
use lifecycle::core::config::HandlerConfig;
use lifecycle::core::models::InvocationContext;
use lifecycle::core::parameters::Parameters;
use lifecycle::errors::HandlerError;
use lifecycle::handler::{LambdaHandler, LifecycleRunner, serve};
use lifecycle::services::{MongoService, ServiceSet};
use mongodb::bson::doc;
use serde::Serialize;
use tracing::info;

const DB_NAME: &str = "bank_db";
const KEYS: [&str; 3] = [
    "defaultMongo.username",
    "defaultMongo.password",
    "defaultMongo.replicaSet",
];

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    database: String,
}

struct DbHealth;

#[async_trait]
impl LambdaHandler for DbHealth {
    type Output = Health;

    fn name(&self) -> &str {
        "db-health"
    }

    async fn load_additional_services(
        &self,
        _params: &Parameters,
        _services: &mut ServiceSet,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    async fn handle(
        &self,
        _request: &InvocationContext,
        _params: &Parameters,
        services: &ServiceSet,
    ) -> Result<Self::Output, HandlerError> {
        let db = services
            .db_as::<MongoService>()
            .and_then(MongoService::database)
            .ok_or_else(|| anyhow!("MongoDB service is not connected"))?;

        db.run_command(doc! { "ping": 1 }).await?;
        info!(database = %db.name(), "Database answered ping");

        Ok(Health {
            status: "done",
            database: db.name().to_string(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    lifecycle::setup_logging();

    let config = HandlerConfig::new(DB_NAME, KEYS)?;
    serve(LifecycleRunner::new(config, MongoService::create, DbHealth)).await
}
