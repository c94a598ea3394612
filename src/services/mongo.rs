use std::any::Any;

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, Credential};
use mongodb::{Client, Database};
use serde_json::json;
use tracing::{error, info};

use super::{DbService, DbSettings};
use crate::errors::{StatusCodeError, specs};

/// MongoDB client for one invocation.
///
/// Creation performs no I/O; the client is built and verified in
/// [`DbService::connect`] and shut down in [`DbService::disconnect`].
#[derive(Debug)]
pub struct MongoService {
    settings: DbSettings,
    client: Option<Client>,
}

impl MongoService {
    #[must_use]
    pub fn new(settings: DbSettings) -> Self {
        Self {
            settings,
            client: None,
        }
    }

    /// Factory function usable wherever a [`super::DbServiceFactory`] is expected.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings do not name a database.
    pub fn create(settings: DbSettings) -> Result<Box<dyn DbService>, StatusCodeError> {
        if settings.db.trim().is_empty() {
            return Err(connection_error("database name is empty"));
        }
        Ok(Box::new(Self::new(settings)))
    }

    #[must_use]
    pub fn settings(&self) -> &DbSettings {
        &self.settings
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// The configured database, if connected.
    #[must_use]
    pub fn database(&self) -> Option<Database> {
        self.client
            .as_ref()
            .map(|client| client.database(&self.settings.db))
    }

    async fn client_options(&self) -> Result<ClientOptions, mongodb::error::Error> {
        let uri = format!("mongodb://{}", self.settings.domain);
        let mut options = ClientOptions::parse(uri.as_str()).await?;

        if self.settings.username.is_some() || self.settings.password.is_some() {
            let mut credential = Credential::default();
            credential.username = self.settings.username.clone();
            credential.password = self.settings.password.clone();
            options.credential = Some(credential);
        }
        if let Some(replica_set) = &self.settings.replica_set {
            options.repl_set_name = Some(replica_set.clone());
        }
        options.app_name = Some(format!("lifecycle-{}", self.settings.env));

        Ok(options)
    }
}

fn connection_error(reason: impl std::fmt::Display) -> StatusCodeError {
    StatusCodeError::from_spec(specs::DATABASE_CONNECTION_FAILED)
        .with_params(json!({ "reason": reason.to_string() }))
}

#[async_trait]
impl DbService for MongoService {
    async fn connect(&mut self) -> Result<(), StatusCodeError> {
        if self.client.is_some() {
            return Ok(());
        }

        let options = self.client_options().await.map_err(|e| {
            error!("Invalid MongoDB options: {}", e);
            connection_error(e)
        })?;
        let client = Client::with_options(options).map_err(|e| {
            error!("Failed to build MongoDB client: {}", e);
            connection_error(e)
        })?;

        if let Err(e) = client
            .database(&self.settings.db)
            .run_command(doc! { "ping": 1 })
            .await
        {
            error!("MongoDB ping failed: {}", e);
            client.shutdown().await;
            return Err(connection_error(e));
        }

        info!(
            domain = %self.settings.domain,
            db = %self.settings.db,
            "MongoDB connection established"
        );
        self.client = Some(client);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), StatusCodeError> {
        if let Some(client) = self.client.take() {
            client.shutdown().await;
            info!(db = %self.settings.db, "MongoDB connection closed");
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> DbSettings {
        DbSettings {
            env: "test".to_string(),
            region: "local".to_string(),
            domain: "localhost:27017".to_string(),
            username: Some("reporter".to_string()),
            password: Some("secret".to_string()),
            replica_set: Some("rs0".to_string()),
            db: "bank_db".to_string(),
        }
    }

    #[test]
    fn test_create_performs_no_io() {
        let service = MongoService::new(settings());
        assert!(!service.is_connected());
        assert!(service.database().is_none());
    }

    #[test]
    fn test_create_rejects_empty_db() {
        let mut s = settings();
        s.db = String::new();
        let err = MongoService::create(s).err().unwrap();
        assert!(err.has_code("DatabaseConnectionFailed"));
    }

    #[tokio::test]
    async fn test_client_options_apply_settings() {
        let service = MongoService::new(settings());
        let options = service.client_options().await.unwrap();

        assert_eq!(options.repl_set_name.as_deref(), Some("rs0"));
        let credential = options.credential.unwrap();
        assert_eq!(credential.username.as_deref(), Some("reporter"));
        assert_eq!(options.app_name.as_deref(), Some("lifecycle-test"));
    }

    #[tokio::test]
    async fn test_failed_ping_leaves_no_client_behind() {
        let mut s = settings();
        s.domain = "127.0.0.1:1/?serverSelectionTimeoutMS=200&directConnection=true".to_string();
        s.replica_set = None;
        let mut service = MongoService::new(s);

        let err = service.connect().await.unwrap_err();
        assert!(err.has_code("DatabaseConnectionFailed"));
        assert!(!service.is_connected());
        assert!(service.disconnect().await.is_ok());
    }

    #[tokio::test]
    async fn test_disconnect_without_connect_is_noop() {
        let mut service = MongoService::new(settings());
        assert!(service.disconnect().await.is_ok());
    }
}
