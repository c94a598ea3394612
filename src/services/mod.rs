//! Backing services attached to an invocation.

pub mod mongo;

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::config::RuntimeEnv;
use crate::core::parameters::Parameters;
use crate::errors::StatusCodeError;

pub use mongo::MongoService;

/// Parameter group the database credentials are read from.
pub const DEFAULT_MONGO_GROUP: &str = "defaultMongo";

/// Used when neither the parameters nor `MONGO_DOMAIN` name a host.
pub const DEFAULT_MONGO_DOMAIN: &str = "localhost:27017";

/// Everything a database factory needs to build a client.
#[derive(Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub env: String,
    pub region: String,
    pub domain: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub replica_set: Option<String>,
    pub db: String,
}

impl std::fmt::Debug for DbSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbSettings")
            .field("env", &self.env)
            .field("region", &self.region)
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("replica_set", &self.replica_set)
            .field("db", &self.db)
            .finish()
    }
}

impl DbSettings {
    /// Read `defaultMongo.*` entries from the resolved parameters.
    #[must_use]
    pub fn from_parameters(params: &Parameters, env: &RuntimeEnv, db: &str) -> Self {
        let lookup = |field: &str| {
            params
                .get(&format!("{DEFAULT_MONGO_GROUP}.{field}"))
                .map(ToString::to_string)
        };

        Self {
            env: env.environment.clone(),
            region: env.region.clone(),
            domain: lookup("domain")
                .or_else(|| env.mongo_domain.clone())
                .unwrap_or_else(|| DEFAULT_MONGO_DOMAIN.to_string()),
            username: lookup("username"),
            password: lookup("password"),
            replica_set: lookup("replicaSet"),
            db: db.to_string(),
        }
    }
}

/// A database client whose connection is owned by one invocation.
#[async_trait]
pub trait DbService: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    async fn connect(&mut self) -> Result<(), StatusCodeError>;

    /// # Errors
    ///
    /// Returns an error if the connection cannot be closed cleanly.
    async fn disconnect(&mut self) -> Result<(), StatusCodeError>;

    /// Typed access for business logic, see [`ServiceSet::db_as`].
    fn as_any(&self) -> &dyn Any;
}

/// Builds an unconnected [`DbService`] from settings.
pub trait DbServiceFactory: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the settings are unusable.
    fn create(&self, settings: DbSettings) -> Result<Box<dyn DbService>, StatusCodeError>;
}

impl<F> DbServiceFactory for F
where
    F: Fn(DbSettings) -> Result<Box<dyn DbService>, StatusCodeError> + Send + Sync,
{
    fn create(&self, settings: DbSettings) -> Result<Box<dyn DbService>, StatusCodeError> {
        self(settings)
    }
}

/// Services attached for a single invocation.
#[derive(Default)]
pub struct ServiceSet {
    db: Option<Box<dyn DbService>>,
    extra: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl ServiceSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_db(&mut self, db: Box<dyn DbService>) {
        self.db = Some(db);
    }

    #[must_use]
    pub fn has_db(&self) -> bool {
        self.db.is_some()
    }

    pub fn db_mut(&mut self) -> Option<&mut (dyn DbService + 'static)> {
        self.db.as_deref_mut()
    }

    /// The database service downcast to its concrete type.
    #[must_use]
    pub fn db_as<T: 'static>(&self) -> Option<&T> {
        self.db.as_ref().and_then(|db| db.as_any().downcast_ref::<T>())
    }

    /// Remove the database service, leaving the slot empty.
    pub fn take_db(&mut self) -> Option<Box<dyn DbService>> {
        self.db.take()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, service: Arc<T>) {
        self.extra.insert(name.into(), service);
    }

    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.extra
            .get(name)
            .cloned()
            .and_then(|service| service.downcast::<T>().ok())
    }
}

impl std::fmt::Debug for ServiceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSet")
            .field("db", &self.db.is_some())
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_parameters() {
        let params: Parameters = [
            ("defaultMongo.username", "reporter"),
            ("defaultMongo.password", "secret"),
            ("defaultMongo.replicaSet", "rs0"),
        ]
        .into_iter()
        .collect();
        let env = RuntimeEnv::new("test", "local");

        let settings = DbSettings::from_parameters(&params, &env, "bank_db");
        assert_eq!(settings.username.as_deref(), Some("reporter"));
        assert_eq!(settings.password.as_deref(), Some("secret"));
        assert_eq!(settings.replica_set.as_deref(), Some("rs0"));
        assert_eq!(settings.domain, DEFAULT_MONGO_DOMAIN);
        assert_eq!(settings.db, "bank_db");
    }

    #[test]
    fn test_settings_domain_prefers_parameter_over_env() {
        let params: Parameters = [("defaultMongo.domain", "db.internal:27017")]
            .into_iter()
            .collect();
        let mut env = RuntimeEnv::new("test", "local");
        env.mongo_domain = Some("fallback:27017".to_string());

        let settings = DbSettings::from_parameters(&params, &env, "bank_db");
        assert_eq!(settings.domain, "db.internal:27017");

        let settings = DbSettings::from_parameters(&Parameters::default(), &env, "bank_db");
        assert_eq!(settings.domain, "fallback:27017");
    }

    #[test]
    fn test_settings_debug_hides_password() {
        let params: Parameters = [("defaultMongo.password", "hunter2")].into_iter().collect();
        let settings =
            DbSettings::from_parameters(&params, &RuntimeEnv::new("test", "local"), "bank_db");
        assert!(!format!("{settings:?}").contains("hunter2"));
    }

    #[test]
    fn test_extra_services_are_typed() {
        let mut services = ServiceSet::new();
        services.insert("bucket", Arc::new(String::from("reports")));

        assert_eq!(services.get::<String>("bucket").as_deref().map(String::as_str), Some("reports"));
        assert!(services.get::<u32>("bucket").is_none());
        assert!(services.get::<String>("missing").is_none());
        assert!(!services.has_db());
    }
}
