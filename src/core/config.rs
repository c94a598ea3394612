use std::env;

use crate::errors::ConfigError;

pub const DEFAULT_ENVIRONMENT: &str = "test";
pub const DEFAULT_REGION: &str = "local";

/// Settings read from the process environment on every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnv {
    pub environment: String,
    pub region: String,
    pub mongo_domain: Option<String>,
}

impl RuntimeEnv {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string()),
            region: env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            mongo_domain: env::var("MONGO_DOMAIN").ok().filter(|v| !v.trim().is_empty()),
        }
    }

    #[must_use]
    pub fn new(environment: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            region: region.into(),
            mongo_domain: None,
        }
    }

    /// Both the environment name and the region must be present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.environment.trim().is_empty() && !self.region.trim().is_empty()
    }

    /// Parameter-store prefix for this environment, e.g. `/test/`.
    #[must_use]
    pub fn param_prefix(&self) -> String {
        format!("/{}/", self.environment.trim_matches('/'))
    }
}

/// Static settings of one handler: which database it talks to and which
/// parameter-store keys it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    db_name: String,
    keys: Vec<String>,
}

impl HandlerConfig {
    /// # Errors
    ///
    /// Returns an error if `db_name` or any key is blank, or a key is repeated.
    pub fn new<I, S>(db_name: impl Into<String>, keys: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let db_name = db_name.into();
        if db_name.trim().is_empty() {
            return Err(ConfigError::InvalidDbName);
        }

        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if let Some(pos) = keys.iter().position(|k| k.trim().is_empty()) {
            return Err(ConfigError::InvalidKey(pos));
        }
        for (pos, key) in keys.iter().enumerate() {
            if keys[..pos].contains(key) {
                return Err(ConfigError::DuplicateKey(key.clone()));
            }
        }

        Ok(Self { db_name, keys })
    }

    #[must_use]
    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}
