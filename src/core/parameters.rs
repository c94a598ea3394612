//! Parameter-store access.
//!
//! Handlers name the keys they need (e.g. `defaultMongo.username`); the loader
//! scopes them under the environment prefix, fetches them from the store, and
//! refuses to continue unless every key resolved.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use aws_sdk_ssm::Client as SsmClient;
use aws_sdk_ssm::config::Region;
use serde_json::json;
use tracing::{debug, info};

use crate::errors::{StatusCodeError, specs};

/// `GetParameters` accepts at most this many names per call.
const SSM_BATCH_SIZE: usize = 10;

/// Resolved parameter values keyed by the unprefixed key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(BTreeMap<String, String>);

impl Parameters {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A key-value store of configuration and secrets.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch the given fully-qualified names. Names that do not exist are
    /// simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn get_parameters(
        &self,
        region: &str,
        names: &[String],
    ) -> Result<HashMap<String, String>, StatusCodeError>;
}

/// AWS Systems Manager Parameter Store, read with decryption.
#[derive(Debug, Clone, Default)]
pub struct SsmParameterStore {
    endpoint_url: Option<String>,
}

impl SsmParameterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Honors `SSM_ENDPOINT_URL` when set.
    #[must_use]
    pub fn from_env() -> Self {
        let endpoint_url = std::env::var("SSM_ENDPOINT_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        Self::new().with_endpoint_url(endpoint_url)
    }

    /// Point the client at a non-AWS endpoint, e.g. a local emulator.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: Option<String>) -> Self {
        self.endpoint_url = endpoint_url;
        self
    }

    async fn client(&self, region: &str) -> SsmClient {
        let mut loader = aws_config::from_env().region(Region::new(region.to_string()));
        if let Some(url) = &self.endpoint_url {
            loader = loader.endpoint_url(url.clone());
        }
        let shared = loader.load().await;
        SsmClient::new(&shared)
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get_parameters(
        &self,
        region: &str,
        names: &[String],
    ) -> Result<HashMap<String, String>, StatusCodeError> {
        let client = self.client(region).await;
        let mut values = HashMap::with_capacity(names.len());

        for batch in names.chunks(SSM_BATCH_SIZE) {
            let resp = client
                .get_parameters()
                .set_names(Some(batch.to_vec()))
                .with_decryption(true)
                .send()
                .await
                .map_err(|e| {
                    StatusCodeError::from_spec(specs::FAILED_TO_RETRIEVE_PARAMETERS)
                        .with_params(json!({ "reason": format!("ssm get_parameters: {e}") }))
                })?;

            if !resp.invalid_parameters().is_empty() {
                debug!(invalid = ?resp.invalid_parameters(), "SSM reported unknown parameters");
            }

            for param in resp.parameters() {
                if let (Some(name), Some(value)) = (param.name(), param.value()) {
                    values.insert(name.to_string(), value.to_string());
                }
            }
        }

        Ok(values)
    }
}

/// Loads a fixed set of keys under an environment prefix.
#[derive(Debug, Clone)]
pub struct ParameterLoader {
    keys: Vec<String>,
    prefix: String,
    region: String,
}

impl ParameterLoader {
    #[must_use]
    pub fn new(keys: &[String], prefix: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            keys: keys.to_vec(),
            prefix: prefix.into(),
            region: region.into(),
        }
    }

    fn qualified(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// # Errors
    ///
    /// Returns `FailedToRetrieveParameters` if the store fails, returns
    /// nothing, or returns fewer keys than requested.
    pub async fn load(&self, store: &dyn ParameterStore) -> Result<Parameters, StatusCodeError> {
        let names: Vec<String> = self.keys.iter().map(|k| self.qualified(k)).collect();
        let fetched = store.get_parameters(&self.region, &names).await?;

        let mut resolved = BTreeMap::new();
        let mut missing = Vec::new();
        for key in &self.keys {
            match fetched.get(&self.qualified(key)) {
                Some(value) => {
                    resolved.insert(key.clone(), value.clone());
                }
                None => missing.push(key.clone()),
            }
        }

        if resolved.is_empty() || !missing.is_empty() {
            return Err(
                StatusCodeError::from_spec(specs::FAILED_TO_RETRIEVE_PARAMETERS).with_params(
                    json!({
                        "requested": self.keys.len(),
                        "retrieved": resolved.len(),
                        "missing": missing,
                    }),
                ),
            );
        }

        info!(count = resolved.len(), prefix = %self.prefix, "Loaded parameters");
        Ok(Parameters(resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MapStore(HashMap<String, String>);

    #[async_trait]
    impl ParameterStore for MapStore {
        async fn get_parameters(
            &self,
            _region: &str,
            names: &[String],
        ) -> Result<HashMap<String, String>, StatusCodeError> {
            Ok(names
                .iter()
                .filter_map(|n| self.0.get(n).map(|v| (n.clone(), v.clone())))
                .collect())
        }
    }

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn test_load_strips_prefix() {
        let store = MapStore(HashMap::from([
            ("/test/a".to_string(), "1".to_string()),
            ("/test/b".to_string(), "2".to_string()),
        ]));
        let loader = ParameterLoader::new(&keys(&["a", "b"]), "/test/", "local");

        let params = loader.load(&store).await.unwrap();
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get("b"), Some("2"));
        assert_eq!(params.len(), 2);
        assert!(!params.is_empty());
    }

    #[tokio::test]
    async fn test_load_tolerates_repeated_keys() {
        let store = MapStore(HashMap::from([("/test/a".to_string(), "1".to_string())]));
        let loader = ParameterLoader::new(&keys(&["a", "a"]), "/test/", "local");

        let params = loader.load(&store).await.unwrap();
        assert_eq!(params.get("a"), Some("1"));
    }

    #[tokio::test]
    async fn test_load_reports_missing_keys() {
        let store = MapStore(HashMap::from([("/test/a".to_string(), "1".to_string())]));
        let loader = ParameterLoader::new(&keys(&["a", "b"]), "/test/", "local");

        let err = loader.load(&store).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(err.has_code("ParamStoreError"));
        let params = err.diagnoses()[0].params.clone().unwrap();
        assert_eq!(params["missing"], json!(["b"]));
        assert_eq!(params["retrieved"], json!(1));
    }

    #[tokio::test]
    async fn test_load_fails_when_nothing_retrieved() {
        let store = MapStore(HashMap::new());
        let loader = ParameterLoader::new(&[], "/test/", "local");

        let err = loader.load(&store).await.unwrap_err();
        assert!(err.has_code("ParamStoreError"));
    }

    #[tokio::test]
    async fn test_load_ignores_other_environments() {
        let store = MapStore(HashMap::from([("/prod/a".to_string(), "1".to_string())]));
        let loader = ParameterLoader::new(&keys(&["a"]), "/test/", "local");

        assert!(loader.load(&store).await.is_err());
    }
}
