use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A static error catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorSpec {
    pub application_code: &'static str,
    pub message: &'static str,
    pub status_code: u16,
}

impl ErrorSpec {
    #[must_use]
    pub const fn new(application_code: &'static str, message: &'static str, status_code: u16) -> Self {
        Self {
            application_code,
            message,
            status_code,
        }
    }
}

/// Errors raised by the lifecycle itself.
pub mod specs {
    use super::ErrorSpec;

    pub const INVALID_EVENT: ErrorSpec =
        ErrorSpec::new("InvalidEvent", "Environment name and region are required", 400);

    pub const FAILED_TO_RETRIEVE_PARAMETERS: ErrorSpec = ErrorSpec::new(
        "ParamStoreError",
        "Failed to retrieve parameters from the parameter store",
        500,
    );

    pub const DATABASE_CONNECTION_FAILED: ErrorSpec = ErrorSpec::new(
        "DatabaseConnectionFailed",
        "Failed to connect to the database",
        500,
    );

    pub const INTERNAL_SERVER_ERROR: ErrorSpec =
        ErrorSpec::new("InternalServerError", "Internal server error", 500);
}

/// The user-facing form of one error item in a failure body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub application_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl From<&ErrorSpec> for Diagnosis {
    fn from(spec: &ErrorSpec) -> Self {
        Self {
            application_code: spec.application_code.to_string(),
            message: spec.message.to_string(),
            params: None,
        }
    }
}

/// An error that knows which status code to answer with.
#[derive(Debug, Clone, Error)]
#[error("{status_code}: {}", summary(.diagnoses))]
pub struct StatusCodeError {
    status_code: u16,
    diagnoses: Vec<Diagnosis>,
    fail_lambda: bool,
}

fn summary(diagnoses: &[Diagnosis]) -> String {
    diagnoses
        .iter()
        .map(|d| format!("[{}] {}", d.application_code, d.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl StatusCodeError {
    #[must_use]
    pub fn from_specs(specs: &[ErrorSpec], status_code: u16) -> Self {
        Self {
            status_code,
            diagnoses: specs.iter().map(Diagnosis::from).collect(),
            fail_lambda: false,
        }
    }

    /// Shorthand for one `ErrorSpec`, answered with its own status code.
    #[must_use]
    pub fn from_spec(spec: ErrorSpec) -> Self {
        Self::from_specs(&[spec], spec.status_code)
    }

    /// Attach structured params to every diagnosis.
    #[must_use]
    pub fn with_params(mut self, params: Value) -> Self {
        for diagnosis in &mut self.diagnoses {
            diagnosis.params = Some(params.clone());
        }
        self
    }

    /// Mark this error as one that must fail the Lambda invocation itself,
    /// handing it to the platform's retry machinery.
    #[must_use]
    pub fn fail_lambda(mut self) -> Self {
        self.fail_lambda = true;
        self
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    #[must_use]
    pub fn is_fail_lambda(&self) -> bool {
        self.fail_lambda
    }

    #[must_use]
    pub fn diagnoses(&self) -> &[Diagnosis] {
        &self.diagnoses
    }

    #[must_use]
    pub fn to_diagnoses(&self) -> Vec<Diagnosis> {
        self.diagnoses.clone()
    }

    /// Whether any diagnosis carries the given application code.
    #[must_use]
    pub fn has_code(&self, application_code: &str) -> bool {
        self.diagnoses
            .iter()
            .any(|d| d.application_code == application_code)
    }
}

/// Error type returned by lifecycle phases and business logic.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Status(#[from] StatusCodeError),

    #[error("{0:#}")]
    Unexpected(#[from] anyhow::Error),
}

impl HandlerError {
    /// Normalize into a status-coded error. Anything that is not already one
    /// becomes a generic `InternalServerError`.
    #[must_use]
    pub fn into_status_error(self) -> StatusCodeError {
        match self {
            HandlerError::Status(err) => err,
            HandlerError::Unexpected(_) => StatusCodeError::from_spec(specs::INTERNAL_SERVER_ERROR),
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(error: serde_json::Error) -> Self {
        HandlerError::Unexpected(error.into())
    }
}

impl From<mongodb::error::Error> for HandlerError {
    fn from(error: mongodb::error::Error) -> Self {
        HandlerError::Unexpected(error.into())
    }
}

/// Raised when a handler is built with unusable settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Database name must be a non-empty string")]
    InvalidDbName,

    #[error("Parameter key at position {0} must be a non-empty string")]
    InvalidKey(usize),

    #[error("Parameter key '{0}' is listed more than once")]
    DuplicateKey(String),
}
