//! The request lifecycle shared by every Lambda in this crate.
//!
//! Each invocation walks the same phases in order:
//!
//! 1. attach a logger and validate the runtime environment
//! 2. load parameters from the parameter store
//! 3. populate services (database plus handler-specific extras)
//! 4. connect the database
//! 5. run the handler's business logic
//!
//! The first failing phase short-circuits to a failure response. Whatever
//! happened, the database is disconnected afterwards, exactly once.

use std::sync::Arc;

use async_trait::async_trait;
use lambda_runtime::{LambdaEvent, service_fn};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{Instrument, debug, error, info};

use super::response;
use crate::core::config::{HandlerConfig, RuntimeEnv};
use crate::core::models::{InvocationContext, Response};
use crate::core::parameters::{ParameterLoader, ParameterStore, Parameters, SsmParameterStore};
use crate::errors::{HandlerError, StatusCodeError, specs};
use crate::logging::stringifiable_error;
use crate::services::{DbServiceFactory, DbSettings, ServiceSet};

/// Business logic plugged into a [`LifecycleRunner`].
#[async_trait]
pub trait LambdaHandler: Send + Sync {
    type Output: Serialize + Send;

    /// Service name recorded on every log line of the invocation.
    fn name(&self) -> &str;

    /// Attach services other than the database. Runs after the database
    /// service has been created and before it is connected.
    async fn load_additional_services(
        &self,
        params: &Parameters,
        services: &mut ServiceSet,
    ) -> Result<(), HandlerError>;

    async fn handle(
        &self,
        request: &InvocationContext,
        params: &Parameters,
        services: &ServiceSet,
    ) -> Result<Self::Output, HandlerError>;
}

/// Lifecycle phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Start,
    LoggerAttached,
    ParamsLoaded,
    /// The database service is attached (not yet connected).
    ServicesPopulated,
    DbConnected,
    BusinessLogicRun,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Phase::Start => "START",
            Phase::LoggerAttached => "LOGGER_ATTACHED",
            Phase::ParamsLoaded => "PARAMS_LOADED",
            Phase::ServicesPopulated => "SERVICES_POPULATED",
            Phase::DbConnected => "DB_CONNECTED",
            Phase::BusinessLogicRun => "BUSINESS_LOGIC_RUN",
        })
    }
}

/// Result of one invocation.
#[derive(Debug)]
pub struct Invocation {
    pub response: Response,
    /// Set only when the invocation must fail at the platform level.
    pub error: Option<StatusCodeError>,
    /// Last phase that completed successfully.
    pub phase: Phase,
}

impl Invocation {
    /// Convert into what the Lambda runtime expects. The platform sees a
    /// failure only for errors explicitly flagged with `fail_lambda`.
    ///
    /// # Errors
    ///
    /// Returns the flagged error, if any.
    pub fn into_result(self) -> Result<Response, lambda_runtime::Error> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(self.response),
        }
    }
}

/// Runs a [`LambdaHandler`] through the request lifecycle.
pub struct LifecycleRunner<H> {
    config: HandlerConfig,
    db_factory: Box<dyn DbServiceFactory>,
    parameter_store: Arc<dyn ParameterStore>,
    handler: H,
}

impl<H: LambdaHandler> LifecycleRunner<H> {
    /// Parameters come from SSM unless replaced with
    /// [`LifecycleRunner::with_parameter_store`].
    pub fn new(config: HandlerConfig, db_factory: impl DbServiceFactory + 'static, handler: H) -> Self {
        Self {
            config,
            db_factory: Box::new(db_factory),
            parameter_store: Arc::new(SsmParameterStore::from_env()),
            handler,
        }
    }

    #[must_use]
    pub fn with_parameter_store(mut self, store: Arc<dyn ParameterStore>) -> Self {
        self.parameter_store = store;
        self
    }

    /// Lambda entry point: reads the runtime environment and runs one invocation.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures flagged with `fail_lambda` or a
    /// failed database disconnect.
    pub async fn handle(&self, event: LambdaEvent<Value>) -> Result<Response, lambda_runtime::Error> {
        let env = RuntimeEnv::from_env();
        self.run(event, &env).await.into_result()
    }

    /// Run one invocation against an explicit environment.
    pub async fn run(&self, event: LambdaEvent<Value>, env: &RuntimeEnv) -> Invocation {
        let (payload, context) = event.into_parts();
        let request = InvocationContext::new(payload, context.request_id, self.handler.name());
        let span = request.logger().clone();

        self.run_request(&request, env).instrument(span).await
    }

    async fn run_request(&self, request: &InvocationContext, env: &RuntimeEnv) -> Invocation {
        let mut services = ServiceSet::new();
        let mut phase = Phase::Start;

        let result = self
            .execute(request, env, &mut services, &mut phase)
            .await
            .and_then(|output| response::ok(&output));

        let invocation = match result {
            Ok(response) => {
                info!(status_code = response.status_code, "Invocation succeeded");
                Invocation {
                    response,
                    error: None,
                    phase,
                }
            }
            Err(err) => Self::failure(err, phase),
        };

        Self::release(&mut services, invocation).await
    }

    async fn execute(
        &self,
        request: &InvocationContext,
        env: &RuntimeEnv,
        services: &mut ServiceSet,
        phase: &mut Phase,
    ) -> Result<H::Output, HandlerError> {
        if !env.is_complete() {
            return Err(StatusCodeError::from_spec(specs::INVALID_EVENT)
                .with_params(json!({
                    "environment": env.environment,
                    "region": env.region,
                }))
                .into());
        }
        advance(phase, Phase::LoggerAttached);

        let loader = ParameterLoader::new(self.config.keys(), env.param_prefix(), env.region.clone());
        let params = loader.load(self.parameter_store.as_ref()).await?;
        advance(phase, Phase::ParamsLoaded);

        self.populate_services(&params, env, services, phase).await?;

        if let Some(db) = services.db_mut() {
            db.connect().await?;
        }
        advance(phase, Phase::DbConnected);

        let output = self.handler.handle(request, &params, services).await?;
        advance(phase, Phase::BusinessLogicRun);

        Ok(output)
    }

    async fn populate_services(
        &self,
        params: &Parameters,
        env: &RuntimeEnv,
        services: &mut ServiceSet,
        phase: &mut Phase,
    ) -> Result<(), HandlerError> {
        let settings = DbSettings::from_parameters(params, env, self.config.db_name());
        debug!(settings = ?settings, "Creating database service");
        let db = self.db_factory.create(settings)?;
        services.set_db(db);
        advance(phase, Phase::ServicesPopulated);

        self.handler.load_additional_services(params, services).await
    }

    fn failure(err: HandlerError, phase: Phase) -> Invocation {
        match &err {
            HandlerError::Status(status) => {
                error!(
                    phase = %phase,
                    status_code = status.status_code(),
                    error = %stringifiable_error(status),
                    "Invocation failed"
                );
            }
            HandlerError::Unexpected(cause) => {
                let source: &(dyn std::error::Error + 'static) = cause.as_ref();
                error!(
                    phase = %phase,
                    error = %stringifiable_error(source),
                    "Unexpected error, responding with InternalServerError"
                );
            }
        }

        let status = err.into_status_error();
        let response = response::failure(&status);
        let error = status.is_fail_lambda().then_some(status);

        Invocation {
            response,
            error,
            phase,
        }
    }

    async fn release(services: &mut ServiceSet, mut invocation: Invocation) -> Invocation {
        if let Some(mut db) = services.take_db() {
            if let Err(err) = db.disconnect().await {
                match &invocation.error {
                    Some(earlier) => error!(
                        error = %stringifiable_error(&err),
                        earlier_error = %stringifiable_error(earlier),
                        "Failed to disconnect database after an invocation that already failed the platform"
                    ),
                    None => {
                        error!(error = %stringifiable_error(&err), "Failed to disconnect database");
                        invocation.error = Some(err);
                    }
                }
            }
        }
        invocation
    }
}

fn advance(phase: &mut Phase, next: Phase) {
    debug!(from = %phase, to = %next, "Lifecycle phase complete");
    *phase = next;
}

/// Hand the runner to the Lambda runtime.
///
/// # Errors
///
/// Returns an error if the runtime loop fails.
pub async fn serve<H>(runner: LifecycleRunner<H>) -> Result<(), lambda_runtime::Error>
where
    H: LambdaHandler + 'static,
{
    let runner = Arc::new(runner);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let runner = Arc::clone(&runner);
        async move { runner.handle(event).await }
    }))
    .await
}
