//! Zeebe GraphQL Worker
//!
//! Executes GraphQL requests on behalf of a Zeebe workflow engine:
//! - Query, data key and variable bindings are declared as task headers
//! - Variables can be literals or expressions over the job context
//! - The response is written back into the process instance

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use domain::{DomainError, FeelEvaluator, JobTranslator};
use infrastructure::{
    GraphqlClient, GraphqlClientConfig, JobWorker, OAuthCredentials, WorkerConfig, ZeebeClient,
    ZeebeClientConfig,
};
use tracing::info;

use config::{GraphqlConfig, WorkerSettings, ZeebeConfig};

/// Fully wired worker and the translator it drives
pub struct WorkerState {
    pub worker: Arc<JobWorker>,
    pub translator: Arc<JobTranslator>,
}

/// Validate the configuration and build every component of the worker
pub fn create_worker_state(config: &AppConfig) -> Result<WorkerState, DomainError> {
    config.validate()?;

    let graphql = GraphqlClient::new(graphql_client_config(&config.graphql))
        .map_err(|e| DomainError::internal(e.to_string()))?;
    info!(endpoint = %graphql.endpoint_url(), "GraphQL client configured");

    let zeebe = ZeebeClient::new(zeebe_client_config(&config.zeebe))
        .map_err(|e| DomainError::internal(e.to_string()))?;
    info!(
        rest_address = %config.zeebe.rest_address,
        oauth = config.zeebe.uses_oauth(),
        "Zeebe client configured"
    );

    let translator = Arc::new(JobTranslator::new(
        Arc::new(FeelEvaluator::new()),
        Arc::new(graphql),
    ));

    let worker = Arc::new(JobWorker::new(
        Arc::new(zeebe),
        Arc::clone(&translator),
        worker_config(&config.worker),
    ));

    Ok(WorkerState { worker, translator })
}

fn graphql_client_config(config: &GraphqlConfig) -> GraphqlClientConfig {
    let client_config = GraphqlClientConfig::new(config.endpoint_url.trim())
        .with_request_timeout(Duration::from_millis(config.request_timeout_ms));

    match config.authorization_header() {
        Some((key, value)) => client_config.with_authorization(key, value),
        None => client_config,
    }
}

fn zeebe_client_config(config: &ZeebeConfig) -> ZeebeClientConfig {
    let client_config = ZeebeClientConfig::new(config.rest_address.clone())
        .with_request_timeout(Duration::from_millis(config.request_timeout_ms));

    match (
        &config.client_id,
        &config.client_secret,
        &config.authorization_server_url,
    ) {
        (Some(client_id), Some(client_secret), Some(authorization_server_url)) => client_config
            .with_oauth(OAuthCredentials {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                authorization_server_url: authorization_server_url.clone(),
                audience: config.token_audience.clone(),
            }),
        _ => client_config,
    }
}

fn worker_config(settings: &WorkerSettings) -> WorkerConfig {
    WorkerConfig {
        task_type: settings.task_type.clone(),
        worker_name: settings.name.clone(),
        max_concurrent_jobs: settings.max_concurrent_jobs,
        max_jobs_to_activate: settings.max_jobs_to_activate,
        job_timeout: Duration::from_millis(settings.job_timeout_ms),
        poll_interval: Duration::from_millis(settings.poll_interval_ms),
        request_timeout: Duration::from_millis(settings.request_timeout_ms),
    }
}
