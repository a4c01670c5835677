use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::auth::{OAuthCredentials, TokenProvider};
use super::dto::{
    ActivateJobsBody, ActivateJobsResponse, ActivatedJob, CompleteJobBody, FailJobBody,
};
use crate::domain::job::{ActivateJobsRequest, Job, JobSource, JobSourceError};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Key a non-object completion payload is stored under
pub const RESPONSE_VARIABLE: &str = "response";

/// Settings for [`ZeebeClient`]
#[derive(Debug, Clone)]
pub struct ZeebeClientConfig {
    /// Base address of the REST gateway, e.g. `http://localhost:8080`
    pub rest_address: String,
    pub oauth: Option<OAuthCredentials>,
    /// Timeout for completion and failure calls
    pub request_timeout: Duration,
}

impl ZeebeClientConfig {
    pub fn new(rest_address: impl Into<String>) -> Self {
        Self {
            rest_address: rest_address.into(),
            oauth: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_oauth(mut self, credentials: OAuthCredentials) -> Self {
        self.oauth = Some(credentials);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Camunda 8 REST gateway client
#[derive(Debug)]
pub struct ZeebeClient {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    tokens: Option<TokenProvider>,
}

impl ZeebeClient {
    pub fn new(config: ZeebeClientConfig) -> Result<Self, JobSourceError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| JobSourceError::transport(format!("Failed to build HTTP client: {}", e)))?;

        let tokens = config
            .oauth
            .map(|credentials| {
                TokenProvider::new(client.clone(), credentials, config.request_timeout)
            });

        Ok(Self {
            client,
            base_url: config.rest_address.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2/{}", self.base_url, path)
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, JobSourceError> {
        match &self.tokens {
            Some(tokens) => Ok(request.bearer_auth(tokens.token().await?)),
            None => Ok(request),
        }
    }

    async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<reqwest::Response, JobSourceError> {
        let request = self.client.post(self.url(path)).timeout(timeout).json(body);

        let response = self
            .authorize(request)
            .await?
            .send()
            .await
            .map_err(|e| JobSourceError::transport(format!("Request failed: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(JobSourceError::rejected(status.as_u16(), error_body));
        }

        Ok(response)
    }
}

/// The engine only merges objects into process variables
fn completion_variables(payload: Value) -> Value {
    match payload {
        Value::Object(_) => payload,
        Value::Null => Value::Object(Map::new()),
        other => {
            let mut wrapped = Map::new();
            wrapped.insert(RESPONSE_VARIABLE.to_string(), other);
            Value::Object(wrapped)
        }
    }
}

#[async_trait]
impl JobSource for ZeebeClient {
    async fn activate_jobs(
        &self,
        request: &ActivateJobsRequest,
    ) -> Result<Vec<Job>, JobSourceError> {
        let body = ActivateJobsBody {
            task_type: &request.task_type,
            worker: &request.worker,
            timeout: request.timeout_ms,
            max_jobs_to_activate: request.max_jobs_to_activate,
            request_timeout: request.request_timeout_ms,
        };

        // Activation long-polls for up to request_timeout_ms
        let timeout = Duration::from_millis(request.request_timeout_ms) + self.request_timeout;

        let response: ActivateJobsResponse = self
            .post("jobs/activation", &body, timeout)
            .await?
            .json()
            .await
            .map_err(|e| JobSourceError::invalid_response(e.to_string()))?;

        let jobs: Vec<Job> = response
            .jobs
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<ActivatedJob>(raw) {
                Ok(job) => Some(job.into_job()),
                Err(e) => {
                    warn!(
                        task_type = %request.task_type,
                        error = %e,
                        "Skipping malformed activated job"
                    );
                    None
                }
            })
            .collect();

        debug!(task_type = %request.task_type, jobs = jobs.len(), "Activated jobs");

        Ok(jobs)
    }

    async fn complete_job(&self, job_key: i64, variables: Value) -> Result<(), JobSourceError> {
        let body = CompleteJobBody {
            variables: completion_variables(variables),
        };

        self.post(&format!("jobs/{}/completion", job_key), &body, self.request_timeout)
            .await?;

        debug!(job_key, "Job completed");
        Ok(())
    }

    async fn fail_job(
        &self,
        job_key: i64,
        retries: i32,
        error_message: &str,
    ) -> Result<(), JobSourceError> {
        let body = FailJobBody {
            retries,
            error_message,
        };

        self.post(&format!("jobs/{}/failure", job_key), &body, self.request_timeout)
            .await?;

        warn!(job_key, retries, error = error_message, "Job failure reported");
        Ok(())
    }
}
