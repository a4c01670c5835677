//! Job source abstraction (the workflow engine side)

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::Value;
use thiserror::Error;

use super::entity::Job;

/// Errors talking to the job source
#[derive(Debug, Clone, Error, PartialEq)]
pub enum JobSourceError {
    #[error("Job source request failed: {0}")]
    Transport(String),

    #[error("Job source rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response from job source: {0}")]
    InvalidResponse(String),

    #[error("Authentication with job source failed: {0}")]
    Authentication(String),
}

impl JobSourceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }
}

/// Parameters for one activation poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateJobsRequest {
    pub task_type: String,
    pub worker: String,
    /// How long activated jobs stay locked to this worker
    pub timeout_ms: u64,
    pub max_jobs_to_activate: u32,
    /// Long-polling timeout for the activation request itself
    pub request_timeout_ms: u64,
}

/// Delivers jobs and accepts exactly one completion per job
#[cfg_attr(test, automock)]
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Activate up to `max_jobs_to_activate` jobs of the requested type
    async fn activate_jobs(
        &self,
        request: &ActivateJobsRequest,
    ) -> Result<Vec<Job>, JobSourceError>;

    /// Report success, merging `variables` into the process instance
    async fn complete_job(&self, job_key: i64, variables: Value) -> Result<(), JobSourceError>;

    /// Report failure with the remaining retries
    async fn fail_job(
        &self,
        job_key: i64,
        retries: i32,
        error_message: &str,
    ) -> Result<(), JobSourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = JobSourceError::rejected(404, "job not found");
        assert_eq!(
            err.to_string(),
            "Job source rejected request with status 404: job not found"
        );

        let err = JobSourceError::transport("connection refused");
        assert_eq!(err.to_string(), "Job source request failed: connection refused");
    }
}
