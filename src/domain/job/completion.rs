//! Job completion outcome

use serde_json::{Map, Value};

use super::entity::Job;
use super::source::{JobSource, JobSourceError};

/// Wrap a response as `{ <data_key>: response }`, or return it unchanged
/// when no non-empty key is given
pub fn nest_response(response: Value, data_key: Option<&str>) -> Value {
    match data_key {
        Some(key) if !key.is_empty() => {
            let mut payload = Map::new();
            payload.insert(key.to_string(), response);
            Value::Object(payload)
        }
        _ => response,
    }
}

/// Final outcome of handling one job.
///
/// Consumed by [`JobOutcome::report`], so a job is completed exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Payload to merge into the process instance
    Success(Value),

    /// Diagnostic message for the incident
    Failure(String),
}

impl JobOutcome {
    /// Success payload for a GraphQL response, nested under `data_key` when given
    pub fn succeeded(response: Value, data_key: Option<&str>) -> Self {
        Self::Success(nest_response(response, data_key))
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Label used for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Failure(_) => "failure",
        }
    }

    /// Send the outcome to the job source
    pub async fn report(self, job: &Job, source: &dyn JobSource) -> Result<(), JobSourceError> {
        match self {
            Self::Success(payload) => source.complete_job(job.key, payload).await,
            Self::Failure(message) => {
                source
                    .fail_job(job.key, job.remaining_retries_after_failure(), &message)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::MockJobSource;
    use mockall::predicate::eq;
    use serde_json::json;

    #[test]
    fn test_succeeded_without_data_key() {
        let response = json!({"item": {"name": "Widget"}});

        assert_eq!(
            JobOutcome::succeeded(response.clone(), None),
            JobOutcome::Success(response.clone())
        );
        assert_eq!(
            JobOutcome::succeeded(response.clone(), Some("")),
            JobOutcome::Success(response)
        );
    }

    #[test]
    fn test_succeeded_with_data_key() {
        let response = json!({"item": {"name": "Widget"}});

        assert_eq!(
            JobOutcome::succeeded(response, Some("result")),
            JobOutcome::Success(json!({"result": {"item": {"name": "Widget"}}}))
        );
    }

    #[tokio::test]
    async fn test_report_success_completes_job() {
        let mut source = MockJobSource::new();
        source
            .expect_complete_job()
            .with(eq(7), eq(json!({"a": 1})))
            .times(1)
            .returning(|_, _| Ok(()));
        source.expect_fail_job().never();

        let job = Job::new(7, "graphql");
        JobOutcome::Success(json!({"a": 1}))
            .report(&job, &source)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_report_failure_decrements_retries() {
        let mut source = MockJobSource::new();
        source
            .expect_fail_job()
            .withf(|key, retries, message| {
                *key == 7 && *retries == 2 && message.to_string() == "boom"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        source.expect_complete_job().never();

        let job = Job::new(7, "graphql").with_retries(3);
        JobOutcome::failed("boom").report(&job, &source).await.unwrap();
    }
}
