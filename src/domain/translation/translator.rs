//! Job to GraphQL request translation

use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use super::error::TranslationError;
use crate::domain::expression::ExpressionEvaluator;
use crate::domain::graphql::{QueryDocument, QueryExecutor};
use crate::domain::job::{
    nest_response, EvaluationContext, HeaderDirectives, Job, JobOutcome, QUERY_HEADER,
};

/// Stage a job is in while it is being handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Received,
    ParsingHeaders,
    ResolvingVariables,
    ExecutingQuery,
    Succeeded,
    Failed,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::ParsingHeaders => "parsing_headers",
            Self::ResolvingVariables => "resolving_variables",
            Self::ExecutingQuery => "executing_query",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A fully resolved GraphQL request for one job
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub document: QueryDocument,
    pub variables: Map<String, Value>,
    pub data_key: Option<String>,
}

/// Turns jobs into GraphQL requests and their responses into outcomes
pub struct JobTranslator {
    evaluator: Arc<dyn ExpressionEvaluator>,
    executor: Arc<dyn QueryExecutor>,
}

impl fmt::Debug for JobTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobTranslator").finish_non_exhaustive()
    }
}

impl JobTranslator {
    pub fn new(evaluator: Arc<dyn ExpressionEvaluator>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            evaluator,
            executor,
        }
    }

    /// Build the outbound request for a job without executing it
    pub async fn translate(&self, job: &Job) -> Result<OutboundRequest, TranslationError> {
        debug!(job_key = job.key, stage = %JobStage::ParsingHeaders, "Parsing job headers");
        let directives = HeaderDirectives::parse(&job.custom_headers);

        let query = directives
            .query()
            .ok_or_else(|| TranslationError::configuration_missing(QUERY_HEADER))?;
        let document = QueryDocument::parse(query)?;

        debug!(
            job_key = job.key,
            stage = %JobStage::ResolvingVariables,
            variables = directives.variables().len(),
            expressions = directives.expression_count(),
            "Resolving variables"
        );

        // Every expression sees the same context, built once
        let context = EvaluationContext::for_job(job);
        let evaluator = self.evaluator.as_ref();

        let resolved = try_join_all(directives.variables().iter().map(|directive| {
            let context = &context;
            async move {
                directive
                    .binding
                    .resolve(evaluator, context)
                    .await
                    .map(|value| (directive.name.clone(), value))
                    .map_err(|e| TranslationError::directive_resolution(&directive.name, e))
            }
        }))
        .await?;

        Ok(OutboundRequest {
            document,
            variables: resolved.into_iter().collect(),
            data_key: directives.data_key().map(str::to_string),
        })
    }

    /// Execute a request, shaping the response into the success payload
    pub async fn execute(&self, request: &OutboundRequest) -> Result<Value, TranslationError> {
        let response = self
            .executor
            .execute(&request.document, &request.variables)
            .await?;

        Ok(nest_response(response, request.data_key.as_deref()))
    }

    /// Handle a job end to end. Every error is caught here and becomes a failure.
    #[tracing::instrument(
        skip(self, job),
        fields(job_key = job.key, task_type = %job.task_type)
    )]
    pub async fn process(&self, job: &Job) -> JobOutcome {
        debug!(stage = %JobStage::Received, "Received job");

        match self.run(job).await {
            Ok(payload) => {
                info!(stage = %JobStage::Succeeded, "Job completed");
                JobOutcome::Success(payload)
            }
            Err(e) => {
                error!(
                    stage = %JobStage::Failed,
                    error_kind = e.kind(),
                    error = %e,
                    "Job failed"
                );
                JobOutcome::failed(e.to_string())
            }
        }
    }

    async fn run(&self, job: &Job) -> Result<Value, TranslationError> {
        let request = self.translate(job).await?;

        debug!(
            stage = %JobStage::ExecutingQuery,
            operation = request.document.operation_name().unwrap_or("<anonymous>"),
            "Executing GraphQL request"
        );

        self.execute(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::expression::{ExpressionError, FeelEvaluator, MockExpressionEvaluator};
    use crate::domain::graphql::{GraphqlError, MockQueryExecutor};
    use serde_json::json;

    const ITEM_QUERY: &str = "query($id: ID){ item(id:$id){name} }";

    fn translator(executor: MockQueryExecutor) -> JobTranslator {
        JobTranslator::new(Arc::new(FeelEvaluator::new()), Arc::new(executor))
    }

    fn widget_executor(expected: Value) -> MockQueryExecutor {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_execute()
            .withf(move |document, variables| {
                document.source() == ITEM_QUERY && Value::Object(variables.clone()) == expected
            })
            .times(1)
            .returning(|_, _| Ok(json!({"item": {"name": "Widget"}})));
        executor
    }

    fn item_job() -> Job {
        Job::new(999, "graphql")
            .with_header("graphql_query", ITEM_QUERY)
            .with_header("graphql_var_id", "42")
    }

    #[tokio::test]
    async fn test_literal_variable_without_data_key() {
        let translator = translator(widget_executor(json!({"id": "42"})));

        let outcome = translator.process(&item_job()).await;

        assert_eq!(
            outcome,
            JobOutcome::Success(json!({"item": {"name": "Widget"}}))
        );
    }

    #[tokio::test]
    async fn test_data_key_nests_response() {
        let translator = translator(widget_executor(json!({"id": "42"})));
        let job = item_job().with_header("graphql_data_key", "result");

        let outcome = translator.process(&job).await;

        assert_eq!(
            outcome,
            JobOutcome::Success(json!({"result": {"item": {"name": "Widget"}}}))
        );
    }

    #[tokio::test]
    async fn test_expression_variable_uses_job_key() {
        let translator = translator(widget_executor(json!({"id": 999})));
        let job = item_job().with_header("graphql_var_id", "=zeebeKey");

        let outcome = translator.process(&job).await;

        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_remote_error_becomes_failure() {
        let mut executor = MockQueryExecutor::new();
        executor
            .expect_execute()
            .times(1)
            .returning(|_, _| Err(GraphqlError::remote(vec!["Item not found".to_string()])));

        let outcome = translator(executor).process(&item_job()).await;

        assert_eq!(outcome, JobOutcome::failed("GraphQL error: Item not found"));
    }

    #[tokio::test]
    async fn test_missing_query_executes_nothing() {
        let mut executor = MockQueryExecutor::new();
        executor.expect_execute().never();
        let translator = translator(executor);

        let job = Job::new(1, "graphql").with_header("graphql_var_id", "42");

        let err = translator.translate(&job).await.unwrap_err();
        assert_eq!(err, TranslationError::configuration_missing("graphql_query"));

        let outcome = translator.process(&job).await;
        assert_eq!(
            outcome,
            JobOutcome::failed("Missing required header 'graphql_query'")
        );
    }

    #[tokio::test]
    async fn test_one_bad_expression_fails_whole_job() {
        let mut executor = MockQueryExecutor::new();
        executor.expect_execute().never();
        let translator = translator(executor);

        let job = item_job()
            .with_header("graphql_var_good", "=zeebeKey")
            .with_header("graphql_var_bad", "=1 +");

        let err = translator.translate(&job).await.unwrap_err();
        assert!(matches!(
            err,
            TranslationError::DirectiveResolution { ref variable, ref source }
                if variable == "bad" && source.is_parse_error()
        ));

        assert!(!translator.process(&job).await.is_success());
    }

    #[tokio::test]
    async fn test_invalid_document_fails_before_evaluation() {
        let mut evaluator = MockExpressionEvaluator::new();
        evaluator.expect_evaluate().never();
        let mut executor = MockQueryExecutor::new();
        executor.expect_execute().never();

        let translator = JobTranslator::new(Arc::new(evaluator), Arc::new(executor));
        let job = Job::new(1, "graphql")
            .with_header("graphql_query", "query {")
            .with_header("graphql_var_id", "=zeebeKey");

        let err = translator.translate(&job).await.unwrap_err();
        assert_eq!(err.kind(), "unhandled");
    }

    #[tokio::test]
    async fn test_empty_variable_suffix_is_ignored() {
        let translator = translator(MockQueryExecutor::new());
        let job = item_job().with_header("graphql_var_", "whatever");

        let request = translator.translate(&job).await.unwrap();

        assert_eq!(Value::Object(request.variables), json!({"id": "42"}));
    }

    #[tokio::test]
    async fn test_expressions_share_one_context() {
        let mut evaluator = MockExpressionEvaluator::new();
        evaluator
            .expect_evaluate()
            .withf(|_, context| {
                context.get("zeebeKey") == Some(&json!(999))
                    && context.get("customer") == Some(&json!("acme"))
            })
            .times(2)
            .returning(|rule, _| Ok(json!(rule)));

        let translator =
            JobTranslator::new(Arc::new(evaluator), Arc::new(MockQueryExecutor::new()));
        let job = item_job()
            .with_variable("customer", json!("acme"))
            .with_header("graphql_var_a", "=first")
            .with_header("graphql_var_b", "=second");

        let request = translator.translate(&job).await.unwrap();

        assert_eq!(
            Value::Object(request.variables),
            json!({"id": "42", "a": "first", "b": "second"})
        );
    }

    #[tokio::test]
    async fn test_identical_jobs_translate_identically() {
        let translator = translator(MockQueryExecutor::new());
        let job = item_job()
            .with_variable("n", json!(3))
            .with_header("graphql_var_double", "=n * 2")
            .with_header("graphql_data_key", "out");

        let first = translator.translate(&job).await.unwrap();
        let second = translator.translate(&job.clone()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.variables.get("double"), Some(&json!(6)));
        assert_eq!(first.data_key.as_deref(), Some("out"));
    }

    #[tokio::test]
    async fn test_evaluator_error_is_wrapped() {
        let mut evaluator = MockExpressionEvaluator::new();
        evaluator
            .expect_evaluate()
            .returning(|_, _| Err(ExpressionError::evaluation("boom")));

        let translator =
            JobTranslator::new(Arc::new(evaluator), Arc::new(MockQueryExecutor::new()));
        let job = item_job().with_header("graphql_var_x", "=anything");

        let outcome = translator.process(&job).await;

        assert_eq!(
            outcome,
            JobOutcome::failed("Failed to resolve variable 'x': Failed to evaluate expression: boom")
        );
    }
}
