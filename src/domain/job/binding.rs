//! Variable binding directives
//!
//! A directive is the value of a `graphql_var_<name>` header. Values starting
//! with `=` are expressions; anything else is used verbatim. There is no way
//! to escape a literal value that itself starts with `=`.

use serde_json::Value;

use super::context::EvaluationContext;
use crate::domain::expression::{ExpressionError, ExpressionEvaluator};

/// Marks a directive value as an expression
pub const EXPRESSION_SENTINEL: char = '=';

/// How one outbound variable obtains its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Use the header value as-is
    Literal(String),

    /// Evaluate the rule (sentinel stripped) against the job context
    Expression(String),
}

impl Binding {
    /// Classify a header value
    pub fn parse(value: &str) -> Self {
        match value.strip_prefix(EXPRESSION_SENTINEL) {
            Some(rule) => Self::Expression(rule.to_string()),
            None => Self::Literal(value.to_string()),
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, Self::Expression(_))
    }

    /// Produce the concrete value for this binding
    pub async fn resolve(
        &self,
        evaluator: &dyn ExpressionEvaluator,
        context: &EvaluationContext,
    ) -> Result<Value, ExpressionError> {
        match self {
            Self::Literal(value) => Ok(Value::String(value.clone())),
            Self::Expression(rule) => evaluator.evaluate(rule, context.as_map()).await,
        }
    }
}

/// A named outbound variable and its binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDirective {
    pub name: String,
    pub binding: Binding,
}

impl VariableDirective {
    pub fn new(name: impl Into<String>, binding: Binding) -> Self {
        Self {
            name: name.into(),
            binding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::expression::{FeelEvaluator, MockExpressionEvaluator};
    use crate::domain::job::Job;
    use serde_json::json;

    #[test]
    fn test_parse_literal() {
        assert_eq!(Binding::parse("42"), Binding::Literal("42".to_string()));
        assert_eq!(Binding::parse(""), Binding::Literal(String::new()));
        assert_eq!(
            Binding::parse(" =not-an-expression"),
            Binding::Literal(" =not-an-expression".to_string())
        );
    }

    #[test]
    fn test_parse_expression() {
        assert_eq!(
            Binding::parse("=zeebeKey"),
            Binding::Expression("zeebeKey".to_string())
        );
        // Only the first sentinel is stripped
        assert_eq!(
            Binding::parse("==a"),
            Binding::Expression("=a".to_string())
        );
        assert!(Binding::parse("=").is_expression());
    }

    #[tokio::test]
    async fn test_literal_resolves_verbatim() {
        let evaluator = MockExpressionEvaluator::new();
        let context = EvaluationContext::for_job(&Job::new(1, "graphql"));

        let value = Binding::parse("  spaced  ü ")
            .resolve(&evaluator, &context)
            .await
            .unwrap();

        assert_eq!(value, json!("  spaced  ü "));
    }

    #[tokio::test]
    async fn test_expression_uses_evaluator_result() {
        let mut evaluator = MockExpressionEvaluator::new();
        evaluator
            .expect_evaluate()
            .withf(|rule, context| rule.to_string() == "a + 1" && context.contains_key("zeebeKey"))
            .times(1)
            .returning(|_, _| Ok(json!(8)));

        let context = EvaluationContext::for_job(&Job::new(1, "graphql"));

        let value = Binding::parse("=a + 1")
            .resolve(&evaluator, &context)
            .await
            .unwrap();

        assert_eq!(value, json!(8));
    }

    #[tokio::test]
    async fn test_expression_error_propagates() {
        let context = EvaluationContext::for_job(&Job::new(1, "graphql"));

        let err = Binding::parse("=undefinedThing")
            .resolve(&FeelEvaluator::new(), &context)
            .await
            .unwrap_err();

        assert!(!err.is_parse_error());
    }
}
