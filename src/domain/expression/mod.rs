//! Expression language for computed variable bindings
//!
//! A small FEEL-flavoured language evaluated against a context of named
//! JSON values. Supported constructs:
//! - Literals: numbers, `"strings"`, `true`, `false`, `null`, `[lists]`, `{contexts}`
//! - Names and paths: `order.id`, 1-based filters `items[1]`, `items[qty > 2]`
//! - Arithmetic `+ - * / **`, comparisons `= != < <= > >=`
//! - `and`, `or`, `x between a and b`, `x in [..]`, `if c then a else b`
//! - Built-in functions such as `upper case(s)`, `substring(s, 2)`, `count(l)`

mod ast;
mod error;
mod evaluator;
mod functions;
mod lexer;
mod parser;
mod value;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::{Map, Value};

pub use ast::{BinaryOp, Expr};
pub use error::ExpressionError;
pub use functions::Function;

/// A parsed expression, ready to be evaluated any number of times
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    /// Parse expression source text
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let root = parser::parse(source)?;

        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Evaluate against a context of named values
    pub fn evaluate(&self, context: &Map<String, Value>) -> Result<Value, ExpressionError> {
        evaluator::evaluate(&self.root, context)
    }
}

/// Evaluates rule text against a context
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExpressionEvaluator: Send + Sync {
    /// Parse `rule` and evaluate it against `context`
    async fn evaluate(
        &self,
        rule: &str,
        context: &Map<String, Value>,
    ) -> Result<Value, ExpressionError>;
}

/// The built-in evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct FeelEvaluator;

impl FeelEvaluator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExpressionEvaluator for FeelEvaluator {
    async fn evaluate(
        &self,
        rule: &str,
        context: &Map<String, Value>,
    ) -> Result<Value, ExpressionError> {
        Expression::parse(rule)?.evaluate(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_parse_once_evaluate_many() {
        let expression = Expression::parse("count + 1").unwrap();
        assert_eq!(expression.source(), "count + 1");

        let first = expression.evaluate(&context(json!({"count": 1}))).unwrap();
        let second = expression.evaluate(&context(json!({"count": 41}))).unwrap();

        assert_eq!(first, json!(2));
        assert_eq!(second, json!(42));
    }

    #[tokio::test]
    async fn test_feel_evaluator() {
        let evaluator = FeelEvaluator::new();
        let ctx = context(json!({"zeebeKey": 999}));

        let result = evaluator.evaluate("zeebeKey", &ctx).await.unwrap();
        assert_eq!(result, json!(999));
    }

    #[tokio::test]
    async fn test_feel_evaluator_parse_error() {
        let evaluator = FeelEvaluator::new();

        let err = evaluator.evaluate("1 +", &Map::new()).await.unwrap_err();
        assert!(err.is_parse_error());
    }

    #[tokio::test]
    async fn test_feel_evaluator_is_deterministic() {
        let evaluator = FeelEvaluator::new();
        let ctx = context(json!({"a": {"b": [1, 2, 3]}}));

        let first = evaluator.evaluate("sum(a.b) * 2", &ctx).await.unwrap();
        let second = evaluator.evaluate("sum(a.b) * 2", &ctx).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, json!(12));
    }
}
