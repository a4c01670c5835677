//! Eval command - evaluates one expression offline

use anyhow::{bail, Context};
use clap::Args;
use serde_json::{Map, Value};

use crate::domain::expression::Expression;
use crate::domain::job::EXPRESSION_SENTINEL;

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Expression to evaluate; a leading `=` is accepted as in task headers
    #[arg(short, long)]
    pub expression: String,

    /// JSON object used as the evaluation context
    #[arg(short, long)]
    pub context: Option<String>,
}

/// Evaluate and print the result as JSON
pub fn run(args: EvalArgs) -> anyhow::Result<()> {
    let value = evaluate(&args)?;
    println!("{}", serde_json::to_string_pretty(&value)?);

    Ok(())
}

fn evaluate(args: &EvalArgs) -> anyhow::Result<Value> {
    let context = match &args.context {
        Some(raw) => parse_context(raw)?,
        None => Map::new(),
    };

    let rule = args
        .expression
        .strip_prefix(EXPRESSION_SENTINEL)
        .unwrap_or(&args.expression);

    let expression = Expression::parse(rule)?;

    Ok(expression.evaluate(&context)?)
}

fn parse_context(raw: &str) -> anyhow::Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw).context("context is not valid JSON")?;

    match value {
        Value::Object(map) => Ok(map),
        other => bail!("context must be a JSON object, got {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(expression: &str, context: Option<&str>) -> EvalArgs {
        EvalArgs {
            expression: expression.to_string(),
            context: context.map(str::to_string),
        }
    }

    #[test]
    fn test_evaluate_with_context() {
        let value = evaluate(&args("order.total * 2", Some(r#"{"order": {"total": 21}}"#))).unwrap();

        assert_eq!(value, json!(42));
    }

    #[test]
    fn test_evaluate_strips_sentinel() {
        let value = evaluate(&args("=upper case(name)", Some(r#"{"name": "acme"}"#))).unwrap();

        assert_eq!(value, json!("ACME"));
    }

    #[test]
    fn test_evaluate_without_context() {
        assert_eq!(evaluate(&args("1 + 2", None)).unwrap(), json!(3));
    }

    #[test]
    fn test_context_must_be_object() {
        let err = evaluate(&args("1", Some("[1, 2]"))).unwrap_err();

        assert!(err.to_string().contains("JSON object"));
    }

    #[test]
    fn test_unknown_variable_is_error() {
        assert!(evaluate(&args("missing + 1", None)).is_err());
    }
}
