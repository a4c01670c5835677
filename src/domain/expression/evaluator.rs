//! Tree-walking evaluator

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::ast::{BinaryOp, Expr};
use super::error::ExpressionError;
use super::functions::{add_numbers, Function};
use super::value::{as_num, compare, float_value, type_name, values_equal, Num};

/// Evaluate an expression tree against a context of named values
pub fn evaluate(expr: &Expr, context: &Map<String, Value>) -> Result<Value, ExpressionError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Name(name) => context.get(name).cloned().ok_or_else(|| {
            ExpressionError::evaluation(format!("no variable found with name '{}'", name))
        }),
        Expr::Path(target, member) => Ok(path(evaluate(target, context)?, member)),
        Expr::Filter(target, index) => filter(evaluate(target, context)?, index, context),
        Expr::Negate(operand) => negate(evaluate(operand, context)?),
        Expr::Binary(op, left, right) => {
            let left = evaluate(left, context)?;
            let right = evaluate(right, context)?;
            binary(*op, &left, &right)
        }
        Expr::And(left, right) => {
            let left = as_bool(&evaluate(left, context)?);
            if left == Some(false) {
                return Ok(Value::Bool(false));
            }
            let right = as_bool(&evaluate(right, context)?);
            Ok(match (left, right) {
                (_, Some(false)) => Value::Bool(false),
                (Some(true), Some(true)) => Value::Bool(true),
                _ => Value::Null,
            })
        }
        Expr::Or(left, right) => {
            let left = as_bool(&evaluate(left, context)?);
            if left == Some(true) {
                return Ok(Value::Bool(true));
            }
            let right = as_bool(&evaluate(right, context)?);
            Ok(match (left, right) {
                (_, Some(true)) => Value::Bool(true),
                (Some(false), Some(false)) => Value::Bool(false),
                _ => Value::Null,
            })
        }
        Expr::Between { value, low, high } => {
            let value = evaluate(value, context)?;
            let low = evaluate(low, context)?;
            let high = evaluate(high, context)?;

            if value.is_null() || low.is_null() || high.is_null() {
                return Ok(Value::Null);
            }

            let above = ordering("between", &value, &low)?.is_ge();
            let below = ordering("between", &value, &high)?.is_le();
            Ok(Value::Bool(above && below))
        }
        Expr::In(needle, haystack) => {
            let needle = evaluate(needle, context)?;
            Ok(Value::Bool(match evaluate(haystack, context)? {
                Value::Array(items) => items.iter().any(|item| values_equal(&needle, item)),
                other => values_equal(&needle, &other),
            }))
        }
        Expr::If {
            condition,
            then_branch,
            else_branch,
        } => {
            if as_bool(&evaluate(condition, context)?) == Some(true) {
                evaluate(then_branch, context)
            } else {
                evaluate(else_branch, context)
            }
        }
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, context))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Context(entries) => {
            let mut map = Map::new();
            for (key, value) in entries {
                map.insert(key.clone(), evaluate(value, context)?);
            }
            Ok(Value::Object(map))
        }
        Expr::Call(Function::IsDefined, args) => match args.as_slice() {
            [arg] => Ok(Value::Bool(evaluate(arg, context).is_ok())),
            _ => Function::IsDefined.call(Vec::new()),
        },
        Expr::Call(function, args) => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, context))
                .collect::<Result<Vec<_>, _>>()?;
            function.call(args)
        }
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    value.as_bool()
}

fn path(target: Value, member: &str) -> Value {
    match target {
        Value::Object(mut map) => map.remove(member).unwrap_or(Value::Null),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| path(item, member))
                .collect(),
        ),
        _ => Value::Null,
    }
}

fn filter(
    target: Value,
    index: &Expr,
    context: &Map<String, Value>,
) -> Result<Value, ExpressionError> {
    let items = match target {
        Value::Array(items) => items,
        Value::Null => return Ok(Value::Null),
        single => vec![single],
    };

    // A numeric index selects one element; anything else filters per element
    if let Ok(Value::Number(n)) = evaluate(index, context) {
        let position = match as_num(&Value::Number(n)) {
            Some(Num::Int(i)) => i,
            Some(Num::Float(f)) if f.fract() == 0.0 => f as i64,
            _ => return Ok(Value::Null),
        };
        return Ok(select(items, position));
    }

    let mut selected = Vec::new();
    for item in items {
        let mut scope = context.clone();
        if let Value::Object(fields) = &item {
            for (key, value) in fields {
                scope.insert(key.clone(), value.clone());
            }
        }
        scope.insert("item".to_string(), item.clone());

        if as_bool(&evaluate(index, &scope)?) == Some(true) {
            selected.push(item);
        }
    }

    Ok(Value::Array(selected))
}

/// 1-based element selection, negative positions count from the end
fn select(mut items: Vec<Value>, position: i64) -> Value {
    let len = items.len() as i64;
    let index = match position {
        p if p > 0 => p - 1,
        p if p < 0 => len + p,
        _ => return Value::Null,
    };

    if (0..len).contains(&index) {
        items.swap_remove(index as usize)
    } else {
        Value::Null
    }
}

fn negate(value: Value) -> Result<Value, ExpressionError> {
    match as_num(&value) {
        Some(Num::Int(i)) => Ok(i
            .checked_neg()
            .map(Value::from)
            .unwrap_or_else(|| float_value(-(i as f64)))),
        Some(Num::Float(f)) => Ok(float_value(-f)),
        None if value.is_null() => Ok(Value::Null),
        None => Err(ExpressionError::evaluation(format!(
            "cannot negate a {}",
            type_name(&value)
        ))),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, ExpressionError> {
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(values_equal(left, right))),
        BinaryOp::NotEq => return Ok(Value::Bool(!values_equal(left, right))),
        _ => {}
    }

    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    match op {
        BinaryOp::Lt => Ok(Value::Bool(ordering(op.symbol(), left, right)?.is_lt())),
        BinaryOp::Le => Ok(Value::Bool(ordering(op.symbol(), left, right)?.is_le())),
        BinaryOp::Gt => Ok(Value::Bool(ordering(op.symbol(), left, right)?.is_gt())),
        BinaryOp::Ge => Ok(Value::Bool(ordering(op.symbol(), left, right)?.is_ge())),
        BinaryOp::Add => {
            if let (Value::String(a), Value::String(b)) = (left, right) {
                return Ok(Value::String(format!("{}{}", a, b)));
            }
            let (a, b) = numbers(op, left, right)?;
            Ok(add_numbers(a, b).into_value())
        }
        BinaryOp::Sub => {
            let (a, b) = numbers(op, left, right)?;
            Ok(match (a, b) {
                (Num::Int(x), Num::Int(y)) => x
                    .checked_sub(y)
                    .map(Value::from)
                    .unwrap_or_else(|| float_value(x as f64 - y as f64)),
                (x, y) => float_value(x.as_f64() - y.as_f64()),
            })
        }
        BinaryOp::Mul => {
            let (a, b) = numbers(op, left, right)?;
            Ok(match (a, b) {
                (Num::Int(x), Num::Int(y)) => x
                    .checked_mul(y)
                    .map(Value::from)
                    .unwrap_or_else(|| float_value(x as f64 * y as f64)),
                (x, y) => float_value(x.as_f64() * y.as_f64()),
            })
        }
        BinaryOp::Div => {
            let (a, b) = numbers(op, left, right)?;
            if b.as_f64() == 0.0 {
                return Ok(Value::Null);
            }
            Ok(match (a, b) {
                (Num::Int(x), Num::Int(y)) if x.checked_rem(y) == Some(0) => x
                    .checked_div(y)
                    .map(Value::from)
                    .unwrap_or_else(|| float_value(x as f64 / y as f64)),
                (x, y) => float_value(x.as_f64() / y.as_f64()),
            })
        }
        BinaryOp::Pow => {
            let (a, b) = numbers(op, left, right)?;
            Ok(match (a, b) {
                (Num::Int(x), Num::Int(y)) if (0..=u32::MAX as i64).contains(&y) => x
                    .checked_pow(y as u32)
                    .map(Value::from)
                    .unwrap_or_else(|| float_value((x as f64).powf(y as f64))),
                (x, y) => float_value(x.as_f64().powf(y.as_f64())),
            })
        }
        BinaryOp::Eq | BinaryOp::NotEq => Ok(Value::Null),
    }
}

fn numbers(op: BinaryOp, left: &Value, right: &Value) -> Result<(Num, Num), ExpressionError> {
    match (as_num(left), as_num(right)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(mismatch(op.symbol(), left, right)),
    }
}

fn ordering(operator: &str, left: &Value, right: &Value) -> Result<Ordering, ExpressionError> {
    compare(left, right).ok_or_else(|| mismatch(operator, left, right))
}

fn mismatch(operator: &str, left: &Value, right: &Value) -> ExpressionError {
    ExpressionError::evaluation(format!(
        "cannot apply '{}' to {} and {}",
        operator,
        type_name(left),
        type_name(right)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::expression::parser::parse;
    use serde_json::json;

    fn eval(source: &str, context: Value) -> Result<Value, ExpressionError> {
        let context = match context {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        evaluate(&parse(source).unwrap(), &context)
    }

    fn eval_empty(source: &str) -> Value {
        eval(source, json!({})).unwrap()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval_empty("1 + 2 * 3"), json!(7));
        assert_eq!(eval_empty("(1 + 2) * 3"), json!(9));
        assert_eq!(eval_empty("10 / 4"), json!(2.5));
        assert_eq!(eval_empty("10 / 2"), json!(5));
        assert_eq!(eval_empty("2 ** 10"), json!(1024));
        assert_eq!(eval_empty("7 - 10"), json!(-3));
        assert_eq!(eval_empty("1.5 + 1.5"), json!(3));
        assert_eq!(eval_empty("1 / 0"), Value::Null);
    }

    #[test]
    fn test_string_concatenation() {
        let ctx = json!({"first": "Ada", "last": "Lovelace"});
        assert_eq!(
            eval("first + \" \" + last", ctx).unwrap(),
            json!("Ada Lovelace")
        );
    }

    #[test]
    fn test_variable_lookup() {
        let ctx = json!({"zeebeKey": 999, "order": {"id": "A-1", "lines": [{"sku": "x"}, {"sku": "y"}]}});
        assert_eq!(eval("zeebeKey", ctx.clone()).unwrap(), json!(999));
        assert_eq!(eval("order.id", ctx.clone()).unwrap(), json!("A-1"));
        assert_eq!(eval("order.missing", ctx.clone()).unwrap(), Value::Null);
        assert_eq!(eval("order.lines.sku", ctx.clone()).unwrap(), json!(["x", "y"]));
        assert_eq!(eval("order.lines[2].sku", ctx.clone()).unwrap(), json!("y"));
        assert_eq!(eval("order.lines[-1].sku", ctx.clone()).unwrap(), json!("y"));
        assert_eq!(eval("order.lines[3]", ctx).unwrap(), Value::Null);
    }

    #[test]
    fn test_unknown_variable() {
        let err = eval("missing + 1", json!({})).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::evaluation("no variable found with name 'missing'")
        );
    }

    #[test]
    fn test_filter_by_condition() {
        let ctx = json!({"items": [{"qty": 1}, {"qty": 5}, {"qty": 9}], "nums": [1, 2, 3, 4]});
        assert_eq!(
            eval("items[qty > 2].qty", ctx.clone()).unwrap(),
            json!([5, 9])
        );
        assert_eq!(eval("nums[item > 2]", ctx).unwrap(), json!([3, 4]));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval_empty("1 < 2"), json!(true));
        assert_eq!(eval_empty("\"a\" >= \"b\""), json!(false));
        assert_eq!(eval_empty("1 = 1.0"), json!(true));
        assert_eq!(eval_empty("\"1\" = 1"), json!(false));
        assert_eq!(eval_empty("null = null"), json!(true));
        assert_eq!(eval_empty("null < 1"), Value::Null);
        assert_eq!(eval_empty("5 between 1 and 5"), json!(true));
        assert_eq!(eval_empty("2 in [1, 2, 3]"), json!(true));
        assert_eq!(eval_empty("\"b\" in \"a\""), json!(false));
    }

    #[test]
    fn test_type_mismatch() {
        let err = eval("\"a\" - 1", json!({})).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::evaluation("cannot apply '-' to string and number")
        );

        let err = eval("\"a\" < 1", json!({})).unwrap_err();
        assert!(err.to_string().contains("cannot apply '<'"));
    }

    #[test]
    fn test_boolean_logic() {
        assert_eq!(eval_empty("true and false"), json!(false));
        assert_eq!(eval_empty("true or null"), json!(true));
        assert_eq!(eval_empty("false or null"), Value::Null);
        assert_eq!(eval_empty("null and false"), json!(false));
        assert_eq!(eval_empty("not(true)"), json!(false));
    }

    #[test]
    fn test_short_circuit_skips_unknown_names() {
        assert_eq!(eval_empty("false and missing"), json!(false));
        assert_eq!(eval_empty("true or missing"), json!(true));
    }

    #[test]
    fn test_if_expression() {
        let ctx = json!({"amount": 150});
        assert_eq!(
            eval("if amount > 100 then \"high\" else \"low\"", ctx).unwrap(),
            json!("high")
        );
        assert_eq!(eval_empty("if null then 1 else 2"), json!(2));
    }

    #[test]
    fn test_collections() {
        let ctx = json!({"id": 7});
        assert_eq!(
            eval("{id: id, tags: [\"a\", upper case(\"b\")]}", ctx).unwrap(),
            json!({"id": 7, "tags": ["a", "B"]})
        );
    }

    #[test]
    fn test_is_defined() {
        let ctx = json!({"present": null});
        assert_eq!(eval("is defined(present)", ctx.clone()).unwrap(), json!(true));
        assert_eq!(eval("is defined(absent)", ctx).unwrap(), json!(false));
    }

    #[test]
    fn test_negation() {
        let ctx = json!({"n": 4});
        assert_eq!(eval("-n", ctx).unwrap(), json!(-4));
        assert!(eval("-\"x\"", json!({})).is_err());
    }
}
