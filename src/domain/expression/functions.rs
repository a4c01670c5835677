//! Built-in functions

use serde_json::Value;

use super::error::ExpressionError;
use super::value::{as_num, compare, float_value, to_text, type_name, Num};

/// Functions callable from expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Not,
    String,
    Number,
    StringLength,
    UpperCase,
    LowerCase,
    Substring,
    Contains,
    StartsWith,
    EndsWith,
    Count,
    Sum,
    Min,
    Max,
    Abs,
    Floor,
    Ceiling,
    IsDefined,
    GetValue,
}

const ALL: [Function; 19] = [
    Function::Not,
    Function::String,
    Function::Number,
    Function::StringLength,
    Function::UpperCase,
    Function::LowerCase,
    Function::Substring,
    Function::Contains,
    Function::StartsWith,
    Function::EndsWith,
    Function::Count,
    Function::Sum,
    Function::Min,
    Function::Max,
    Function::Abs,
    Function::Floor,
    Function::Ceiling,
    Function::IsDefined,
    Function::GetValue,
];

impl Function {
    /// Name as written in expressions
    pub fn name(&self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::String => "string",
            Self::Number => "number",
            Self::StringLength => "string length",
            Self::UpperCase => "upper case",
            Self::LowerCase => "lower case",
            Self::Substring => "substring",
            Self::Contains => "contains",
            Self::StartsWith => "starts with",
            Self::EndsWith => "ends with",
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Abs => "abs",
            Self::Floor => "floor",
            Self::Ceiling => "ceiling",
            Self::IsDefined => "is defined",
            Self::GetValue => "get value",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Longest number of words in any function name
    pub fn max_name_words() -> usize {
        ALL.iter()
            .map(|f| f.name().split(' ').count())
            .max()
            .unwrap_or(1)
    }

    /// Call the function with already evaluated arguments.
    ///
    /// `is defined` is resolved by the evaluator since it has to observe
    /// failed lookups; calling it here treats its argument as defined.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, ExpressionError> {
        match self {
            Self::Not => {
                let [value] = self.exact::<1>(args)?;
                Ok(match value {
                    Value::Bool(b) => Value::Bool(!b),
                    _ => Value::Null,
                })
            }
            Self::String => {
                let [value] = self.exact::<1>(args)?;
                Ok(to_text(&value).map(Value::String).unwrap_or(Value::Null))
            }
            Self::Number => {
                let [value] = self.exact::<1>(args)?;
                Ok(match value {
                    Value::Number(_) => value,
                    Value::String(s) => parse_number(s.trim()),
                    _ => Value::Null,
                })
            }
            Self::StringLength => {
                let [value] = self.exact::<1>(args)?;
                let text = self.string_arg(&value)?;
                Ok(Value::from(text.chars().count()))
            }
            Self::UpperCase => {
                let [value] = self.exact::<1>(args)?;
                Ok(Value::String(self.string_arg(&value)?.to_uppercase()))
            }
            Self::LowerCase => {
                let [value] = self.exact::<1>(args)?;
                Ok(Value::String(self.string_arg(&value)?.to_lowercase()))
            }
            Self::Substring => self.substring(args),
            Self::Contains | Self::StartsWith | Self::EndsWith => {
                let [text, pattern] = self.exact::<2>(args)?;
                let text = self.string_arg(&text)?;
                let pattern = self.string_arg(&pattern)?;
                let result = match self {
                    Self::Contains => text.contains(pattern),
                    Self::StartsWith => text.starts_with(pattern),
                    _ => text.ends_with(pattern),
                };
                Ok(Value::Bool(result))
            }
            Self::Count => {
                let [value] = self.exact::<1>(args)?;
                Ok(Value::from(self.list_arg(&value)?.len()))
            }
            Self::Sum => {
                let items = self.collect_items(args)?;
                let mut total = Num::Int(0);
                for item in &items {
                    let n = as_num(item).ok_or_else(|| self.type_error("number", item))?;
                    total = add_numbers(total, n);
                }
                Ok(total.into_value())
            }
            Self::Min | Self::Max => {
                let items = self.collect_items(args)?;
                let mut best: Option<Value> = None;
                for item in items {
                    best = match best {
                        None => Some(item),
                        Some(current) => {
                            let ordering = compare(&item, &current).ok_or_else(|| {
                                ExpressionError::evaluation(format!(
                                    "{}() cannot compare {} with {}",
                                    self.name(),
                                    type_name(&item),
                                    type_name(&current)
                                ))
                            })?;
                            let replace = match self {
                                Self::Min => ordering.is_lt(),
                                _ => ordering.is_gt(),
                            };
                            Some(if replace { item } else { current })
                        }
                    };
                }
                Ok(best.unwrap_or(Value::Null))
            }
            Self::Abs | Self::Floor | Self::Ceiling => {
                let [value] = self.exact::<1>(args)?;
                let n = as_num(&value).ok_or_else(|| self.type_error("number", &value))?;
                Ok(match (self, n) {
                    (Self::Abs, Num::Int(i)) => i
                        .checked_abs()
                        .map(Value::from)
                        .unwrap_or_else(|| float_value((i as f64).abs())),
                    (Self::Abs, Num::Float(f)) => float_value(f.abs()),
                    (_, Num::Int(i)) => Value::from(i),
                    (Self::Floor, Num::Float(f)) => float_value(f.floor()),
                    (_, Num::Float(f)) => float_value(f.ceil()),
                })
            }
            Self::IsDefined => {
                self.exact::<1>(args)?;
                Ok(Value::Bool(true))
            }
            Self::GetValue => {
                let [context, key] = self.exact::<2>(args)?;
                let key = self.string_arg(&key)?;
                match context {
                    Value::Object(map) => Ok(map.get(key).cloned().unwrap_or(Value::Null)),
                    Value::Null => Ok(Value::Null),
                    other => Err(self.type_error("context", &other)),
                }
            }
        }
    }

    fn substring(&self, args: Vec<Value>) -> Result<Value, ExpressionError> {
        if args.len() != 2 && args.len() != 3 {
            return Err(self.arity_error("2 or 3", args.len()));
        }

        let chars: Vec<char> = self.string_arg(&args[0])?.chars().collect();
        let start = self.integer_arg(&args[1])?;
        let len = chars.len() as i64;

        // 1-based, negative positions count from the end
        let begin = if start > 0 { start - 1 } else { len + start };
        let begin = begin.clamp(0, len);

        let end = match args.get(2) {
            Some(length) => {
                let length = self.integer_arg(length)?;
                if length < 0 {
                    return Err(ExpressionError::evaluation(
                        "substring() length must not be negative",
                    ));
                }
                begin.saturating_add(length).min(len)
            }
            None => len,
        }
        .max(begin);

        Ok(Value::String(
            chars[begin as usize..end as usize].iter().collect(),
        ))
    }

    fn exact<const N: usize>(&self, args: Vec<Value>) -> Result<[Value; N], ExpressionError> {
        let count = args.len();
        args.try_into()
            .map_err(|_| self.arity_error(&N.to_string(), count))
    }

    /// Either a single list argument or the arguments themselves
    fn collect_items(&self, args: Vec<Value>) -> Result<Vec<Value>, ExpressionError> {
        match args.len() {
            0 => Err(self.arity_error("at least 1", 0)),
            1 => match args.into_iter().next() {
                Some(Value::Array(items)) => Ok(items),
                Some(other) => Ok(vec![other]),
                None => Ok(Vec::new()),
            },
            _ => Ok(args),
        }
    }

    fn string_arg<'a>(&self, value: &'a Value) -> Result<&'a str, ExpressionError> {
        value
            .as_str()
            .ok_or_else(|| self.type_error("string", value))
    }

    fn list_arg<'a>(&self, value: &'a Value) -> Result<&'a Vec<Value>, ExpressionError> {
        value
            .as_array()
            .ok_or_else(|| self.type_error("list", value))
    }

    fn integer_arg(&self, value: &Value) -> Result<i64, ExpressionError> {
        match as_num(value) {
            Some(Num::Int(i)) => Ok(i),
            Some(Num::Float(f)) if f.fract() == 0.0 => Ok(f as i64),
            _ => Err(self.type_error("integer", value)),
        }
    }

    fn type_error(&self, expected: &str, actual: &Value) -> ExpressionError {
        ExpressionError::evaluation(format!(
            "{}() expects a {} but got {}",
            self.name(),
            expected,
            type_name(actual)
        ))
    }

    fn arity_error(&self, expected: &str, actual: usize) -> ExpressionError {
        ExpressionError::evaluation(format!(
            "{}() expects {} argument(s) but got {}",
            self.name(),
            expected,
            actual
        ))
    }
}

/// Add two numbers, staying integral unless the sum overflows
pub fn add_numbers(a: Num, b: Num) -> Num {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => x
            .checked_add(y)
            .map(Num::Int)
            .unwrap_or(Num::Float(x as f64 + y as f64)),
        (x, y) => Num::Float(x.as_f64() + y.as_f64()),
    }
}

fn parse_number(text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }

    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => float_value(f),
        _ => Value::Null,
    }
}
