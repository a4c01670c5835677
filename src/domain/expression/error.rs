//! Expression error types

use thiserror::Error;

/// Errors raised while parsing or evaluating an expression
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression at offset {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("Failed to evaluate expression: {0}")]
    Evaluation(String),
}

impl ExpressionError {
    pub fn parse(offset: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            message: message.into(),
        }
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        Self::Evaluation(message.into())
    }

    /// Whether the error was raised by the parser
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExpressionError::parse(4, "unexpected token ')'");
        assert_eq!(
            err.to_string(),
            "Failed to parse expression at offset 4: unexpected token ')'"
        );

        let err = ExpressionError::evaluation("unknown variable 'foo'");
        assert_eq!(
            err.to_string(),
            "Failed to evaluate expression: unknown variable 'foo'"
        );
    }

    #[test]
    fn test_is_parse_error() {
        assert!(ExpressionError::parse(0, "x").is_parse_error());
        assert!(!ExpressionError::evaluation("x").is_parse_error());
    }
}
