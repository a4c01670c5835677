//! GraphQL error types

use thiserror::Error;

/// Errors raised while preparing or executing a GraphQL request
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphqlError {
    #[error("Invalid GraphQL document: {0}")]
    InvalidDocument(String),

    #[error("GraphQL transport error: {0}")]
    Transport(String),

    #[error("GraphQL error: {}", messages.join("; "))]
    Remote { messages: Vec<String> },

    #[error("Invalid GraphQL response: {0}")]
    InvalidResponse(String),
}

impl GraphqlError {
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn remote(messages: Vec<String>) -> Self {
        Self::Remote { messages }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphqlError::remote(vec![
            "Item not found".to_string(),
            "Access denied".to_string(),
        ]);
        assert_eq!(err.to_string(), "GraphQL error: Item not found; Access denied");

        let err = GraphqlError::transport("HTTP 502 Bad Gateway: upstream down");
        assert_eq!(
            err.to_string(),
            "GraphQL transport error: HTTP 502 Bad Gateway: upstream down"
        );
    }
}
