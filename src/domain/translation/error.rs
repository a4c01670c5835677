//! Translation error taxonomy

use thiserror::Error;

use crate::domain::expression::ExpressionError;
use crate::domain::graphql::GraphqlError;

/// Reasons a job cannot be turned into a successful GraphQL response
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslationError {
    /// A required header is absent; no query is executed
    #[error("Missing required header '{0}'")]
    ConfigurationMissing(String),

    /// A binding expression failed to parse or evaluate
    #[error("Failed to resolve variable '{variable}': {source}")]
    DirectiveResolution {
        variable: String,
        #[source]
        source: ExpressionError,
    },

    /// The GraphQL endpoint could not be reached
    #[error(transparent)]
    Transport(GraphqlError),

    /// The GraphQL endpoint reported errors
    #[error(transparent)]
    RemoteQuery(GraphqlError),

    /// Anything else raised by a collaborator
    #[error("{0}")]
    Unhandled(String),
}

impl TranslationError {
    pub fn configuration_missing(header: impl Into<String>) -> Self {
        Self::ConfigurationMissing(header.into())
    }

    pub fn directive_resolution(variable: impl Into<String>, source: ExpressionError) -> Self {
        Self::DirectiveResolution {
            variable: variable.into(),
            source,
        }
    }

    pub fn unhandled(message: impl Into<String>) -> Self {
        Self::Unhandled(message.into())
    }

    /// Stable name of the error kind, used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing(_) => "configuration_missing",
            Self::DirectiveResolution { .. } => "directive_resolution",
            Self::Transport(_) => "transport",
            Self::RemoteQuery(_) => "remote_query",
            Self::Unhandled(_) => "unhandled",
        }
    }
}

impl From<GraphqlError> for TranslationError {
    fn from(error: GraphqlError) -> Self {
        match error {
            GraphqlError::Transport(_) => Self::Transport(error),
            GraphqlError::Remote { .. } => Self::RemoteQuery(error),
            other => Self::Unhandled(other.to_string()),
        }
    }
}
