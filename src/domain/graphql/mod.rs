//! GraphQL domain module
//!
//! The document is parsed once per job and executed together with the
//! resolved variables by a [`QueryExecutor`].

mod document;
mod error;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde_json::{Map, Value};

pub use document::{OperationKind, QueryDocument};
pub use error::GraphqlError;

/// Executes GraphQL requests against a remote endpoint
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a single request/response round trip, returning the `data` member
    async fn execute(
        &self,
        document: &QueryDocument,
        variables: &Map<String, Value>,
    ) -> Result<Value, GraphqlError>;
}
