//! Infrastructure layer - adapters for external systems

pub mod graphql;
pub mod logging;
pub mod observability;
pub mod worker;
pub mod zeebe;

pub use graphql::{GraphqlClient, GraphqlClientConfig};
pub use worker::{JobWorker, WorkerConfig, WorkerStatus};
pub use zeebe::{OAuthCredentials, ZeebeClient, ZeebeClientConfig};
