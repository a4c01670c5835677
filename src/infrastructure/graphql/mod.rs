//! GraphQL HTTP transport

mod client;

pub use client::{GraphqlClient, GraphqlClientConfig};
