use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::graphql::{GraphqlError, QueryDocument, QueryExecutor};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for [`GraphqlClient`]
#[derive(Debug, Clone)]
pub struct GraphqlClientConfig {
    pub endpoint_url: String,
    /// Header attached to every request, e.g. `("Authorization", "Bearer ...")`
    pub authorization_header: Option<(String, String)>,
    pub request_timeout: Duration,
}

impl GraphqlClientConfig {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            authorization_header: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Attach an authorization header. Ignored unless both parts are non-empty.
    pub fn with_authorization(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value) = (key.into(), value.into());

        if !key.is_empty() && !value.is_empty() {
            self.authorization_header = Some((key, value));
        }
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlRequestBody<'a> {
    query: &'a str,
    variables: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation_name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponseBody {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphqlResponseError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponseError {
    #[serde(default)]
    message: String,
}

/// GraphQL-over-HTTP client posting JSON requests to a single endpoint
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    client: reqwest::Client,
    config: GraphqlClientConfig,
}

impl GraphqlClient {
    pub fn new(config: GraphqlClientConfig) -> Result<Self, GraphqlError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GraphqlError::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.config.endpoint_url
    }

    fn parse_response(body: GraphqlResponseBody) -> Result<Value, GraphqlError> {
        if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
            return Err(GraphqlError::remote(
                errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        body.data
            .ok_or_else(|| GraphqlError::invalid_response("response has no 'data' member"))
    }
}

#[async_trait]
impl QueryExecutor for GraphqlClient {
    async fn execute(
        &self,
        document: &QueryDocument,
        variables: &Map<String, Value>,
    ) -> Result<Value, GraphqlError> {
        let body = GraphqlRequestBody {
            query: document.source(),
            variables,
            operation_name: document.operation_name(),
        };

        let mut request = self.client.post(&self.config.endpoint_url).json(&body);

        if let Some((key, value)) = &self.config.authorization_header {
            request = request.header(key.as_str(), value.as_str());
        }

        debug!(endpoint = %self.config.endpoint_url, "Sending GraphQL request");

        let response = request
            .send()
            .await
            .map_err(|e| GraphqlError::transport(format!("Request failed: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(GraphqlError::transport(format!(
                "HTTP {}: {}",
                status, error_body
            )));
        }

        let body: GraphqlResponseBody = response.json().await.map_err(|e| {
            GraphqlError::invalid_response(format!("Failed to parse response: {}", e))
        })?;

        Self::parse_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ITEM_QUERY: &str = "query Item($id: ID){ item(id:$id){name} }";

    fn client_for(server: &MockServer) -> GraphqlClient {
        GraphqlClient::new(GraphqlClientConfig::new(format!("{}/graphql", server.uri()))).unwrap()
    }

    fn variables(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_authorization_requires_key_and_value() {
        let config = GraphqlClientConfig::new("http://localhost").with_authorization("", "token");
        assert!(config.authorization_header.is_none());

        let config =
            GraphqlClientConfig::new("http://localhost").with_authorization("X-Api-Key", "");
        assert!(config.authorization_header.is_none());

        let config =
            GraphqlClientConfig::new("http://localhost").with_authorization("X-Api-Key", "secret");
        assert_eq!(
            config.authorization_header,
            Some(("X-Api-Key".to_string(), "secret".to_string()))
        );
    }

    #[tokio::test]
    async fn test_execute_returns_data() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_json(json!({
                "query": ITEM_QUERY,
                "variables": {"id": "42"},
                "operationName": "Item"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"item": {"name": "Widget"}}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let document = QueryDocument::parse(ITEM_QUERY).unwrap();
        let data = client_for(&server)
            .execute(&document, &variables(json!({"id": "42"})))
            .await
            .unwrap();

        assert_eq!(data, json!({"item": {"name": "Widget"}}));
    }

    #[tokio::test]
    async fn test_anonymous_operation_omits_operation_name() {
        let server = MockServer::start().await;
        let query = "{ ping }";

        Mock::given(method("POST"))
            .and(body_json(json!({"query": query, "variables": {}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"ping": true}})))
            .expect(1)
            .mount(&server)
            .await;

        let document = QueryDocument::parse(query).unwrap();
        let data = client_for(&server)
            .execute(&document, &Map::new())
            .await
            .unwrap();

        assert_eq!(data, json!({"ping": true}));
    }

    #[tokio::test]
    async fn test_authorization_header_is_sent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let config = GraphqlClientConfig::new(server.uri())
            .with_authorization("Authorization", "Bearer abc");
        let client = GraphqlClient::new(config).unwrap();
        let document = QueryDocument::parse("{ ping }").unwrap();

        client.execute(&document, &Map::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_errors_array_is_remote_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{"message": "Item not found"}, {"message": "Access denied"}]
            })))
            .mount(&server)
            .await;

        let document = QueryDocument::parse(ITEM_QUERY).unwrap();
        let err = client_for(&server)
            .execute(&document, &Map::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GraphqlError::remote(vec!["Item not found".to_string(), "Access denied".to_string()])
        );
        assert_eq!(err.to_string(), "GraphQL error: Item not found; Access denied");
    }

    #[tokio::test]
    async fn test_empty_errors_array_is_ignored() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"ok": 1}, "errors": []})),
            )
            .mount(&server)
            .await;

        let document = QueryDocument::parse("{ ok }").unwrap();
        let data = client_for(&server)
            .execute(&document, &Map::new())
            .await
            .unwrap();

        assert_eq!(data, json!({"ok": 1}));
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let document = QueryDocument::parse("{ ok }").unwrap();
        let err = client_for(&server)
            .execute(&document, &Map::new())
            .await
            .unwrap_err();

        assert!(matches!(err, GraphqlError::Transport(ref message) if message.contains("502")));
    }

    #[tokio::test]
    async fn test_missing_data_is_invalid_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"extensions": {}})))
            .mount(&server)
            .await;

        let document = QueryDocument::parse("{ ok }").unwrap();
        let err = client_for(&server)
            .execute(&document, &Map::new())
            .await
            .unwrap_err();

        assert!(matches!(err, GraphqlError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = GraphqlClient::new(
            GraphqlClientConfig::new("http://127.0.0.1:1/graphql")
                .with_request_timeout(Duration::from_secs(2)),
        )
        .unwrap();
        let document = QueryDocument::parse("{ ok }").unwrap();

        let err = client.execute(&document, &Map::new()).await.unwrap_err();

        assert!(matches!(err, GraphqlError::Transport(_)));
    }
}
