use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::observability::MetricsConfig;

/// Well-known environment variables and the keys they override
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("GRAPHQL_ENDPOINT_URL", "graphql.endpoint_url"),
    ("GRAPHQL_AUTHORIZATION_HEADER_KEY", "graphql.authorization_header_key"),
    ("GRAPHQL_AUTHORIZATION_HEADER_VALUE", "graphql.authorization_header_value"),
    ("ZEEBE_TASK_TYPE", "worker.task_type"),
    ("ZEEBE_REST_ADDRESS", "zeebe.rest_address"),
    ("ZEEBE_CLIENT_ID", "zeebe.client_id"),
    ("ZEEBE_CLIENT_SECRET", "zeebe.client_secret"),
    ("ZEEBE_AUTHORIZATION_SERVER_URL", "zeebe.authorization_server_url"),
    ("ZEEBE_TOKEN_AUDIENCE", "zeebe.token_audience"),
];

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub graphql: GraphqlConfig,
    #[serde(default)]
    pub zeebe: ZeebeConfig,
    #[serde(default)]
    pub worker: WorkerSettings,
}

/// Health and metrics HTTP server
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Outbound GraphQL endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphqlConfig {
    pub endpoint_url: String,
    pub authorization_header_key: Option<String>,
    pub authorization_header_value: Option<String>,
    pub request_timeout_ms: u64,
}

/// Zeebe REST gateway and its optional OAuth client credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ZeebeConfig {
    pub rest_address: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub authorization_server_url: Option<String>,
    pub token_audience: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub task_type: String,
    pub name: String,
    pub max_concurrent_jobs: usize,
    pub max_jobs_to_activate: u32,
    pub job_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            enabled: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for GraphqlConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            authorization_header_key: None,
            authorization_header_value: None,
            request_timeout_ms: 30_000,
        }
    }
}

impl GraphqlConfig {
    /// The authorization header, when both its name and value are set
    pub fn authorization_header(&self) -> Option<(&str, &str)> {
        let key = self.authorization_header_key.as_deref().filter(|k| !k.is_empty())?;
        let value = self.authorization_header_value.as_deref().filter(|v| !v.is_empty())?;

        Some((key, value))
    }
}

impl Default for ZeebeConfig {
    fn default() -> Self {
        Self {
            rest_address: "http://localhost:8080".to_string(),
            client_id: None,
            client_secret: None,
            authorization_server_url: None,
            token_audience: "zeebe.camunda.io".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl ZeebeConfig {
    /// Whether any OAuth setting is present
    pub fn uses_oauth(&self) -> bool {
        [&self.client_id, &self.client_secret, &self.authorization_server_url]
            .iter()
            .any(|value| value.as_deref().is_some_and(|v| !v.is_empty()))
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            task_type: "graphql".to_string(),
            name: "zeebe-graphql-worker".to_string(),
            max_concurrent_jobs: 32,
            max_jobs_to_activate: 32,
            job_timeout_ms: 30_000,
            poll_interval_ms: 500,
            request_timeout_ms: 10_000,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Load configuration, resolving the well-known variables through `lookup`
    pub fn load_with<F>(lookup: F) -> Result<Self, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        for (variable, key) in ENV_OVERRIDES {
            let value = lookup(variable).filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Reject settings the worker cannot start with
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.graphql.endpoint_url.trim().is_empty() {
            return Err(DomainError::configuration(
                "GRAPHQL_ENDPOINT_URL must be set",
            ));
        }

        if self.worker.task_type.trim().is_empty() {
            return Err(DomainError::configuration("worker task type must not be empty"));
        }

        if self.worker.max_concurrent_jobs == 0 {
            return Err(DomainError::validation(
                "worker.max_concurrent_jobs must be greater than zero",
            ));
        }

        if self.worker.max_jobs_to_activate == 0 {
            return Err(DomainError::validation(
                "worker.max_jobs_to_activate must be greater than zero",
            ));
        }

        if self.zeebe.uses_oauth() {
            let missing: Vec<&str> = [
                ("ZEEBE_CLIENT_ID", &self.zeebe.client_id),
                ("ZEEBE_CLIENT_SECRET", &self.zeebe.client_secret),
                ("ZEEBE_AUTHORIZATION_SERVER_URL", &self.zeebe.authorization_server_url),
            ]
            .into_iter()
            .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
            .map(|(name, _)| name)
            .collect();

            if !missing.is_empty() {
                return Err(DomainError::configuration(format!(
                    "incomplete OAuth settings, missing {}",
                    missing.join(", ")
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        AppConfig::load_with(|name| vars.get(name).cloned()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]);

        assert_eq!(config.worker.task_type, "graphql");
        assert_eq!(config.worker.max_concurrent_jobs, 32);
        assert_eq!(config.zeebe.rest_address, "http://localhost:8080");
        assert_eq!(config.zeebe.token_audience, "zeebe.camunda.io");
        assert!(config.graphql.endpoint_url.is_empty());
        assert!(config.graphql.authorization_header().is_none());
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_well_known_variables() {
        let config = load(&[
            ("GRAPHQL_ENDPOINT_URL", "http://api.local/graphql"),
            ("GRAPHQL_AUTHORIZATION_HEADER_KEY", "Authorization"),
            ("GRAPHQL_AUTHORIZATION_HEADER_VALUE", "Bearer abc"),
            ("ZEEBE_TASK_TYPE", "inventory-graphql"),
            ("ZEEBE_REST_ADDRESS", "http://zeebe:8080"),
        ]);

        assert_eq!(config.graphql.endpoint_url, "http://api.local/graphql");
        assert_eq!(
            config.graphql.authorization_header(),
            Some(("Authorization", "Bearer abc"))
        );
        assert_eq!(config.worker.task_type, "inventory-graphql");
        assert_eq!(config.zeebe.rest_address, "http://zeebe:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_task_type_falls_back_to_default() {
        let config = load(&[("ZEEBE_TASK_TYPE", "")]);

        assert_eq!(config.worker.task_type, "graphql");
    }

    #[test]
    fn test_half_configured_authorization_header_is_ignored() {
        let config = load(&[("GRAPHQL_AUTHORIZATION_HEADER_KEY", "Authorization")]);

        assert!(config.graphql.authorization_header().is_none());
    }

    #[test]
    fn test_missing_endpoint_is_rejected() {
        let err = load(&[]).validate().unwrap_err();

        assert_eq!(
            err.to_string(),
            "Configuration error: GRAPHQL_ENDPOINT_URL must be set"
        );
    }

    #[test]
    fn test_incomplete_oauth_is_rejected() {
        let config = load(&[
            ("GRAPHQL_ENDPOINT_URL", "http://api.local/graphql"),
            ("ZEEBE_CLIENT_ID", "worker"),
        ]);

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("ZEEBE_CLIENT_SECRET"));
        assert!(err.to_string().contains("ZEEBE_AUTHORIZATION_SERVER_URL"));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let mut config = load(&[("GRAPHQL_ENDPOINT_URL", "http://api.local/graphql")]);
        config.worker.max_concurrent_jobs = 0;

        assert!(matches!(
            config.validate(),
            Err(DomainError::Validation { .. })
        ));
    }
}
