mod app_config;

pub use app_config::{
    AppConfig, GraphqlConfig, LogFormat, LoggingConfig, ServerConfig, WorkerSettings, ZeebeConfig,
};
