//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;

pub const JOBS_TOTAL: &str = "graphql_worker_jobs_total";
pub const JOB_DURATION_SECONDS: &str = "graphql_worker_job_duration_seconds";
pub const JOBS_IN_FLIGHT: &str = "graphql_worker_jobs_in_flight";
pub const ACTIVATION_ERRORS_TOTAL: &str = "graphql_worker_activation_errors_total";
pub const REPORT_ERRORS_TOTAL: &str = "graphql_worker_report_errors_total";

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
    path: String,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            register_default_metrics();

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
                path: config.path.clone(),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

fn register_default_metrics() {
    gauge!("graphql_worker_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics) -> Router {
    let path = metrics.path().to_string();

    Router::new()
        .route(&path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record a handled job
pub fn record_job(task_type: &str, outcome: &str, duration: Duration) {
    let labels = [
        ("task_type", task_type.to_string()),
        ("outcome", outcome.to_string()),
    ];

    counter!(JOBS_TOTAL, &labels).increment(1);
    histogram!(JOB_DURATION_SECONDS, &labels).record(duration.as_secs_f64());
}

/// Track the number of jobs currently being handled
pub fn record_jobs_in_flight(task_type: &str, count: usize) {
    gauge!(JOBS_IN_FLIGHT, "task_type" => task_type.to_string()).set(count as f64);
}

pub fn record_activation_error(task_type: &str) {
    counter!(ACTIVATION_ERRORS_TOTAL, "task_type" => task_type.to_string()).increment(1);
}

pub fn record_report_error(task_type: &str) {
    counter!(REPORT_ERRORS_TOTAL, "task_type" => task_type.to_string()).increment(1);
}
