//! Observability infrastructure - Prometheus metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    create_metrics_router, init_metrics, record_activation_error, record_job,
    record_jobs_in_flight, record_report_error, PrometheusMetrics, JOBS_TOTAL,
    JOB_DURATION_SECONDS,
};
