use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::state::ApiState;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Create the health router, with the metrics endpoint when metrics are enabled
pub fn create_router(state: ApiState, metrics: Option<PrometheusMetrics>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .with_state(state);

    if let Some(metrics) = metrics {
        router = router.merge(create_metrics_router(metrics));
    }

    router.layer(TraceLayer::new_for_http())
}
