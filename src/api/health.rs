//! Health check endpoints for Kubernetes probes

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use super::state::ApiState;

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
}

/// Health check status
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Simple health check - returns 200 if the process is running
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check - healthy once the job source answered the last poll
pub async fn ready_check(State(state): State<ApiState>) -> impl IntoResponse {
    let worker = &state.worker_status;

    let job_source = if worker.is_ready() {
        HealthCheck {
            name: "job_source".to_string(),
            status: HealthStatus::Healthy,
            message: Some(format!(
                "polling '{}', {} job(s) in flight, {} handled",
                state.task_type,
                worker.in_flight(),
                worker.handled()
            )),
        }
    } else {
        HealthCheck {
            name: "job_source".to_string(),
            status: HealthStatus::Unhealthy,
            message: Some("job source not reachable yet".to_string()),
        }
    };

    let status = job_source.status;
    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(vec![job_source]),
    };

    let status_code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Liveness check - used by Kubernetes to detect crashes
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::to_bytes;
    use axum::response::Response;

    use crate::infrastructure::worker::WorkerStatus;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = health_check().await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert!(json.get("checks").is_none());
    }

    #[tokio::test]
    async fn test_ready_check_before_first_poll() {
        let state = ApiState::new(Arc::new(WorkerStatus::new()), "graphql");

        let response = ready_check(State(state)).await.into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["checks"][0]["name"], "job_source");
        assert_eq!(json["checks"][0]["status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_ready_check_after_poll() {
        let status = Arc::new(WorkerStatus::new());
        status.set_ready(true);
        let state = ApiState::new(status, "graphql");

        let response = ready_check(State(state)).await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_live_check() {
        assert_eq!(live_check().await.into_response().status(), StatusCode::OK);
    }
}
