//! Shared state for the HTTP endpoints

use std::sync::Arc;

use crate::infrastructure::worker::WorkerStatus;

#[derive(Clone)]
pub struct ApiState {
    pub worker_status: Arc<WorkerStatus>,
    pub task_type: String,
}

impl ApiState {
    pub fn new(worker_status: Arc<WorkerStatus>, task_type: impl Into<String>) -> Self {
        Self {
            worker_status,
            task_type: task_type.into(),
        }
    }
}
