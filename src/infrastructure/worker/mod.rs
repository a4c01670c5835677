//! Background job worker

mod job_worker;
mod status;

pub use job_worker::{JobWorker, WorkerConfig};
pub use status::WorkerStatus;
