//! Job polling loop with bounded concurrency

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use super::status::WorkerStatus;
use crate::domain::job::{ActivateJobsRequest, Job, JobOutcome, JobSource};
use crate::domain::translation::JobTranslator;
use crate::infrastructure::observability::{
    record_activation_error, record_job, record_jobs_in_flight, record_report_error,
};

/// Settings for one [`JobWorker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub task_type: String,
    pub worker_name: String,
    /// Upper bound on jobs handled at the same time
    pub max_concurrent_jobs: usize,
    /// Upper bound on jobs requested per activation poll
    pub max_jobs_to_activate: u32,
    pub job_timeout: Duration,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            task_type: "graphql".to_string(),
            worker_name: "zeebe-graphql-worker".to_string(),
            max_concurrent_jobs: 32,
            max_jobs_to_activate: 32,
            job_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Polls the job source and hands every job to the translator.
///
/// Each job runs in its own task holding a semaphore permit, so at most
/// `max_concurrent_jobs` are in flight and a poll never asks for more jobs
/// than there are free permits.
pub struct JobWorker {
    source: Arc<dyn JobSource>,
    translator: Arc<JobTranslator>,
    config: WorkerConfig,
    semaphore: Arc<Semaphore>,
    tracker: TaskTracker,
    status: Arc<WorkerStatus>,
}

impl JobWorker {
    pub fn new(
        source: Arc<dyn JobSource>,
        translator: Arc<JobTranslator>,
        config: WorkerConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));

        Self {
            source,
            translator,
            config,
            semaphore,
            tracker: TaskTracker::new(),
            status: Arc::new(WorkerStatus::new()),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn status(&self) -> Arc<WorkerStatus> {
        Arc::clone(&self.status)
    }

    /// Run until `shutdown` is cancelled, then wait for in-flight jobs
    #[tracing::instrument(
        skip(self, shutdown),
        fields(task_type = %self.config.task_type, worker = %self.config.worker_name),
        name = "job_worker"
    )]
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            max_concurrent_jobs = self.config.max_concurrent_jobs,
            "Starting job worker"
        );

        loop {
            let permits = tokio::select! {
                biased;

                () = shutdown.cancelled() => break,
                permits = self.reserve_capacity() => match permits {
                    Some(permits) => permits,
                    None => {
                        error!("Semaphore closed, stopping worker");
                        break;
                    }
                },
            };

            let request = self.activation_request(permits.len());

            let result = tokio::select! {
                biased;

                () = shutdown.cancelled() => break,
                result = self.source.activate_jobs(&request) => result,
            };

            match result {
                Ok(jobs) if jobs.is_empty() => {
                    self.status.set_ready(true);
                    drop(permits);
                    self.idle(&shutdown).await;
                }
                Ok(jobs) => {
                    self.status.set_ready(true);
                    debug!(jobs = jobs.len(), "Dispatching activated jobs");
                    self.dispatch(jobs, permits).await;
                }
                Err(e) => {
                    self.status.set_ready(false);
                    record_activation_error(&self.config.task_type);
                    error!(error = %e, "Failed to activate jobs");
                    drop(permits);
                    self.idle(&shutdown).await;
                }
            }
        }

        info!(in_flight = self.status.in_flight(), "Shutdown requested, draining jobs");
        self.tracker.close();
        self.tracker.wait().await;
        info!("Job worker stopped");
    }

    /// Wait for one free permit, then take every other free one up to the poll limit
    async fn reserve_capacity(&self) -> Option<Vec<OwnedSemaphorePermit>> {
        let first = Arc::clone(&self.semaphore).acquire_owned().await.ok()?;
        let limit = self.config.max_jobs_to_activate.max(1) as usize;

        let mut permits = vec![first];

        while permits.len() < limit {
            match Arc::clone(&self.semaphore).try_acquire_owned() {
                Ok(permit) => permits.push(permit),
                Err(_) => break,
            }
        }

        Some(permits)
    }

    fn activation_request(&self, capacity: usize) -> ActivateJobsRequest {
        ActivateJobsRequest {
            task_type: self.config.task_type.clone(),
            worker: self.config.worker_name.clone(),
            timeout_ms: self.config.job_timeout.as_millis() as u64,
            max_jobs_to_activate: capacity as u32,
            request_timeout_ms: self.config.request_timeout.as_millis() as u64,
        }
    }

    async fn idle(&self, shutdown: &CancellationToken) {
        tokio::select! {
            () = shutdown.cancelled() => {}
            () = tokio::time::sleep(self.config.poll_interval) => {}
        }
    }

    async fn dispatch(&self, jobs: Vec<Job>, mut permits: Vec<OwnedSemaphorePermit>) {
        for job in jobs {
            // The source may hand out more jobs than asked for
            let permit = match permits.pop() {
                Some(permit) => permit,
                None => match Arc::clone(&self.semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        warn!(job_key = job.key, "Semaphore closed, dropping job");
                        continue;
                    }
                },
            };

            self.spawn_job(job, permit);
        }
    }

    fn spawn_job(&self, job: Job, permit: OwnedSemaphorePermit) {
        let source = Arc::clone(&self.source);
        let translator = Arc::clone(&self.translator);
        let status = Arc::clone(&self.status);

        self.tracker.spawn(async move {
            // Hold permit until the outcome is reported
            let _permit = permit;
            handle_job(job, &translator, source.as_ref(), &status).await;
        });
    }
}

/// Process one job and report its outcome exactly once
const PANIC_MESSAGE: &str = "job handling panicked";

async fn handle_job(
    job: Job,
    translator: &JobTranslator,
    source: &dyn JobSource,
    status: &WorkerStatus,
) {
    record_jobs_in_flight(&job.task_type, status.job_started());
    let started = Instant::now();

    // A panic inside one job must not leak its permit or in-flight count
    let outcome = match AssertUnwindSafe(translator.process(&job)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(_) => {
            error!(job_key = job.key, "Job handling panicked");
            JobOutcome::failed(PANIC_MESSAGE)
        }
    };
    let label = outcome.label();

    if let Err(e) = outcome.report(&job, source).await {
        record_report_error(&job.task_type);
        error!(job_key = job.key, error = %e, "Failed to report job outcome");
    }

    record_job(&job.task_type, label, started.elapsed());
    record_jobs_in_flight(&job.task_type, status.job_finished());
}
