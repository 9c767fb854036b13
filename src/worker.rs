//! Worker process: one prewarm, then a bounded pool of per-room jobs.
//!
//! A [`Worker`] is registered with two hooks. The prewarm hook runs once
//! before any job is accepted and produces the [`PrewarmedResources`] every
//! job shares. The entrypoint hook runs once per [`JobRequest`] with a
//! [`JobContext`] carrying those resources.

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::room::Room;
use crate::startup::{self, PrewarmedResources};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Per-process initialization hook.
pub type PrewarmFn = Arc<dyn Fn(&AgentConfig) -> Result<PrewarmedResources> + Send + Sync>;

/// Per-job hook.
pub type EntrypointFn = Arc<dyn Fn(JobContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// The hooks a worker runs.
#[derive(Clone)]
pub struct WorkerOptions {
    prewarm: PrewarmFn,
    entrypoint: EntrypointFn,
}

impl WorkerOptions {
    /// Run `entrypoint` per job. Prewarm defaults to [`startup::prewarm`].
    pub fn new<F, Fut>(entrypoint: F) -> Self
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            prewarm: Arc::new(startup::prewarm),
            entrypoint: Arc::new(move |ctx: JobContext| -> BoxFuture<'static, Result<()>> {
                entrypoint(ctx).boxed()
            }),
        }
    }

    pub fn with_prewarm<F>(mut self, prewarm: F) -> Self
    where
        F: Fn(&AgentConfig) -> Result<PrewarmedResources> + Send + Sync + 'static,
    {
        self.prewarm = Arc::new(prewarm);
        self
    }
}

/// A dispatched conversation: one room to serve.
pub struct JobRequest {
    pub job_id: String,
    pub room: Arc<dyn Room>,
}

impl JobRequest {
    pub fn new(room: Arc<dyn Room>) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            room,
        }
    }
}

/// Everything an entrypoint gets for one job.
#[derive(Clone)]
pub struct JobContext {
    pub job_id: String,
    pub room: Arc<dyn Room>,
    /// Resources loaded by the prewarm hook.
    pub proc: Arc<PrewarmedResources>,
    pub config: Arc<AgentConfig>,
    /// Cancelled when the worker shuts down.
    pub shutdown: CancellationToken,
}

impl JobContext {
    /// Connect the job's room.
    ///
    /// # Errors
    ///
    /// Propagates the room's connection error.
    pub async fn connect(&self) -> Result<()> {
        self.room.connect().await
    }
}

/// Job outcome counts for one worker run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub jobs_completed: usize,
    pub jobs_failed: usize,
}

impl WorkerReport {
    fn record(&mut self, finished: std::result::Result<(String, Result<()>), JoinError>) {
        match finished {
            Ok((job_id, Ok(()))) => {
                self.jobs_completed += 1;
                info!(%job_id, "job finished");
            }
            Ok((job_id, Err(e))) => {
                self.jobs_failed += 1;
                warn!(%job_id, "job failed: {e}");
            }
            Err(e) => {
                self.jobs_failed += 1;
                error!("job task aborted: {e}");
            }
        }
    }
}

/// Long-lived process serving dispatched jobs.
pub struct Worker {
    config: Arc<AgentConfig>,
    options: WorkerOptions,
}

impl Worker {
    pub fn new(config: Arc<AgentConfig>, options: WorkerOptions) -> Self {
        Self { config, options }
    }

    /// Prewarm, then serve jobs until `jobs` closes or `cancel` fires.
    /// In-flight jobs are awaited before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if prewarm fails. Job failures are counted in the
    /// report and never stop the worker.
    pub async fn run(
        self,
        mut jobs: mpsc::Receiver<JobRequest>,
        cancel: CancellationToken,
    ) -> Result<WorkerReport> {
        let prewarm = Arc::clone(&self.options.prewarm);
        let config = Arc::clone(&self.config);
        let resources = tokio::task::spawn_blocking(move || prewarm(&config))
            .await
            .map_err(|e| AgentError::Worker(format!("prewarm task failed: {e}")))??;
        let resources = Arc::new(resources);

        let limit = self.config.worker.max_concurrent_jobs.max(1);
        let permits = Arc::new(Semaphore::new(limit));
        let mut running = JoinSet::new();
        let mut report = WorkerReport::default();
        info!(max_concurrent_jobs = limit, "worker ready");

        loop {
            let request = tokio::select! {
                () = cancel.cancelled() => break,
                Some(finished) = running.join_next(), if !running.is_empty() => {
                    report.record(finished);
                    continue;
                }
                request = jobs.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };

            let permit = tokio::select! {
                () = cancel.cancelled() => {
                    warn!(job_id = %request.job_id, "worker stopping, job not started");
                    break;
                }
                permit = Arc::clone(&permits).acquire_owned() => permit
                    .map_err(|e| AgentError::Worker(format!("job limiter closed: {e}")))?,
            };

            let ctx = JobContext {
                job_id: request.job_id,
                room: request.room,
                proc: Arc::clone(&resources),
                config: Arc::clone(&self.config),
                shutdown: cancel.child_token(),
            };
            let entrypoint = Arc::clone(&self.options.entrypoint);
            running.spawn(async move {
                let _permit = permit;
                let job_id = ctx.job_id.clone();
                info!(%job_id, room = %ctx.room.name(), "job started");
                let result = entrypoint(ctx).await;
                (job_id, result)
            });
        }

        if !running.is_empty() {
            info!(in_flight = running.len(), "worker stopping, waiting for jobs");
        }
        while let Some(finished) = running.join_next().await {
            report.record(finished);
        }

        info!(
            completed = report.jobs_completed,
            failed = report.jobs_failed,
            "worker stopped"
        );
        Ok(report)
    }
}
