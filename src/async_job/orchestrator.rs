//! Async job orchestration
//!
//! Starts one set of jobs per slice, polls them until every job of a slice
//! is terminal, and hands completed partitions to the caller.

use super::job::{AsyncJob, AsyncJobStatus};
use super::partition::AsyncPartition;
use super::repository::JobRepository;
use crate::error::{Error, Result};
use crate::partition::StreamSlice;
use crate::types::JsonValue;
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Polling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Pause between two status polls, in seconds
    pub poll_interval_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
        }
    }
}

impl OrchestratorConfig {
    /// Set the poll interval
    #[must_use]
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Drives async jobs for a fixed set of slices
///
/// Single threaded: one polling loop, no parallelism of its own. The first
/// partition that fails or times out aborts the whole run.
pub struct AsyncJobOrchestrator {
    repository: Arc<dyn JobRepository>,
    slices: Vec<StreamSlice>,
    config: OrchestratorConfig,
}

impl AsyncJobOrchestrator {
    /// Create an orchestrator over `slices`
    pub fn new(repository: Arc<dyn JobRepository>, slices: Vec<StreamSlice>) -> Self {
        Self {
            repository,
            slices,
            config: OrchestratorConfig::default(),
        }
    }

    /// Set the polling configuration
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Slices this orchestrator runs jobs for
    pub fn slices(&self) -> &[StreamSlice] {
        &self.slices
    }

    /// Start every job and yield each partition once all its jobs completed
    ///
    /// Partitions come out as they complete, not in slice order. A partition
    /// that ends `FAILED` or `TIMED_OUT` is never yielded; an
    /// [`Error::AsyncJob`] is yielded instead and the stream ends.
    pub fn create_and_get_completed_partitions(&self) -> BoxStream<'static, Result<AsyncPartition>> {
        let state = PollState {
            repository: Arc::clone(&self.repository),
            unstarted: Some(self.slices.clone()),
            running: Vec::new(),
            ready: VecDeque::new(),
            pending_error: None,
            poll_interval: self.config.poll_interval(),
            done: false,
        };

        stream::unfold(state, |mut state| async move {
            let item = state.next_partition().await?;
            Some((item, state))
        })
        .boxed()
    }

    /// Records of every job of `partition`, job by job, in repository order
    pub fn fetch_records<'a>(
        &'a self,
        partition: &'a AsyncPartition,
    ) -> BoxStream<'a, Result<JsonValue>> {
        let repository = &self.repository;
        stream::iter(partition.jobs())
            .then(move |job| async move {
                debug!(job_id = job.api_job_id(), "Fetching job records");
                repository.fetch_records(job).await
            })
            .flat_map(|fetched| match fetched {
                Ok(records) => stream::iter(records.into_iter().map(Ok::<_, Error>)).left_stream(),
                Err(e) => stream::once(future::ready(Err(e))).right_stream(),
            })
            .boxed()
    }
}

struct PollState {
    repository: Arc<dyn JobRepository>,
    unstarted: Option<Vec<StreamSlice>>,
    running: Vec<AsyncPartition>,
    ready: VecDeque<AsyncPartition>,
    pending_error: Option<Error>,
    poll_interval: Duration,
    done: bool,
}

impl PollState {
    async fn next_partition(&mut self) -> Option<Result<AsyncPartition>> {
        if self.done {
            return None;
        }

        if let Some(slices) = self.unstarted.take() {
            if let Err(e) = self.start_jobs(slices).await {
                self.done = true;
                return Some(Err(e));
            }
        }

        loop {
            if let Some(partition) = self.ready.pop_front() {
                return Some(Ok(partition));
            }
            if let Some(e) = self.pending_error.take() {
                self.done = true;
                return Some(Err(e));
            }
            if self.running.is_empty() {
                self.done = true;
                return None;
            }

            if let Err(e) = self.poll().await {
                self.done = true;
                return Some(Err(e));
            }
            tokio::time::sleep(self.poll_interval).await;
            self.collect_terminal_partitions();
        }
    }

    async fn start_jobs(&mut self, slices: Vec<StreamSlice>) -> Result<()> {
        for slice in slices {
            let mut jobs = self.repository.start_jobs(&slice).await?;
            for job in &mut jobs {
                job.update_status(AsyncJobStatus::Running);
                info!(job_id = job.api_job_id(), slice = %slice, "Started async job");
            }
            self.running.push(AsyncPartition::new(jobs, slice));
        }
        Ok(())
    }

    /// Refresh every job that is not terminal yet
    async fn poll(&mut self) -> Result<()> {
        let mut jobs: Vec<&mut AsyncJob> = self
            .running
            .iter_mut()
            .flat_map(|partition| partition.jobs_mut())
            .filter(|job| !job.status().is_terminal())
            .collect();

        if jobs.is_empty() {
            return Ok(());
        }

        debug!(jobs = jobs.len(), "Polling async jobs");
        self.repository.update_jobs_status(&mut jobs).await
    }

    /// Move completed partitions to `ready`; stop at the first failed one
    fn collect_terminal_partitions(&mut self) {
        let mut still_running = Vec::with_capacity(self.running.len());

        for partition in std::mem::take(&mut self.running) {
            match partition.status() {
                AsyncJobStatus::Running => still_running.push(partition),
                AsyncJobStatus::Completed => {
                    info!(slice = %partition.stream_slice(), "Async job partition completed");
                    self.ready.push_back(partition);
                }
                status @ (AsyncJobStatus::Failed | AsyncJobStatus::TimedOut) => {
                    error!(
                        slice = %partition.stream_slice(),
                        job_ids = ?partition.job_ids(),
                        %status,
                        "Async job partition did not complete"
                    );
                    self.pending_error = Some(Error::AsyncJob {
                        stream_slice: partition.stream_slice().to_string(),
                        job_ids: partition.job_ids(),
                        status,
                    });
                    break;
                }
            }
        }

        self.running = still_running;
    }
}
