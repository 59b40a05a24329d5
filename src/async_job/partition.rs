//! Jobs grouped per stream slice

use super::job::{AsyncJob, AsyncJobStatus};
use crate::partition::StreamSlice;

/// Aggregate job statuses by priority
///
/// Any `FAILED` fails the group, else any `TIMED_OUT` times it out, else any
/// `RUNNING` keeps it running. An empty group is `COMPLETED`.
pub fn aggregate_status(statuses: impl IntoIterator<Item = AsyncJobStatus>) -> AsyncJobStatus {
    let mut timed_out = false;
    let mut running = false;

    for status in statuses {
        match status {
            AsyncJobStatus::Failed => return AsyncJobStatus::Failed,
            AsyncJobStatus::TimedOut => timed_out = true,
            AsyncJobStatus::Running => running = true,
            AsyncJobStatus::Completed => {}
        }
    }

    if timed_out {
        AsyncJobStatus::TimedOut
    } else if running {
        AsyncJobStatus::Running
    } else {
        AsyncJobStatus::Completed
    }
}

/// The jobs extracting one stream slice
#[derive(Debug, Clone)]
pub struct AsyncPartition {
    jobs: Vec<AsyncJob>,
    stream_slice: StreamSlice,
}

impl AsyncPartition {
    /// Create a partition over `jobs`
    pub fn new(jobs: Vec<AsyncJob>, stream_slice: StreamSlice) -> Self {
        Self { jobs, stream_slice }
    }

    /// Jobs of this partition, in creation order
    pub fn jobs(&self) -> &[AsyncJob] {
        &self.jobs
    }

    pub(crate) fn jobs_mut(&mut self) -> impl Iterator<Item = &mut AsyncJob> {
        self.jobs.iter_mut()
    }

    /// Originating slice
    pub fn stream_slice(&self) -> &StreamSlice {
        &self.stream_slice
    }

    /// Ids of every job
    pub fn job_ids(&self) -> Vec<String> {
        self.jobs
            .iter()
            .map(|job| job.api_job_id().to_string())
            .collect()
    }

    /// Aggregated status over the current job statuses
    pub fn status(&self) -> AsyncJobStatus {
        aggregate_status(self.jobs.iter().map(AsyncJob::status))
    }
}
