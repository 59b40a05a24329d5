//! Job repository contract

use super::job::AsyncJob;
use crate::error::Result;
use crate::partition::StreamSlice;
use crate::types::JsonValue;
use async_trait::async_trait;

/// Starts, polls and reads remote async jobs
///
/// Only ever driven from one polling loop at a time.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Start a job for a slice
    async fn start(&self, stream_slice: &StreamSlice) -> Result<AsyncJob>;

    /// Start every job needed for a slice
    ///
    /// Sources that shard one slice into several remote jobs override this.
    async fn start_jobs(&self, stream_slice: &StreamSlice) -> Result<Vec<AsyncJob>> {
        Ok(vec![self.start(stream_slice).await?])
    }

    /// Refresh the status of every given job in place
    async fn update_jobs_status(&self, jobs: &mut [&mut AsyncJob]) -> Result<()>;

    /// Fetch the records of a completed job, in source order
    async fn fetch_records(&self, job: &AsyncJob) -> Result<Vec<JsonValue>>;
}
