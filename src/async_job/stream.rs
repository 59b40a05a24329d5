//! Async job backed stream
//!
//! Lets the concurrent reader consume a source whose extraction runs as
//! remote jobs: slices are the completed partitions of one orchestrator run,
//! records are fetched per partition.

use super::orchestrator::{AsyncJobOrchestrator, OrchestratorConfig};
use super::partition::AsyncPartition;
use super::repository::JobRepository;
use crate::error::{Error, Result};
use crate::partition::{SourceStream, StreamSlice, StreamSlicer};
use crate::types::{StreamData, SyncMode};
use async_trait::async_trait;
use futures::TryStreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// A stream extracted through async jobs, one partition per slice
///
/// Slices sharing an id each keep their own partition; reads hand them out
/// in completion order.
pub struct AsyncJobStream {
    name: String,
    orchestrator: AsyncJobOrchestrator,
    completed: Mutex<HashMap<String, VecDeque<AsyncPartition>>>,
}

impl AsyncJobStream {
    /// Create a stream over explicit slices
    pub fn new(
        name: impl Into<String>,
        repository: Arc<dyn JobRepository>,
        slices: Vec<StreamSlice>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            name: name.into(),
            orchestrator: AsyncJobOrchestrator::new(repository, slices).with_config(config),
            completed: Mutex::new(HashMap::new()),
        }
    }

    /// Create a stream over the slices of a slicer
    pub fn from_slicer(
        name: impl Into<String>,
        repository: Arc<dyn JobRepository>,
        slicer: &dyn StreamSlicer,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        Ok(Self::new(name, repository, slicer.slices()?, config))
    }
}

#[async_trait]
impl SourceStream for AsyncJobStream {
    fn name(&self) -> &str {
        &self.name
    }

    /// Run every job to completion; fails if any partition fails or times out
    async fn stream_slices(
        &self,
        _sync_mode: SyncMode,
        _cursor_field: Option<&[String]>,
    ) -> Result<Vec<StreamSlice>> {
        let partitions: Vec<AsyncPartition> = self
            .orchestrator
            .create_and_get_completed_partitions()
            .try_collect()
            .await?;
        info!(stream = %self.name, partitions = partitions.len(), "Async jobs completed");

        let slices = partitions
            .iter()
            .map(|partition| partition.stream_slice().clone())
            .collect();

        let mut completed = self.completed.lock().await;
        for partition in partitions {
            completed
                .entry(partition.stream_slice().id.clone())
                .or_default()
                .push_back(partition);
        }

        Ok(slices)
    }

    /// Fetch the records of a completed partition; each partition is read once
    async fn read_records(
        &self,
        _sync_mode: SyncMode,
        _cursor_field: Option<&[String]>,
        slice: &StreamSlice,
    ) -> Result<Vec<StreamData>> {
        let partition = self
            .completed
            .lock()
            .await
            .get_mut(&slice.id)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| {
                Error::consumer(
                    self.name.clone(),
                    format!("no completed async job partition for slice '{}'", slice.id),
                )
            })?;

        let records: Vec<_> = self
            .orchestrator
            .fetch_records(&partition)
            .try_collect()
            .await?;

        Ok(records.into_iter().map(StreamData::Record).collect())
    }
}
