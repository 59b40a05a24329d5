//! Default partition generator
//!
//! Turns each slice of a stream into a partition and hands it to the queue
//! as soon as it exists.

use super::types::{PartitionGenerator, SourceStream, StreamPartition};
use crate::concurrent::PartitionSender;
use crate::error::Result;
use crate::types::SyncMode;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Generates one partition per slice reported by the stream
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamSlicePartitionGenerator;

impl StreamSlicePartitionGenerator {
    /// Create a new generator
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PartitionGenerator for StreamSlicePartitionGenerator {
    async fn generate_partitions(
        &self,
        stream: Arc<dyn SourceStream>,
        sync_mode: SyncMode,
        cursor_field: Option<Vec<String>>,
        queue: &PartitionSender,
    ) -> Result<Vec<StreamPartition>> {
        let slices = stream
            .stream_slices(sync_mode, cursor_field.as_deref())
            .await?;

        let mut partitions = Vec::with_capacity(slices.len());
        for slice in slices {
            let partition =
                StreamPartition::new(Arc::clone(&stream), slice, sync_mode, cursor_field.clone());
            debug!(partition = %partition.id(), "Generated partition");
            queue.put(partition.clone())?;
            partitions.push(partition);
        }

        Ok(partitions)
    }
}
