//! Queue consumer
//!
//! Drains partitions from the shared queue until it sees an end marker.

use super::queue::{PartitionReceiver, QueueItem};
use super::types::Record;
use crate::error::Result;
use tracing::{debug, error};

/// Reads every partition it pops from the queue
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueConsumer;

impl QueueConsumer {
    /// Create a new consumer
    pub fn new() -> Self {
        Self
    }

    /// Pop partitions and read them until one end marker is observed
    ///
    /// Never pops more than one end marker, so each concurrently running
    /// consumer needs its own. A closed, drained queue also ends consumption.
    pub async fn consume(&self, worker: usize, queue: &PartitionReceiver) -> Result<Vec<Record>> {
        let mut records = Vec::new();

        loop {
            let partition = match queue.pop().await {
                Some(QueueItem::Partition(partition)) => partition,
                Some(QueueItem::End) | None => break,
            };

            debug!(worker, partition = %partition.id(), "Reading partition");
            let items = partition.read().await.map_err(|e| {
                error!(worker, partition = %partition.id(), error = %e, "Failed to read partition");
                e
            })?;

            records.extend(items.into_iter().map(|item| Record::new(item, &partition)));
        }

        debug!(worker, records = records.len(), "Consumer finished");
        Ok(records)
    }
}
