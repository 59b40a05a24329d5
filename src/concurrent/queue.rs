//! Shared partition queue
//!
//! An unbounded multi-producer, multi-consumer hand-off between the
//! partition generator and the queue consumers.

use crate::error::{Error, Result};
use crate::partition::StreamPartition;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// An item on the partition queue
#[derive(Debug, Clone)]
pub enum QueueItem {
    /// A partition to read
    Partition(StreamPartition),
    /// No more partitions will arrive for the consumer that pops this
    End,
}

impl QueueItem {
    /// Check if this is the end marker
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}

/// Create a new, empty partition queue
pub fn partition_queue() -> (PartitionSender, PartitionReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        PartitionSender {
            tx,
            ends_sent: Arc::new(AtomicUsize::new(0)),
        },
        PartitionReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer side of the partition queue
#[derive(Debug, Clone)]
pub struct PartitionSender {
    tx: mpsc::UnboundedSender<QueueItem>,
    ends_sent: Arc<AtomicUsize>,
}

impl PartitionSender {
    /// Push a partition onto the queue
    pub fn put(&self, partition: StreamPartition) -> Result<()> {
        self.send(QueueItem::Partition(partition))
    }

    /// Push one end marker onto the queue
    pub fn put_end(&self) -> Result<()> {
        self.send(QueueItem::End)?;
        self.ends_sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Number of end markers pushed so far, across all clones of this sender
    pub fn ends_sent(&self) -> usize {
        self.ends_sent.load(Ordering::SeqCst)
    }

    fn send(&self, item: QueueItem) -> Result<()> {
        self.tx
            .send(item)
            .map_err(|_| Error::worker("partition queue closed"))
    }
}

/// Consumer side of the partition queue, shareable between consumers
#[derive(Debug, Clone)]
pub struct PartitionReceiver {
    rx: Arc<Mutex<mpsc::UnboundedReceiver<QueueItem>>>,
}

impl PartitionReceiver {
    /// Pop the next item, waiting until one is available
    ///
    /// Returns `None` once every sender is gone and the queue is drained.
    pub async fn pop(&self) -> Option<QueueItem> {
        self.rx.lock().await.recv().await
    }
}
