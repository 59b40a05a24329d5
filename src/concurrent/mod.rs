//! Concurrent stream reading module
//!
//! Parallel partition discovery and record consumption.
//!
//! # Overview
//!
//! The concurrent module provides:
//! - `ConcurrentStreamReader` - Fans partitions out to a pool of consumers
//! - `QueueConsumer` - Drains the partition queue until its end marker
//! - `WorkerPool` / `TaskGroup` - Bounded spawning and joint completion
//! - The shared partition queue (`QueueItem::Partition` / `QueueItem::End`)
//!
//! ```text
//!   generator ──put──▶ [ P P P ... End × C ] ──pop──▶ consumer 1..C
//!                                                       │
//!   reader ◀── records, consumer completion order ──────┘
//! ```

mod consumer;
mod pool;
mod queue;
mod reader;
mod types;

pub use consumer::QueueConsumer;
pub use pool::{TaskGroup, WorkerPool};
pub use queue::{partition_queue, PartitionReceiver, PartitionSender, QueueItem};
pub use reader::ConcurrentStreamReader;
pub use types::{consumer_count, ReaderConfig, Record, POOL_SLACK};
