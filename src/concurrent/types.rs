//! Concurrent reader types
//!
//! Consumed records and reader configuration.

use crate::error::{Error, Result};
use crate::partition::StreamPartition;
use crate::types::StreamData;
use serde::{Deserialize, Serialize};

/// Extra workers the pool keeps beyond `max_workers`
pub const POOL_SLACK: usize = 10;

/// Number of consumer tasks for a given worker budget: half, but at least one
pub fn consumer_count(max_workers: usize) -> usize {
    (max_workers / 2).max(1)
}

/// One item consumed from a partition
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The emitted payload
    pub stream_data: StreamData,
    /// Identity of the partition that produced it
    pub partition_id: String,
}

impl Record {
    /// Create a record produced by `partition`
    pub fn new(stream_data: StreamData, partition: &StreamPartition) -> Self {
        Self {
            stream_data,
            partition_id: partition.id(),
        }
    }

    /// Whether this is an actual data record (as opposed to a log or state item)
    pub fn is_data(&self) -> bool {
        self.stream_data.is_record()
    }
}

/// Configuration for the concurrent stream reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Worker budget; half of it becomes queue consumers
    pub max_workers: usize,
    /// Emit a log item per generated slice
    pub log_slices: bool,
    /// Yield each consumer's records as soon as it finishes instead of
    /// waiting for every consumer
    pub incremental_yield: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            log_slices: false,
            incremental_yield: false,
        }
    }
}

impl ReaderConfig {
    /// Create a new reader config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker budget
    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Enable slice log items
    #[must_use]
    pub fn with_log_slices(mut self, enabled: bool) -> Self {
        self.log_slices = enabled;
        self
    }

    /// Enable incremental yielding
    #[must_use]
    pub fn with_incremental_yield(mut self, enabled: bool) -> Self {
        self.incremental_yield = enabled;
        self
    }

    /// Number of queue consumers this config runs
    pub fn consumer_count(&self) -> usize {
        consumer_count(self.max_workers)
    }

    /// Size of the worker pool: room for the generator, every consumer and slack
    pub fn pool_size(&self) -> usize {
        self.max_workers + POOL_SLACK
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::invalid_value("max_workers", "must be at least 1"));
        }
        Ok(())
    }
}
