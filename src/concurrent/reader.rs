//! Concurrent stream reader
//!
//! Runs one partition generation task and several queue consumers on a
//! worker pool, then merges what the consumers read.

use super::consumer::QueueConsumer;
use super::pool::{TaskGroup, WorkerPool};
use super::queue::partition_queue;
use super::types::{ReaderConfig, Record};
use crate::config::InternalConfig;
use crate::error::{Error, Result};
use crate::partition::{PartitionGenerator, SourceStream};
use crate::telemetry::create_slice_log_message;
use crate::types::{StreamData, SyncMode};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

type ConsumerTasks = TaskGroup<Result<Vec<Record>>>;

/// Reads a stream by fanning its partitions out to concurrent consumers
///
/// Every call to [`read_stream`](Self::read_stream) gets a fresh pool and
/// queue. Consumer output is merged in consumer completion order, so there
/// is no ordering across partitions; the order within one partition is kept.
///
/// When the record limit is hit, tasks still running are detached rather
/// than aborted: they run to completion and their output is discarded.
pub struct ConcurrentStreamReader {
    partition_generator: Arc<dyn PartitionGenerator>,
    queue_consumer: QueueConsumer,
    config: ReaderConfig,
}

impl ConcurrentStreamReader {
    /// Create a new reader
    pub fn new(partition_generator: Arc<dyn PartitionGenerator>, config: ReaderConfig) -> Self {
        Self {
            partition_generator,
            queue_consumer: QueueConsumer::new(),
            config,
        }
    }

    /// Reader configuration
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Read a stream in full refresh mode
    ///
    /// Nothing runs until the returned stream is polled. Errors from
    /// generation or consumption are yielded as the last item.
    pub fn read_stream(
        &self,
        stream: Arc<dyn SourceStream>,
        cursor_field: Option<Vec<String>>,
        internal_config: InternalConfig,
    ) -> BoxStream<'static, Result<StreamData>> {
        let run = ReadRun {
            partition_generator: Arc::clone(&self.partition_generator),
            queue_consumer: self.queue_consumer,
            config: self.config.clone(),
            stream,
            cursor_field,
        };
        let state = ReadState {
            phase: Phase::Pending(run),
            buffer: VecDeque::new(),
            pending_error: None,
            records_emitted: 0,
            internal_config,
            incremental: self.config.incremental_yield,
        };

        stream::unfold(state, |mut state| async move {
            let item = state.next_item().await?;
            Some((item, state))
        })
        .boxed()
    }
}

struct ReadRun {
    partition_generator: Arc<dyn PartitionGenerator>,
    queue_consumer: QueueConsumer,
    config: ReaderConfig,
    stream: Arc<dyn SourceStream>,
    cursor_field: Option<Vec<String>>,
}

impl ReadRun {
    /// Spawn generation and consumers, wait for generation, place end markers
    ///
    /// Returns the slice log items and the still running consumers.
    async fn start(self) -> Result<(Vec<StreamData>, ConsumerTasks)> {
        let stream_name = self.stream.name().to_string();
        let consumers = self.config.consumer_count();
        debug!(
            stream = %stream_name,
            consumers,
            "Processing stream slices (sync_mode: full_refresh)"
        );

        let pool = WorkerPool::new(format!("{stream_name}-workers"), self.config.pool_size());
        let (sender, receiver) = partition_queue();

        let mut generation = TaskGroup::new();
        {
            let generator = Arc::clone(&self.partition_generator);
            let stream = Arc::clone(&self.stream);
            let cursor_field = self.cursor_field.clone();
            let sender = sender.clone();
            pool.spawn(&mut generation, async move {
                generator
                    .generate_partitions(stream, SyncMode::FullRefresh, cursor_field, &sender)
                    .await
            });
        }

        let mut consumer_tasks = TaskGroup::new();
        for worker in 0..consumers {
            let consumer = self.queue_consumer;
            let receiver = receiver.clone();
            pool.spawn(&mut consumer_tasks, async move {
                consumer.consume(worker, &receiver).await
            });
        }

        let generated = generation
            .join_all()
            .await
            .and_then(|outputs| outputs.into_iter().collect::<Result<Vec<_>>>());

        // One end marker per consumer, even when generation failed, so that
        // every consumer terminates.
        for _ in 0..consumers {
            sender.put_end()?;
        }

        let partitions = match generated {
            Ok(partitions) => partitions.into_iter().flatten().collect::<Vec<_>>(),
            Err(e) => {
                consumer_tasks.detach();
                return Err(match e {
                    Error::Worker { message } => Error::partition(stream_name, message),
                    other => other,
                });
            }
        };
        info!(stream = %stream_name, partitions = partitions.len(), "Generated partitions");

        // Generation order, not read order
        let slice_logs = if self.config.log_slices {
            partitions
                .iter()
                .map(|partition| create_slice_log_message(partition.slice()))
                .collect()
        } else {
            Vec::new()
        };

        Ok((slice_logs, consumer_tasks))
    }
}

enum Phase {
    Pending(ReadRun),
    Draining(ConsumerTasks),
    Done,
}

struct ReadState {
    phase: Phase,
    buffer: VecDeque<StreamData>,
    pending_error: Option<Error>,
    records_emitted: usize,
    internal_config: InternalConfig,
    incremental: bool,
}

impl ReadState {
    async fn next_item(&mut self) -> Option<Result<StreamData>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                if item.is_record() {
                    self.records_emitted += 1;
                    if self.internal_config.limit_reached(self.records_emitted) {
                        debug!(records = self.records_emitted, "Record limit reached");
                        self.stop();
                    }
                }
                return Some(Ok(item));
            }

            if let Some(e) = self.pending_error.take() {
                self.stop();
                return Some(Err(e));
            }

            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Pending(run) => match run.start().await {
                    Ok((slice_logs, consumers)) => {
                        self.buffer.extend(slice_logs);
                        self.phase = Phase::Draining(consumers);
                    }
                    Err(e) => return Some(Err(e)),
                },
                Phase::Draining(mut consumers) if self.incremental => {
                    match consumers.join_next().await {
                        Some(joined) => {
                            self.absorb(joined);
                            self.phase = Phase::Draining(consumers);
                        }
                        None => return None,
                    }
                }
                Phase::Draining(mut consumers) => {
                    while let Some(joined) = consumers.join_next().await {
                        self.absorb(joined);
                    }
                }
                Phase::Done => return None,
            }
        }
    }

    /// Buffer one consumer's records, or remember its failure
    ///
    /// Only the first failure is kept; records of consumers that finished
    /// before it are still emitted.
    fn absorb(&mut self, joined: Result<Result<Vec<Record>>>) {
        match joined.and_then(|consumed| consumed) {
            Ok(records) => {
                if self.pending_error.is_none() {
                    self.buffer
                        .extend(records.into_iter().map(|record| record.stream_data));
                }
            }
            Err(e) => {
                if self.pending_error.is_none() {
                    self.pending_error = Some(e);
                }
            }
        }
    }

    fn stop(&mut self) {
        self.buffer.clear();
        if let Phase::Draining(mut consumers) = std::mem::replace(&mut self.phase, Phase::Done) {
            consumers.detach();
        }
    }
}
