//! Worker pool and task groups
//!
//! The pool bounds how many spawned tasks run at once; a task group collects
//! the tasks of one kind so they can be awaited together.

use crate::error::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::trace;

/// A bounded pool of workers
#[derive(Debug, Clone)]
pub struct WorkerPool {
    name: String,
    size: usize,
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    /// Create a pool running at most `size` tasks concurrently
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        let size = size.max(1);
        Self {
            name: name.into(),
            size,
            permits: Arc::new(Semaphore::new(size)),
        }
    }

    /// Pool name, used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of concurrently running tasks
    pub fn size(&self) -> usize {
        self.size
    }

    /// Spawn a task into `group`; it starts once a worker is free
    pub fn spawn<T, F>(&self, group: &mut TaskGroup<T>, task: F)
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let pool = self.name.clone();
        group.tasks.spawn(async move {
            // The semaphore is never closed, so a permit always arrives
            let _permit = permits.acquire_owned().await.ok();
            trace!(pool = %pool, "Worker acquired");
            task.await
        });
    }
}

/// A group of tasks awaited together
#[derive(Debug)]
pub struct TaskGroup<T> {
    tasks: JoinSet<T>,
}

impl<T: 'static> TaskGroup<T> {
    /// Create an empty group
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
        }
    }

    /// Number of tasks not yet joined
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether every task has been joined
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for the next task to finish
    ///
    /// A panicked or cancelled task surfaces as `Error::Worker`.
    pub async fn join_next(&mut self) -> Option<Result<T>> {
        self.tasks
            .join_next()
            .await
            .map(|joined| joined.map_err(Into::into))
    }

    /// Wait for every task, returning outputs in completion order
    pub async fn join_all(&mut self) -> Result<Vec<T>> {
        let mut outputs = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.join_next().await {
            outputs.push(joined?);
        }
        Ok(outputs)
    }

    /// Let the remaining tasks run to completion unobserved
    ///
    /// Dropping a group aborts its tasks; detaching does not.
    pub fn detach(&mut self) {
        self.tasks.detach_all();
    }
}

impl<T: 'static> Default for TaskGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}
