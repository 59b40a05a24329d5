//! Async job module
//!
//! For sources whose extraction is itself asynchronous: a remote job is
//! started per slice, polled until it finishes or times out, then its
//! records are fetched.
//!
//! # Overview
//!
//! The async job module provides:
//! - `AsyncJob` - One remote job; RUNNING / COMPLETED / FAILED / TIMED_OUT
//! - `AsyncPartition` - The jobs of one slice, with an aggregated status
//! - `JobRepository` - Starts, polls and reads jobs (`HttpJobRepository` over REST)
//! - `AsyncJobOrchestrator` - The polling loop yielding completed partitions
//! - `AsyncJobStream` - Exposes an orchestrator run as a readable stream

mod http;
mod job;
mod orchestrator;
mod partition;
mod repository;
mod stream;
mod timer;

pub use http::{extract_json_path, AsyncJobHttpConfig, HttpJobRepository};
pub use job::{compute_status, AsyncJob, AsyncJobStatus, DEFAULT_JOB_TIMEOUT};
pub use orchestrator::{AsyncJobOrchestrator, OrchestratorConfig};
pub use partition::{aggregate_status, AsyncPartition};
pub use repository::JobRepository;
pub use stream::AsyncJobStream;
pub use timer::{Clock, ManualClock, SystemClock, Timer};

#[cfg(test)]
mod tests;
