// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Solidafy Extract
//!
//! The concurrent data-extraction core of the Solidafy connector stack.
//!
//! ## Features
//!
//! - **Concurrent Stream Reading**: Partitions are generated once and read by a pool of consumers
//! - **Record Limits**: Stop emitting as soon as a record ceiling is reached
//! - **Async Job Orchestration**: Start remote jobs per slice, poll them, fetch their records
//! - **Timeouts**: Every job carries its own timer; an expired job fails its partition
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use solidafy_extract::concurrent::{ConcurrentStreamReader, ReaderConfig};
//! use solidafy_extract::partition::StreamSlicePartitionGenerator;
//! use solidafy_extract::{InternalConfig, Result};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let reader = ConcurrentStreamReader::new(
//!         Arc::new(StreamSlicePartitionGenerator::new()),
//!         ReaderConfig::new().with_max_workers(8),
//!     );
//!
//!     let mut items = reader.read_stream(my_stream(), None, InternalConfig::with_limit(100));
//!     while let Some(item) = items.next().await {
//!         println!("{:?}", item?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                   ConcurrentStreamReader                         │
//! │  read_stream(stream, cursor_field, limit) → Stream<StreamData>   │
//! └──────────────────────────────────────────────────────────────────┘
//!          │ 1 generation task              │ C consumer tasks
//! ┌────────┴─────────┐   queue     ┌────────┴─────────┐
//! │ PartitionGenerator│ ─────────▶ │  QueueConsumer    │
//! └──────────────────┘ P.. End×C   └──────────────────┘
//!                                           │ read_records(slice)
//!                                  ┌────────┴─────────┐
//!                                  │  AsyncJobStream   │
//!                                  └────────┬─────────┘
//!                                  ┌────────┴─────────┐
//!                                  │AsyncJobOrchestrator│ ── JobRepository
//!                                  └──────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Configuration loading
pub mod config;

/// Logging setup and slice observability
pub mod telemetry;

/// HTTP client with rate limiting
pub mod http;

/// Slices, partitions and partition generation
pub mod partition;

/// Concurrent partitioned stream reading
pub mod concurrent;

/// Async job orchestration
pub mod async_job;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{ExtractConfig, InternalConfig};
pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
