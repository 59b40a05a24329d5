//! Logging setup and slice observability

use crate::partition::StreamSlice;
use crate::types::{LogLevel, StreamData};
use tracing_subscriber::EnvFilter;

/// Prefix of slice log messages
pub const SLICE_LOG_PREFIX: &str = "slice:";

/// Install a global fmt subscriber
///
/// `RUST_LOG` directives are honored; `level` is added as the default
/// directive. Does nothing if a subscriber is already installed.
pub fn init_tracing(level: LogLevel) {
    let level: tracing::Level = level.into();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .try_init();
}

/// Log item announcing a discovered slice
pub fn create_slice_log_message(slice: &StreamSlice) -> StreamData {
    StreamData::log(LogLevel::Info, format!("{SLICE_LOG_PREFIX}{slice}"))
}
