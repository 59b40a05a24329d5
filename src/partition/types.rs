//! Partition types and traits
//!
//! Defines the slice/partition abstractions and the collaborator traits
//! the concurrent reader consumes.

use crate::concurrent::PartitionSender;
use crate::error::Result;
use crate::types::{JsonObject, JsonValue, StreamData, SyncMode};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A bounded unit of work describing what subset of a stream to read
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSlice {
    /// Identifier for this slice, used for logging and grouping
    pub id: String,
    /// Values to inject into requests
    pub values: JsonObject,
}

impl StreamSlice {
    /// Create a new, empty slice
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: JsonObject::new(),
        }
    }

    /// Add a value to the slice
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Add a string value
    #[must_use]
    pub fn with_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .insert(key.into(), JsonValue::String(value.into()));
        self
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    /// Get a string value by key
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(JsonValue::as_str)
    }

    /// The slice values as a JSON object
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.values.clone())
    }
}

impl fmt::Display for StreamSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// A source stream whose records can be read slice by slice
#[async_trait]
pub trait SourceStream: Send + Sync {
    /// Stream name
    fn name(&self) -> &str;

    /// Produce the slices to read for this stream
    async fn stream_slices(
        &self,
        sync_mode: SyncMode,
        cursor_field: Option<&[String]>,
    ) -> Result<Vec<StreamSlice>>;

    /// Read every item the stream yields for one slice, in production order
    async fn read_records(
        &self,
        sync_mode: SyncMode,
        cursor_field: Option<&[String]>,
        slice: &StreamSlice,
    ) -> Result<Vec<StreamData>>;
}

/// A slice bound to the stream that produces its records
#[derive(Clone)]
pub struct StreamPartition {
    stream: Arc<dyn SourceStream>,
    slice: StreamSlice,
    sync_mode: SyncMode,
    cursor_field: Option<Vec<String>>,
}

impl StreamPartition {
    /// Create a new stream partition
    pub fn new(
        stream: Arc<dyn SourceStream>,
        slice: StreamSlice,
        sync_mode: SyncMode,
        cursor_field: Option<Vec<String>>,
    ) -> Self {
        Self {
            stream,
            slice,
            sync_mode,
            cursor_field,
        }
    }

    /// Name of the owning stream
    pub fn stream_name(&self) -> &str {
        self.stream.name()
    }

    /// The slice this partition covers
    pub fn slice(&self) -> &StreamSlice {
        &self.slice
    }

    /// Identity used for logging
    pub fn id(&self) -> String {
        format!("{}:{}", self.stream.name(), self.slice.id)
    }

    /// Read the records of this partition
    pub async fn read(&self) -> Result<Vec<StreamData>> {
        self.stream
            .read_records(self.sync_mode, self.cursor_field.as_deref(), &self.slice)
            .await
    }
}

impl fmt::Debug for StreamPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamPartition")
            .field("stream", &self.stream.name())
            .field("slice", &self.slice)
            .field("sync_mode", &self.sync_mode)
            .finish()
    }
}

/// Produces the partitions to read for a stream
///
/// Implementations push every partition onto the queue as soon as it is
/// produced and return the full list once generation is done.
#[async_trait]
pub trait PartitionGenerator: Send + Sync {
    /// Generate partitions for a stream
    async fn generate_partitions(
        &self,
        stream: Arc<dyn SourceStream>,
        sync_mode: SyncMode,
        cursor_field: Option<Vec<String>>,
        queue: &PartitionSender,
    ) -> Result<Vec<StreamPartition>>;
}

/// Trait for slicers that split a stream into slices
pub trait StreamSlicer: Send + Sync {
    /// Generate the slices
    fn slices(&self) -> Result<Vec<StreamSlice>>;

    /// Get the slice field name (for request interpolation)
    fn slice_field(&self) -> &str;
}
