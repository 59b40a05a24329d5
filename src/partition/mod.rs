//! Partition module
//!
//! Supports: List slices, DateTime ranges, per-slice stream partitions
//!
//! # Overview
//!
//! A stream is split into slices; each slice bound to its stream becomes a
//! `StreamPartition` that a queue consumer can read independently. This is
//! useful for:
//! - Date range slicing for large datasets
//! - Static list of values (e.g., regions, accounts)
//! - Reading many slices concurrently

mod generator;
mod slicers;
mod types;

pub use generator::StreamSlicePartitionGenerator;
pub use slicers::{DatetimeSlicer, ListSlicer};
pub use types::{PartitionGenerator, SourceStream, StreamPartition, StreamSlice, StreamSlicer};
