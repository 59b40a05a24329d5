//! Configuration types
//!
//! This module contains the configuration structures for the extraction
//! core, loadable from YAML or JSON.

use crate::async_job::{AsyncJobHttpConfig, OrchestratorConfig};
use crate::concurrent::ReaderConfig;
use crate::error::{Error, Result, ResultExt};
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Top-Level Extract Config
// ============================================================================

/// Complete extraction configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Concurrent reader settings
    pub reader: ReaderConfig,

    /// Async job polling settings
    pub orchestrator: OrchestratorConfig,

    /// HTTP async job settings, for sources that extract through remote jobs
    pub async_job: Option<AsyncJobHttpConfig>,
}

impl ExtractConfig {
    /// Parse from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents),
            _ => Self::from_yaml_str(&contents),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.reader.validate()?;
        if let Some(async_job) = &self.async_job {
            async_job.validate()?;
        }
        Ok(())
    }
}

// ============================================================================
// Internal Config
// ============================================================================

/// Framework-level settings carried inside a connector config
///
/// Only the record limit (`_limit`) is understood here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalConfig {
    /// Maximum number of data records to emit
    #[serde(rename = "_limit", default)]
    pub limit: Option<usize>,
}

impl InternalConfig {
    /// No limit
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Limit to `limit` data records
    ///
    /// The limit is checked after each record is emitted, so a limit of 0
    /// still lets the first record through.
    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }

    /// Extract from a connector config, ignoring every other key
    pub fn from_connector_config(config: &JsonValue) -> Result<Self> {
        match config.get("_limit") {
            None | Some(JsonValue::Null) => Ok(Self::default()),
            Some(limit) => limit
                .as_u64()
                .map(|limit| Self::with_limit(limit as usize))
                .ok_or_else(|| Error::invalid_value("_limit", "must be a non-negative integer")),
        }
    }

    /// Whether `count` emitted records reach the limit
    pub fn limit_reached(&self, count: usize) -> bool {
        self.limit.is_some_and(|limit| count >= limit)
    }
}
