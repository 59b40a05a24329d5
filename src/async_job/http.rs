//! HTTP job repository
//!
//! For APIs like Salesforce Bulk API, BigQuery, etc. that follow a
//! create → poll → download pattern.

use super::job::{AsyncJob, AsyncJobStatus};
use super::repository::JobRepository;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig};
use crate::partition::StreamSlice;
use crate::types::{JsonValue, Method};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for async job based extraction over HTTP
///
/// Paths and string values of `create_body` may reference `{{ job_id }}`
/// and `{{ slice.<key> }}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsyncJobHttpConfig {
    /// HTTP client settings
    pub http: HttpClientConfig,

    /// HTTP method for job creation
    pub create_method: Method,
    /// Endpoint path for job creation
    pub create_path: String,
    /// Request body for job creation
    pub create_body: Option<JsonValue>,
    /// Path to the job ID in the creation response
    pub job_id_path: String,

    /// Endpoint path for polling job status
    pub poll_path: String,
    /// Path to the status in the poll response
    pub status_path: String,
    /// Status values meaning the job completed
    pub completed_values: Vec<String>,
    /// Status values meaning the job failed
    pub failed_values: Vec<String>,
    /// Status values meaning the source gave up on the job
    pub timed_out_values: Vec<String>,

    /// Endpoint path for downloading results
    pub download_path: String,
    /// Path to the records array in the download response
    pub records_path: Option<String>,

    /// Local timeout of each job, in minutes
    pub job_timeout_minutes: u64,
}

impl Default for AsyncJobHttpConfig {
    fn default() -> Self {
        Self {
            http: HttpClientConfig::default(),
            create_method: Method::POST,
            create_path: String::new(),
            create_body: None,
            job_id_path: "id".to_string(),
            poll_path: String::new(),
            status_path: "state".to_string(),
            completed_values: vec!["JobComplete".to_string()],
            failed_values: vec!["Failed".to_string(), "Aborted".to_string()],
            timed_out_values: Vec::new(),
            download_path: String::new(),
            records_path: None,
            job_timeout_minutes: 60,
        }
    }
}

impl AsyncJobHttpConfig {
    /// Create a new async job config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set HTTP client settings
    #[must_use]
    pub fn with_http(mut self, http: HttpClientConfig) -> Self {
        self.http = http;
        self
    }

    /// Set job creation config
    #[must_use]
    pub fn with_create(mut self, method: Method, path: &str, body: Option<JsonValue>) -> Self {
        self.create_method = method;
        self.create_path = path.to_string();
        self.create_body = body;
        self
    }

    /// Set polling config
    #[must_use]
    pub fn with_poll(mut self, path: &str, status_path: &str) -> Self {
        self.poll_path = path.to_string();
        self.status_path = status_path.to_string();
        self
    }

    /// Set status values
    #[must_use]
    pub fn with_status_values(mut self, completed: &[&str], failed: &[&str], timed_out: &[&str]) -> Self {
        let owned = |values: &[&str]| values.iter().map(ToString::to_string).collect::<Vec<String>>();
        self.completed_values = owned(completed);
        self.failed_values = owned(failed);
        self.timed_out_values = owned(timed_out);
        self
    }

    /// Set download config
    #[must_use]
    pub fn with_download(mut self, path: &str, records_path: Option<&str>) -> Self {
        self.download_path = path.to_string();
        self.records_path = records_path.map(String::from);
        self
    }

    /// Set the job timeout
    #[must_use]
    pub fn with_job_timeout_minutes(mut self, minutes: u64) -> Self {
        self.job_timeout_minutes = minutes;
        self
    }

    /// Local timeout of each job
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_minutes * 60)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.create_path.is_empty() {
            return Err(Error::invalid_value("create_path", "must not be empty"));
        }
        for (field, path) in [("poll_path", &self.poll_path), ("download_path", &self.download_path)] {
            if !path.contains("job_id") {
                return Err(Error::invalid_value(field, "must reference {{ job_id }}"));
            }
        }
        Ok(())
    }

    /// Map an upstream status value to a job status; unknown values keep running
    pub fn classify_status(&self, value: &str) -> AsyncJobStatus {
        if self.completed_values.iter().any(|v| v == value) {
            AsyncJobStatus::Completed
        } else if self.failed_values.iter().any(|v| v == value) {
            AsyncJobStatus::Failed
        } else if self.timed_out_values.iter().any(|v| v == value) {
            AsyncJobStatus::TimedOut
        } else {
            AsyncJobStatus::Running
        }
    }
}

/// Job repository talking to a create → poll → download REST API
#[derive(Debug, Clone)]
pub struct HttpJobRepository {
    client: HttpClient,
    config: AsyncJobHttpConfig,
}

impl HttpJobRepository {
    /// Create a repository from a validated config
    pub fn new(config: AsyncJobHttpConfig) -> Result<Self> {
        config.validate()?;
        let client = HttpClient::new(config.http.clone())?;
        Ok(Self { client, config })
    }

    /// Repository configuration
    pub fn config(&self) -> &AsyncJobHttpConfig {
        &self.config
    }

    async fn poll_status(&self, job_id: &str) -> Result<AsyncJobStatus> {
        let path = render(&self.config.poll_path, None, Some(job_id))?;
        let response = self.client.request_json(Method::GET, &path, None).await?;

        match extract_json_path(&response, &self.config.status_path).and_then(JsonValue::as_str) {
            Some(value) => {
                let status = self.config.classify_status(value);
                debug!(job_id, upstream = value, %status, "Polled async job");
                Ok(status)
            }
            None => {
                warn!(job_id, path = %self.config.status_path, "No status in poll response");
                Ok(AsyncJobStatus::Running)
            }
        }
    }
}

#[async_trait]
impl JobRepository for HttpJobRepository {
    async fn start(&self, stream_slice: &StreamSlice) -> Result<AsyncJob> {
        let path = render(&self.config.create_path, Some(stream_slice), None)?;
        let body = self
            .config
            .create_body
            .as_ref()
            .map(|body| render_value(body, stream_slice))
            .transpose()?;

        let response = self
            .client
            .request_json(self.config.create_method, &path, body.as_ref())
            .await?;

        let job_id = match extract_json_path(&response, &self.config.job_id_path) {
            Some(JsonValue::String(id)) => id.clone(),
            Some(JsonValue::Number(id)) => id.to_string(),
            _ => {
                return Err(Error::MissingJobField {
                    path: self.config.job_id_path.clone(),
                })
            }
        };

        Ok(AsyncJob::with_timeout(job_id, self.config.job_timeout()))
    }

    async fn update_jobs_status(&self, jobs: &mut [&mut AsyncJob]) -> Result<()> {
        for job in jobs.iter_mut() {
            let status = self.poll_status(job.api_job_id()).await?;
            job.update_status(status);
        }
        Ok(())
    }

    async fn fetch_records(&self, job: &AsyncJob) -> Result<Vec<JsonValue>> {
        let path = render(&self.config.download_path, None, Some(job.api_job_id()))?;
        let response = self.client.request_json(Method::GET, &path, None).await?;

        let records = match &self.config.records_path {
            Some(records_path) => extract_json_path(&response, records_path)
                .cloned()
                .unwrap_or(JsonValue::Null),
            None => response,
        };

        Ok(match records {
            JsonValue::Array(records) => records,
            JsonValue::Null => Vec::new(),
            record => vec![record],
        })
    }
}

/// Extract a value from JSON using a simple path (e.g., "data.id", "records[0]")
pub fn extract_json_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    let path = path.strip_prefix("$.").unwrap_or(path);

    let mut current = value;
    for part in path.split('.') {
        if let Some(bracket_pos) = part.find('[') {
            let key = &part[..bracket_pos];
            let idx = part[bracket_pos + 1..].strip_suffix(']')?.parse::<usize>().ok()?;

            if !key.is_empty() {
                current = current.get(key)?;
            }
            current = current.get(idx)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current)
}

/// Substitute `{{ job_id }}` and `{{ slice.<key> }}` placeholders
fn render(template: &str, slice: Option<&StreamSlice>, job_id: Option<&str>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = after
            .find("}}")
            .ok_or_else(|| Error::config(format!("Unclosed placeholder in '{template}'")))?;
        let name = after[..close].trim();

        let value = match (name, name.strip_prefix("slice.")) {
            ("job_id", _) => job_id.map(ToString::to_string),
            (_, Some(key)) => slice.and_then(|s| s.get(key)).map(|v| match v {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            }),
            _ => None,
        };
        let value =
            value.ok_or_else(|| Error::config(format!("Undefined variable in template: {name}")))?;
        out.push_str(&value);
        rest = &after[close + 2..];
    }
    out.push_str(rest);

    Ok(out)
}

/// Render every string inside a JSON value
fn render_value(value: &JsonValue, slice: &StreamSlice) -> Result<JsonValue> {
    Ok(match value {
        JsonValue::String(s) => JsonValue::String(render(s, Some(slice), None)?),
        JsonValue::Array(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| render_value(item, slice))
                .collect::<Result<_>>()?,
        ),
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), render_value(v, slice)?)))
                .collect::<Result<_>>()?,
        ),
        other => other.clone(),
    })
}
