//! Stream slicer implementations
//!
//! Each slicer handles a specific slicing strategy.

use super::types::{StreamSlice, StreamSlicer};
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

// ============================================================================
// List Slicer
// ============================================================================

/// List-based stream slicer
///
/// Creates one slice per value of a static list.
#[derive(Debug, Clone)]
pub struct ListSlicer {
    values: Vec<String>,
    slice_field: String,
}

impl ListSlicer {
    /// Create a new list slicer
    pub fn new(values: Vec<String>, slice_field: impl Into<String>) -> Self {
        Self {
            values,
            slice_field: slice_field.into(),
        }
    }
}

impl StreamSlicer for ListSlicer {
    fn slices(&self) -> Result<Vec<StreamSlice>> {
        Ok(self
            .values
            .iter()
            .map(|v| StreamSlice::new(v.clone()).with_string(self.slice_field.clone(), v.clone()))
            .collect())
    }

    fn slice_field(&self) -> &str {
        &self.slice_field
    }
}

// ============================================================================
// Datetime Slicer
// ============================================================================

/// Datetime-based stream slicer
///
/// Splits `[start, end)` into consecutive windows of `step`; the last window
/// is clamped to `end`.
#[derive(Debug, Clone)]
pub struct DatetimeSlicer {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    format: String,
    start_param: String,
    end_param: String,
}

impl DatetimeSlicer {
    /// Create a new datetime slicer
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: Duration,
        format: impl Into<String>,
        start_param: impl Into<String>,
        end_param: impl Into<String>,
    ) -> Result<Self> {
        if step <= Duration::zero() {
            return Err(Error::invalid_value("step", "must be positive"));
        }
        Ok(Self {
            start,
            end,
            step,
            format: format.into(),
            start_param: start_param.into(),
            end_param: end_param.into(),
        })
    }

    /// Create from string values
    pub fn from_strings(
        start: &str,
        end: &str,
        step: &str,
        format: impl Into<String>,
        start_param: impl Into<String>,
        end_param: impl Into<String>,
    ) -> Result<Self> {
        let start_dt = parse_datetime(start)?;
        let end_dt = if end == "now" {
            Utc::now()
        } else {
            parse_datetime(end)?
        };
        let step_dur = parse_duration(step)?;

        Self::new(start_dt, end_dt, step_dur, format, start_param, end_param)
    }

    fn format_datetime(&self, dt: DateTime<Utc>) -> String {
        dt.format(&self.format).to_string()
    }
}

impl StreamSlicer for DatetimeSlicer {
    fn slices(&self) -> Result<Vec<StreamSlice>> {
        let mut slices = Vec::new();
        let mut current = self.start;
        let mut slice_num = 0;

        while current < self.end {
            let next = current + self.step;
            let slice_end = if next > self.end { self.end } else { next };

            let start_str = self.format_datetime(current);
            let end_str = self.format_datetime(slice_end);

            slices.push(
                StreamSlice::new(format!("{slice_num}_{start_str}"))
                    .with_string(self.start_param.clone(), start_str)
                    .with_string(self.end_param.clone(), end_str),
            );

            current = next;
            slice_num += 1;
        }

        Ok(slices)
    }

    fn slice_field(&self) -> &str {
        &self.start_param
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parse a datetime string into UTC DateTime
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let formats = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d", "%Y/%m/%d"];

    for fmt in formats {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(DateTime::from_naive_utc_and_offset(ndt, Utc));
        }
        if let Ok(nd) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(ndt) = nd.and_hms_opt(0, 0, 0) {
                return Ok(DateTime::from_naive_utc_and_offset(ndt, Utc));
            }
        }
    }

    Err(Error::config(format!("Invalid datetime format: {s}")))
}

/// Parse a duration string like "1d", "2h", "30m"
pub(crate) fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    let (num_str, suffix) = ['w', 'd', 'h', 'm', 's']
        .into_iter()
        .find_map(|suffix| s.strip_suffix(suffix).map(|n| (n, suffix)))
        // Assume days if no suffix
        .unwrap_or((s, 'd'));

    let num: i64 = num_str
        .parse()
        .map_err(|_| Error::config(format!("Invalid duration number: {num_str}")))?;

    let duration = match suffix {
        'w' => Duration::weeks(num),
        'd' => Duration::days(num),
        'h' => Duration::hours(num),
        'm' => Duration::minutes(num),
        's' => Duration::seconds(num),
        _ => return Err(Error::config(format!("Invalid duration suffix: {suffix}"))),
    };

    Ok(duration)
}
