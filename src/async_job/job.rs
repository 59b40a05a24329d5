//! Async job state machine

use super::timer::{Clock, Timer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Timeout applied to jobs that do not specify one
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Status of a remote async job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AsyncJobStatus {
    /// Still being processed upstream
    Running,
    /// Finished; records can be fetched
    Completed,
    /// Failed upstream
    Failed,
    /// Did not finish before its timeout
    TimedOut,
}

impl AsyncJobStatus {
    /// Every status, in declaration order
    pub const ALL: [Self; 4] = [Self::Running, Self::Completed, Self::Failed, Self::TimedOut];

    /// Whether no further transition is expected without an explicit restart
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Status name as reported upstream and in errors
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
        }
    }
}

impl fmt::Display for AsyncJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable status of a job given its recorded status and its timer
///
/// An expired timer wins over whatever was last recorded.
pub fn compute_status(recorded: AsyncJobStatus, timed_out: bool) -> AsyncJobStatus {
    if timed_out {
        AsyncJobStatus::TimedOut
    } else {
        recorded
    }
}

/// One remote extraction job
///
/// The timer only stops once [`update_status`](Self::update_status) records
/// a terminal status, so a job that already finished upstream can still
/// report `TIMED_OUT` until its status is refreshed.
#[derive(Debug, Clone)]
pub struct AsyncJob {
    api_job_id: String,
    status: AsyncJobStatus,
    timer: Timer,
}

impl AsyncJob {
    /// Create a running job with the default one hour timeout
    pub fn new(api_job_id: impl Into<String>) -> Self {
        Self::with_timeout(api_job_id, DEFAULT_JOB_TIMEOUT)
    }

    /// Create a running job with a custom timeout
    pub fn with_timeout(api_job_id: impl Into<String>, timeout: Duration) -> Self {
        Self::from_timer(api_job_id, Timer::new(timeout))
    }

    /// Create a running job whose timer reads `clock`
    pub fn with_clock(
        api_job_id: impl Into<String>,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::from_timer(api_job_id, Timer::with_clock(timeout, clock))
    }

    fn from_timer(api_job_id: impl Into<String>, mut timer: Timer) -> Self {
        timer.start();
        Self {
            api_job_id: api_job_id.into(),
            status: AsyncJobStatus::Running,
            timer,
        }
    }

    /// Job id in the source system
    pub fn api_job_id(&self) -> &str {
        &self.api_job_id
    }

    /// Current status, `TIMED_OUT` if the timer expired
    pub fn status(&self) -> AsyncJobStatus {
        compute_status(self.status, self.timer.has_timed_out())
    }

    /// Last status passed to `update_status`
    pub fn recorded_status(&self) -> AsyncJobStatus {
        self.status
    }

    /// The job's timer
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Record a new status
    ///
    /// Moving back to `RUNNING` from any other status re-arms the timer; a
    /// terminal status disarms it.
    pub fn update_status(&mut self, status: AsyncJobStatus) {
        if self.status != AsyncJobStatus::Running && status == AsyncJobStatus::Running {
            self.timer.start();
        } else if status.is_terminal() {
            self.timer.stop();
        }

        self.status = status;
    }
}
