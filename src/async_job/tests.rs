//! Tests for async job module

use super::*;
use crate::concurrent::{ConcurrentStreamReader, ReaderConfig};
use crate::config::InternalConfig;
use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::partition::{ListSlicer, SourceStream, StreamSlice, StreamSlicePartitionGenerator};
use crate::types::{JsonValue, Method, StreamData, SyncMode};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_case::test_case;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::AsyncJobStatus::{Completed, Failed, Running, TimedOut};

// ============================================================================
// Fixtures
// ============================================================================

/// Scripted repository
///
/// Each job walks through its scripted statuses, one per poll; a job whose
/// script ran out stays `RUNNING`.
#[derive(Default)]
struct FakeRepository {
    jobs_per_slice: HashMap<String, Vec<String>>,
    scripts: Mutex<HashMap<String, VecDeque<AsyncJobStatus>>>,
    records: HashMap<String, Vec<JsonValue>>,
    polls: Mutex<Vec<Vec<String>>>,
    clock: Option<(ManualClock, Duration)>,
    advance_per_poll: Duration,
    failing_start: Option<String>,
}

impl FakeRepository {
    fn new() -> Self {
        Self::default()
    }

    fn job(mut self, slice_id: &str, job_id: &str, script: &[AsyncJobStatus]) -> Self {
        self.jobs_per_slice
            .entry(slice_id.to_string())
            .or_default()
            .push(job_id.to_string());
        self.scripts
            .get_mut()
            .unwrap()
            .insert(job_id.to_string(), script.iter().copied().collect());
        self
    }

    fn records(mut self, job_id: &str, records: Vec<JsonValue>) -> Self {
        self.records.insert(job_id.to_string(), records);
        self
    }

    fn with_clock(mut self, clock: ManualClock, timeout: Duration, advance_per_poll: Duration) -> Self {
        self.clock = Some((clock, timeout));
        self.advance_per_poll = advance_per_poll;
        self
    }

    fn polls(&self) -> Vec<Vec<String>> {
        self.polls.lock().unwrap().clone()
    }

    fn make_job(&self, job_id: &str) -> AsyncJob {
        match &self.clock {
            Some((clock, timeout)) => AsyncJob::with_clock(job_id, *timeout, Arc::new(clock.clone())),
            None => AsyncJob::new(job_id),
        }
    }
}

#[async_trait]
impl JobRepository for FakeRepository {
    async fn start(&self, stream_slice: &StreamSlice) -> Result<AsyncJob> {
        Ok(self.make_job(&format!("job-{}", stream_slice.id)))
    }

    async fn start_jobs(&self, stream_slice: &StreamSlice) -> Result<Vec<AsyncJob>> {
        if self.failing_start.as_deref() == Some(stream_slice.id.as_str()) {
            return Err(Error::http_status(500, "cannot create job"));
        }
        match self.jobs_per_slice.get(&stream_slice.id) {
            Some(job_ids) => Ok(job_ids.iter().map(|id| self.make_job(id)).collect()),
            None => Ok(vec![self.start(stream_slice).await?]),
        }
    }

    async fn update_jobs_status(&self, jobs: &mut [&mut AsyncJob]) -> Result<()> {
        self.polls
            .lock()
            .unwrap()
            .push(jobs.iter().map(|job| job.api_job_id().to_string()).collect());

        if let Some((clock, _)) = &self.clock {
            clock.advance(self.advance_per_poll);
        }

        let mut scripts = self.scripts.lock().unwrap();
        for job in jobs.iter_mut() {
            let next = scripts
                .get_mut(job.api_job_id())
                .and_then(VecDeque::pop_front)
                .unwrap_or(Running);
            job.update_status(next);
        }
        Ok(())
    }

    async fn fetch_records(&self, job: &AsyncJob) -> Result<Vec<JsonValue>> {
        self.records
            .get(job.api_job_id())
            .cloned()
            .ok_or_else(|| Error::http_status(404, format!("no results for {}", job.api_job_id())))
    }
}

fn slices(ids: &[&str]) -> Vec<StreamSlice> {
    ids.iter()
        .map(|id| StreamSlice::new(*id).with_string("id", *id))
        .collect()
}

fn no_wait() -> OrchestratorConfig {
    OrchestratorConfig::default().with_poll_interval_secs(0)
}

fn orchestrator(repository: &Arc<FakeRepository>, ids: &[&str]) -> AsyncJobOrchestrator {
    AsyncJobOrchestrator::new(Arc::clone(repository) as Arc<dyn JobRepository>, slices(ids))
        .with_config(no_wait())
}

async fn run(orchestrator: &AsyncJobOrchestrator) -> Vec<Result<AsyncPartition>> {
    orchestrator
        .create_and_get_completed_partitions()
        .collect()
        .await
}

// ============================================================================
// Timer Tests
// ============================================================================

#[test]
fn test_timer_disarmed_never_times_out() {
    let clock = ManualClock::new();
    let timer = Timer::with_clock(Duration::from_secs(1), Arc::new(clock.clone()));

    clock.advance(Duration::from_secs(10));
    assert!(!timer.is_running());
    assert_eq!(timer.elapsed(), None);
    assert!(!timer.has_timed_out());
}

#[test]
fn test_timer_times_out_at_deadline() {
    let clock = ManualClock::new();
    let mut timer = Timer::with_clock(Duration::from_secs(5), Arc::new(clock.clone()));
    timer.start();

    clock.advance(Duration::from_secs(4));
    assert!(!timer.has_timed_out());
    assert_eq!(timer.elapsed(), Some(Duration::from_secs(4)));

    clock.advance(Duration::from_secs(1));
    assert!(timer.has_timed_out());
}

#[test]
fn test_timer_restart_and_stop() {
    let clock = ManualClock::new();
    let mut timer = Timer::with_clock(Duration::from_secs(5), Arc::new(clock.clone()));
    timer.start();
    clock.advance(Duration::from_secs(6));
    assert!(timer.has_timed_out());

    timer.start();
    assert!(!timer.has_timed_out());

    timer.stop();
    clock.advance(Duration::from_secs(60));
    assert!(!timer.is_running());
    assert!(!timer.has_timed_out());
    assert_eq!(timer.timeout(), Duration::from_secs(5));
}

#[test]
fn test_system_clock_timer() {
    let mut timer = Timer::new(Duration::from_secs(3600));
    timer.start();
    assert!(timer.is_running());
    assert!(!timer.has_timed_out());
}

// ============================================================================
// AsyncJob Tests
// ============================================================================

#[test_case(Running, false, Running)]
#[test_case(Completed, false, Completed)]
#[test_case(Failed, false, Failed)]
#[test_case(Running, true, TimedOut)]
#[test_case(Completed, true, TimedOut)]
#[test_case(Failed, true, TimedOut)]
fn test_compute_status(recorded: AsyncJobStatus, timed_out: bool, expected: AsyncJobStatus) {
    assert_eq!(compute_status(recorded, timed_out), expected);
}

#[test]
fn test_status_names() {
    let names: Vec<_> = AsyncJobStatus::ALL.iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["RUNNING", "COMPLETED", "FAILED", "TIMED_OUT"]);

    assert_eq!(serde_json::to_string(&TimedOut).unwrap(), r#""TIMED_OUT""#);
    assert!(!Running.is_terminal());
    assert!(Completed.is_terminal());
    assert!(Failed.is_terminal());
    assert!(TimedOut.is_terminal());
}

#[test]
fn test_job_starts_running_and_armed() {
    let job = AsyncJob::new("j1");
    assert_eq!(job.api_job_id(), "j1");
    assert_eq!(job.status(), Running);
    assert!(job.timer().is_running());
    assert_eq!(job.timer().timeout(), DEFAULT_JOB_TIMEOUT);

    let job = AsyncJob::with_timeout("j2", Duration::from_secs(30));
    assert_eq!(job.timer().timeout(), Duration::from_secs(30));
}

#[test]
fn test_job_times_out() {
    let clock = ManualClock::new();
    let job = AsyncJob::with_clock("j1", Duration::from_secs(60), Arc::new(clock.clone()));

    clock.advance(Duration::from_secs(61));
    assert_eq!(job.status(), TimedOut);
    assert_eq!(job.recorded_status(), Running);
}

#[test]
fn test_job_terminal_status_stops_timer() {
    let clock = ManualClock::new();
    let mut job = AsyncJob::with_clock("j1", Duration::from_secs(60), Arc::new(clock.clone()));

    job.update_status(Completed);
    clock.advance(Duration::from_secs(600));
    assert!(!job.timer().is_running());
    assert_eq!(job.status(), Completed);
}

#[test]
fn test_job_expired_before_refresh_reports_timed_out() {
    let clock = ManualClock::new();
    let mut job = AsyncJob::with_clock("j1", Duration::from_secs(60), Arc::new(clock.clone()));

    clock.advance(Duration::from_secs(61));
    assert_eq!(job.status(), TimedOut);

    // Finished upstream meanwhile: the refresh wins
    job.update_status(Completed);
    assert_eq!(job.status(), Completed);
}

#[test]
fn test_job_restart_rearms_timer() {
    let clock = ManualClock::new();
    let mut job = AsyncJob::with_clock("j1", Duration::from_secs(60), Arc::new(clock.clone()));

    job.update_status(Failed);
    clock.advance(Duration::from_secs(120));
    job.update_status(Running);

    assert!(job.timer().is_running());
    assert_eq!(job.status(), Running);

    clock.advance(Duration::from_secs(59));
    assert_eq!(job.status(), Running);
    clock.advance(Duration::from_secs(1));
    assert_eq!(job.status(), TimedOut);
}

#[test]
fn test_job_running_update_keeps_timer() {
    let clock = ManualClock::new();
    let mut job = AsyncJob::with_clock("j1", Duration::from_secs(60), Arc::new(clock.clone()));

    clock.advance(Duration::from_secs(40));
    job.update_status(Running);
    clock.advance(Duration::from_secs(20));

    assert_eq!(job.status(), TimedOut);
}

// ============================================================================
// AsyncPartition Tests
// ============================================================================

#[test_case(&[Running, Completed], Running ; "running wins over completed")]
#[test_case(&[Failed, Completed, TimedOut], Failed ; "failed wins over everything")]
#[test_case(&[Completed; 10], Completed ; "all completed")]
#[test_case(&[Running, Completed, TimedOut], TimedOut ; "timed out wins over running")]
#[test_case(&[Running, Completed, Failed, TimedOut], Failed ; "every status")]
#[test_case(&[], Completed ; "no jobs")]
fn test_aggregate_status(statuses: &[AsyncJobStatus], expected: AsyncJobStatus) {
    assert_eq!(aggregate_status(statuses.iter().copied()), expected);
}

#[test]
fn test_partition_status_uses_job_timers() {
    let clock = ManualClock::new();
    let mut done = AsyncJob::with_clock("a", Duration::from_secs(10), Arc::new(clock.clone()));
    done.update_status(Completed);
    let running = AsyncJob::with_clock("b", Duration::from_secs(10), Arc::new(clock.clone()));

    let partition = AsyncPartition::new(vec![done, running], StreamSlice::new("s"));
    assert_eq!(partition.status(), Running);
    assert_eq!(partition.job_ids(), vec!["a", "b"]);
    assert_eq!(partition.jobs().len(), 2);
    assert_eq!(partition.stream_slice().id, "s");

    clock.advance(Duration::from_secs(10));
    assert_eq!(partition.status(), TimedOut);
}

// ============================================================================
// AsyncJobOrchestrator Tests
// ============================================================================

#[tokio::test]
async fn test_orchestrator_polls_until_completed() {
    let repository = Arc::new(FakeRepository::new().job("a", "job-a", &[Running, Running, Completed]));
    let orchestrator = orchestrator(&repository, &["a"]);

    let partitions: Vec<_> = run(&orchestrator).await.into_iter().map(Result::unwrap).collect();

    assert_eq!(partitions.len(), 1);
    assert_eq!(partitions[0].stream_slice().id, "a");
    assert_eq!(partitions[0].status(), Completed);
    assert_eq!(repository.polls().len(), 3);
}

#[tokio::test]
async fn test_orchestrator_polls_only_running_jobs() {
    let repository = Arc::new(
        FakeRepository::new()
            .job("a", "a", &[Completed])
            .job("b", "another", &[Running, Completed]),
    );
    let orchestrator = orchestrator(&repository, &["a", "b"]);

    let partitions: Vec<_> = run(&orchestrator).await.into_iter().map(Result::unwrap).collect();

    let ids: Vec<_> = partitions.iter().map(|p| p.stream_slice().id.clone()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(
        repository.polls(),
        vec![
            vec!["a".to_string(), "another".to_string()],
            vec!["another".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_orchestrator_one_partition_per_slice() {
    let repository = Arc::new(FakeRepository::new());
    for id in ["s1", "s2", "s3", "s4"] {
        repository
            .scripts
            .lock()
            .unwrap()
            .insert(format!("job-{id}"), VecDeque::from([Completed]));
    }
    let orchestrator = orchestrator(&repository, &["s1", "s2", "s3", "s4"]);

    let partitions: Vec<_> = run(&orchestrator).await.into_iter().map(Result::unwrap).collect();

    assert_eq!(partitions.len(), 4);
    for partition in &partitions {
        assert_eq!(partition.jobs().len(), 1);
        assert_eq!(
            partition.job_ids(),
            vec![format!("job-{}", partition.stream_slice().id)]
        );
    }
}

#[tokio::test]
async fn test_orchestrator_raises_on_failed_job() {
    let repository = Arc::new(FakeRepository::new().job("a", "job-a", &[Running, Failed]));
    let orchestrator = orchestrator(&repository, &["a"]);

    let items = run(&orchestrator).await;

    assert_eq!(items.len(), 1);
    match &items[0] {
        Err(Error::AsyncJob { job_ids, status, stream_slice }) => {
            assert_eq!(job_ids, &vec!["job-a".to_string()]);
            assert_eq!(*status, Failed);
            assert_eq!(stream_slice, r#"{"id":"a"}"#);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_orchestrator_yields_completed_before_failure() {
    let repository = Arc::new(
        FakeRepository::new()
            .job("a", "job-a", &[Completed])
            .job("b", "job-b", &[Failed])
            .job("c", "job-c", &[Completed]),
    );
    let orchestrator = orchestrator(&repository, &["a", "b", "c"]);

    let items = run(&orchestrator).await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().stream_slice().id, "a");
    assert!(items[1].as_ref().unwrap_err().is_async_job_failure());
}

#[tokio::test]
async fn test_orchestrator_raises_on_timeout() {
    let clock = ManualClock::new();
    let repository = Arc::new(FakeRepository::new().with_clock(
        clock,
        Duration::from_secs(60),
        Duration::from_secs(45),
    ));
    let orchestrator = orchestrator(&repository, &["slow"]);

    let items = run(&orchestrator).await;

    assert_eq!(items.len(), 1);
    assert!(matches!(
        items[0],
        Err(Error::AsyncJob {
            status: AsyncJobStatus::TimedOut,
            ..
        })
    ));
    assert_eq!(repository.polls().len(), 2);
}

#[tokio::test]
async fn test_orchestrator_skips_poll_when_nothing_runs() {
    let repository = Arc::new(FakeRepository::new().with_clock(
        ManualClock::new(),
        Duration::ZERO,
        Duration::ZERO,
    ));
    let orchestrator = orchestrator(&repository, &["instant"]);

    let items = run(&orchestrator).await;

    assert!(matches!(
        items[..],
        [Err(Error::AsyncJob {
            status: AsyncJobStatus::TimedOut,
            ..
        })]
    ));
    assert!(repository.polls().is_empty());
}

#[tokio::test]
async fn test_orchestrator_surfaces_start_failure() {
    let repository = Arc::new(FakeRepository {
        failing_start: Some("b".to_string()),
        ..FakeRepository::new()
    });
    let orchestrator = orchestrator(&repository, &["a", "b"]);

    let items = run(&orchestrator).await;

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Err(Error::HttpStatus { status: 500, .. })));
    assert!(repository.polls().is_empty());
}

#[tokio::test]
async fn test_orchestrator_no_slices() {
    let repository = Arc::new(FakeRepository::new());
    let orchestrator = orchestrator(&repository, &[]);

    assert!(run(&orchestrator).await.is_empty());
    assert!(repository.polls().is_empty());
}

#[tokio::test]
async fn test_orchestrator_multi_job_partition() {
    let repository = Arc::new(
        FakeRepository::new()
            .job("a", "a-1", &[Completed])
            .job("a", "a-2", &[Running, Completed]),
    );
    let orchestrator = orchestrator(&repository, &["a"]);

    let partitions: Vec<_> = run(&orchestrator).await.into_iter().map(Result::unwrap).collect();

    assert_eq!(partitions.len(), 1);
    assert_eq!(partitions[0].job_ids(), vec!["a-1", "a-2"]);
    assert_eq!(
        repository.polls(),
        vec![
            vec!["a-1".to_string(), "a-2".to_string()],
            vec!["a-2".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_fetch_records_in_job_order() {
    let repository = Arc::new(
        FakeRepository::new()
            .job("a", "j1", &[Completed])
            .job("a", "j2", &[Completed])
            .records("j1", vec![json!({"r": 1})])
            .records("j2", vec![json!({"r": 2}), json!({"r": 3})]),
    );
    let orchestrator = orchestrator(&repository, &["a"]);
    let partition = run(&orchestrator).await.pop().unwrap().unwrap();

    let records: Vec<_> = orchestrator.fetch_records(&partition).try_collect().await.unwrap();

    assert_eq!(records, vec![json!({"r": 1}), json!({"r": 2}), json!({"r": 3})]);
}

#[tokio::test]
async fn test_fetch_records_propagates_failure() {
    let repository = Arc::new(
        FakeRepository::new()
            .job("a", "j1", &[Completed])
            .job("a", "missing", &[Completed])
            .records("j1", vec![json!({"r": 1})]),
    );
    let orchestrator = orchestrator(&repository, &["a"]);
    let partition = run(&orchestrator).await.pop().unwrap().unwrap();

    let items: Vec<_> = orchestrator.fetch_records(&partition).collect().await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), &json!({"r": 1}));
    assert!(matches!(items[1], Err(Error::HttpStatus { status: 404, .. })));
}

#[test]
fn test_orchestrator_config() {
    let config = OrchestratorConfig::default();
    assert_eq!(config.poll_interval(), Duration::from_secs(5));

    let config: OrchestratorConfig = serde_json::from_str(r#"{"poll_interval_secs": 1}"#).unwrap();
    assert_eq!(config.poll_interval(), Duration::from_secs(1));
}

// ============================================================================
// AsyncJobStream Tests
// ============================================================================

#[tokio::test]
async fn test_async_job_stream_reads_completed_partitions() {
    let repository = Arc::new(
        FakeRepository::new()
            .job("us", "job-us", &[Completed])
            .job("eu", "job-eu", &[Running, Completed])
            .records("job-us", vec![json!({"region": "us"})])
            .records("job-eu", vec![json!({"region": "eu", "n": 1}), json!({"region": "eu", "n": 2})]),
    );
    let slicer = ListSlicer::new(vec!["us".to_string(), "eu".to_string()], "region");
    let stream = AsyncJobStream::from_slicer(
        "accounts",
        Arc::clone(&repository) as Arc<dyn JobRepository>,
        &slicer,
        no_wait(),
    )
    .unwrap();
    assert_eq!(stream.name(), "accounts");

    let slices = stream.stream_slices(SyncMode::FullRefresh, None).await.unwrap();
    let ids: Vec<_> = slices.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["us", "eu"]);

    let eu = stream
        .read_records(SyncMode::FullRefresh, None, &slices[1])
        .await
        .unwrap();
    assert_eq!(
        eu,
        vec![
            StreamData::Record(json!({"region": "eu", "n": 1})),
            StreamData::Record(json!({"region": "eu", "n": 2})),
        ]
    );

    // A partition is handed out once
    let again = stream
        .read_records(SyncMode::FullRefresh, None, &slices[1])
        .await;
    assert!(matches!(again, Err(Error::Consumer { .. })));
}

#[tokio::test]
async fn test_async_job_stream_reads_every_partition_of_duplicate_slices() {
    let repository = Arc::new(
        FakeRepository::new()
            .job("dup", "job-dup", &[Completed, Completed])
            .records("job-dup", vec![json!({"n": 1})]),
    );
    let slicer = ListSlicer::new(vec!["dup".to_string(), "dup".to_string()], "region");
    let stream = AsyncJobStream::from_slicer(
        "accounts",
        Arc::clone(&repository) as Arc<dyn JobRepository>,
        &slicer,
        no_wait(),
    )
    .unwrap();

    let reader = ConcurrentStreamReader::new(
        Arc::new(StreamSlicePartitionGenerator::new()),
        ReaderConfig::new().with_max_workers(1),
    );
    let items: Vec<_> = reader
        .read_stream(Arc::new(stream), None, InternalConfig::unbounded())
        .collect()
        .await;

    let records: Vec<_> = items
        .into_iter()
        .map(Result::unwrap)
        .filter(StreamData::is_record)
        .collect();
    assert_eq!(
        records,
        vec![StreamData::Record(json!({"n": 1})), StreamData::Record(json!({"n": 1}))]
    );
}

#[tokio::test]
async fn test_async_job_stream_fails_on_failed_job() {
    let repository = Arc::new(FakeRepository::new().job("a", "job-a", &[Failed]));
    let stream = AsyncJobStream::new(
        "accounts",
        repository as Arc<dyn JobRepository>,
        slices(&["a"]),
        no_wait(),
    );

    let err = stream
        .stream_slices(SyncMode::FullRefresh, None)
        .await
        .unwrap_err();
    assert!(err.is_async_job_failure());
}

// ============================================================================
// HttpJobRepository Tests
// ============================================================================

fn http_config(server: &MockServer) -> AsyncJobHttpConfig {
    AsyncJobHttpConfig::new()
        .with_http(HttpClientConfig::new(server.uri()).with_rate_limit(None))
        .with_create(
            Method::POST,
            "/jobs",
            Some(json!({"object": "{{ slice.object }}"})),
        )
        .with_poll("/jobs/{{ job_id }}", "state")
        .with_download("/jobs/{{ job_id }}/results", Some("records"))
}

#[tokio::test]
async fn test_http_repository_start() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(body_json(json!({"object": "Account"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "750x"})))
        .expect(1)
        .mount(&server)
        .await;

    let repository = HttpJobRepository::new(http_config(&server).with_job_timeout_minutes(5)).unwrap();
    let slice = StreamSlice::new("acc").with_string("object", "Account");
    let job = repository.start(&slice).await.unwrap();

    assert_eq!(job.api_job_id(), "750x");
    assert_eq!(job.status(), Running);
    assert_eq!(job.timer().timeout(), Duration::from_secs(300));
}

#[tokio::test]
async fn test_http_repository_numeric_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"job": 42}})))
        .mount(&server)
        .await;

    let mut config = http_config(&server);
    config.job_id_path = "data.job".to_string();
    let repository = HttpJobRepository::new(config).unwrap();

    let job = repository
        .start(&StreamSlice::new("s").with_string("object", "Lead"))
        .await
        .unwrap();
    assert_eq!(job.api_job_id(), "42");
}

#[tokio::test]
async fn test_http_repository_missing_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "Open"})))
        .mount(&server)
        .await;

    let repository = HttpJobRepository::new(http_config(&server)).unwrap();
    let err = repository
        .start(&StreamSlice::new("s").with_string("object", "Lead"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MissingJobField { .. }));
}

#[tokio::test]
async fn test_http_repository_start_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let repository = HttpJobRepository::new(http_config(&server)).unwrap();
    let err = repository
        .start(&StreamSlice::new("s").with_string("object", "Lead"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
}

#[tokio::test]
async fn test_http_repository_update_status() {
    let server = MockServer::start().await;
    for (id, state) in [("j1", "JobComplete"), ("j2", "Failed"), ("j3", "InProgress")] {
        Mock::given(method("GET"))
            .and(path(format!("/jobs/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": state})))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/jobs/j4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"other": 1})))
        .mount(&server)
        .await;

    let repository = HttpJobRepository::new(http_config(&server)).unwrap();
    let mut jobs: Vec<_> = ["j1", "j2", "j3", "j4"].into_iter().map(AsyncJob::new).collect();
    let mut refs: Vec<&mut AsyncJob> = jobs.iter_mut().collect();

    repository.update_jobs_status(&mut refs).await.unwrap();

    let statuses: Vec<_> = jobs.iter().map(AsyncJob::status).collect();
    assert_eq!(statuses, vec![Completed, Failed, Running, Running]);
}

#[tokio::test]
async fn test_http_repository_fetch_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/j1/results"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"records": [{"Id": "001"}, {"Id": "002"}]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/j2/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
        .mount(&server)
        .await;

    let repository = HttpJobRepository::new(http_config(&server)).unwrap();

    let records = repository.fetch_records(&AsyncJob::new("j1")).await.unwrap();
    assert_eq!(records, vec![json!({"Id": "001"}), json!({"Id": "002"})]);

    let records = repository.fetch_records(&AsyncJob::new("j2")).await.unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_http_repository_rejects_invalid_config() {
    let err = HttpJobRepository::new(AsyncJobHttpConfig::new()).unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
}
