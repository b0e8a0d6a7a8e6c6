use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sitemap_engine::{
    run_poll_loop, ApiError, ApiFailureKind, EngineEvent, EventSink, JobApi, PollSchedule,
    StartRequest, StatusReport,
};
use tokio_util::sync::CancellationToken;

/// Answers status polls from a script; once the script runs out it keeps
/// repeating the last entry.
struct ScriptedApi {
    script: Mutex<VecDeque<Result<StatusReport, ApiError>>>,
    last: Mutex<Option<Result<StatusReport, ApiError>>>,
    polls: AtomicUsize,
    delay: Duration,
}

impl ScriptedApi {
    fn new(script: Vec<Result<StatusReport, ApiError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            polls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl JobApi for ScriptedApi {
    async fn start_job(&self, _request: &StartRequest) -> Result<String, ApiError> {
        Ok("token".to_string())
    }

    async fn poll_status(&self, _token: &str) -> Result<StatusReport, ApiError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(entry) => {
                *last = Some(entry.clone());
                entry
            }
            None => last.clone().unwrap_or_else(|| Ok(running(0))),
        }
    }

    async fn download_sitemap(&self, _token: &str) -> Result<Vec<u8>, ApiError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn running(found: u64) -> StatusReport {
    StatusReport {
        found_urls: Some(found),
        ..StatusReport::default()
    }
}

fn finished(found: u64) -> StatusReport {
    StatusReport {
        found_urls: Some(found),
        done: true,
        ..StatusReport::default()
    }
}

fn fixed(ms: u64) -> PollSchedule {
    PollSchedule::Fixed {
        period: Duration::from_millis(ms),
    }
}

async fn run(
    api: Arc<ScriptedApi>,
    schedule: PollSchedule,
    cancel: CancellationToken,
) -> Arc<TestSink> {
    let sink = Arc::new(TestSink::default());
    run_poll_loop(api, 9, "token".to_string(), schedule, cancel, sink.clone()).await;
    sink
}

#[tokio::test]
async fn fixed_loop_stops_after_done() {
    poller_logging::initialize_for_tests();
    let api = Arc::new(ScriptedApi::new(vec![Ok(running(10)), Ok(finished(15))]));
    let cancel = CancellationToken::new();

    let sink = run(api.clone(), fixed(20), cancel.clone()).await;
    assert!(cancel.is_cancelled());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(api.polls(), 2);

    let seqs: Vec<(u64, bool)> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::Status {
                session_id: 9,
                seq,
                report,
            } => Some((seq, report.done)),
            _ => None,
        })
        .collect();
    assert_eq!(seqs, vec![(1, false), (2, true)]);
}

#[tokio::test]
async fn fixed_loop_waits_one_period_before_first_poll() {
    let api = Arc::new(ScriptedApi::new(vec![Ok(finished(1))]));
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(run(api.clone(), fixed(200), cancel.clone()));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(api.polls(), 0);

    handle.await.unwrap();
    assert_eq!(api.polls(), 1);
}

#[tokio::test]
async fn fixed_loop_stops_after_first_error() {
    let error = ApiError {
        kind: ApiFailureKind::Network,
        message: "connection refused".to_string(),
    };
    let api = Arc::new(ScriptedApi::new(vec![Ok(running(1)), Err(error.clone())]));
    let cancel = CancellationToken::new();

    let sink = run(api.clone(), fixed(20), cancel.clone()).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(api.polls(), 2);

    let failures: Vec<_> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::PollFailed { seq, error, .. } => Some((seq, error)),
            _ => None,
        })
        .collect();
    assert_eq!(failures, vec![(2, error)]);
}

#[tokio::test]
async fn fixed_loop_overlaps_slow_requests() {
    let mut api = ScriptedApi::new(vec![Ok(running(1))]);
    api.delay = Duration::from_millis(120);
    let api = Arc::new(api);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(run(api.clone(), fixed(20), cancel.clone()));

    // Several ticks fire while the first response is still outstanding.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(api.polls() >= 3, "polls = {}", api.polls());

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test]
async fn external_cancel_stops_loop_without_events() {
    let api = Arc::new(ScriptedApi::new(vec![Ok(running(1))]));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let sink = run(api.clone(), fixed(10), cancel).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(api.polls(), 0);
    assert!(sink.take().is_empty());
}

#[tokio::test]
async fn backoff_loop_is_self_paced_and_stops_on_done() {
    let mut api = ScriptedApi::new(vec![
        Ok(running(1)),
        Ok(running(1)),
        Ok(running(2)),
        Ok(finished(2)),
    ]);
    api.delay = Duration::from_millis(30);
    let api = Arc::new(api);
    let cancel = CancellationToken::new();
    let schedule = PollSchedule::Backoff {
        initial: Duration::from_millis(5),
        max: Duration::from_millis(40),
        factor: 2,
    };

    let sink = run(api.clone(), schedule, cancel.clone()).await;
    assert!(cancel.is_cancelled());
    assert_eq!(api.polls(), 4);

    let seqs: Vec<u64> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::Status { seq, .. } => Some(seq),
            _ => None,
        })
        .collect();
    // Self-paced polls never overlap, so responses arrive in order.
    assert_eq!(seqs, vec![1, 2, 3, 4]);
}
