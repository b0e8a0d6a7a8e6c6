use std::sync::{mpsc, Arc};
use std::time::Duration;

use poller_logging::{poller_debug, poller_info, poller_warn};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{Backoff, EngineEvent, JobApi, PollSchedule, SessionId, StatusReport};

const MIN_PERIOD: Duration = Duration::from_millis(1);

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Clone)]
struct PollContext {
    api: Arc<dyn JobApi>,
    session_id: SessionId,
    token: Arc<str>,
    cancel: CancellationToken,
    sink: Arc<dyn EventSink>,
}

/// Polls the status endpoint for one session until the job is done, a poll
/// fails, or `cancel` fires. Cancels `cancel` itself on done or failure.
pub async fn run_poll_loop(
    api: Arc<dyn JobApi>,
    session_id: SessionId,
    token: String,
    schedule: PollSchedule,
    cancel: CancellationToken,
    sink: Arc<dyn EventSink>,
) {
    poller_info!("session {} polling with {:?}", session_id, schedule);
    let ctx = PollContext {
        api,
        session_id,
        token: token.into(),
        cancel,
        sink,
    };
    match schedule {
        PollSchedule::Fixed { period } => fixed_loop(ctx, period.max(MIN_PERIOD)).await,
        PollSchedule::Backoff {
            initial,
            max,
            factor,
        } => backoff_loop(ctx, Backoff::new(initial.max(MIN_PERIOD), max, factor)).await,
    }
    poller_debug!("session {} poll loop exited", session_id);
}

async fn fixed_loop(ctx: PollContext, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut seq = 0;
    loop {
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            _ = ticker.tick() => {
                seq += 1;
                // Not awaited: a slow backend gets overlapping requests.
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    poll_once(&ctx, seq).await;
                });
            }
        }
    }
}

async fn backoff_loop(ctx: PollContext, mut backoff: Backoff) {
    let mut delay = backoff.current();
    let mut last: Option<StatusReport> = None;
    let mut seq = 0;
    loop {
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
        seq += 1;
        let Some(report) = poll_once(&ctx, seq).await else {
            break;
        };
        let progressed = last.as_ref() != Some(&report);
        delay = backoff.next_delay(progressed);
        last = Some(report);
    }
}

/// Returns the report while the job is still running, `None` once polling must stop.
async fn poll_once(ctx: &PollContext, seq: u64) -> Option<StatusReport> {
    let result = ctx.api.poll_status(&ctx.token).await;
    let _tick = poller_logging::enter_poll_tick(seq);
    match result {
        Ok(report) => {
            let done = report.done;
            poller_debug!(
                "session {} found={:?} queued={:?} done={}",
                ctx.session_id,
                report.found_urls,
                report.scan_queue,
                done
            );
            let running = (!done).then(|| report.clone());
            ctx.sink.emit(EngineEvent::Status {
                session_id: ctx.session_id,
                seq,
                report,
            });
            if done {
                poller_info!("session {} finished", ctx.session_id);
                ctx.cancel.cancel();
            }
            running
        }
        Err(error) => {
            poller_warn!("session {} status poll failed: {}", ctx.session_id, error);
            ctx.sink.emit(EngineEvent::PollFailed {
                session_id: ctx.session_id,
                seq,
                error,
            });
            ctx.cancel.cancel();
            None
        }
    }
}
