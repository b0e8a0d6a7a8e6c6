use std::path::PathBuf;
use std::time::Duration;

use poller_logging::{poller_info, poller_warn};
use sitemap_core::{Effect, JobRequest, Msg, SessionId, StatusSnapshot};
use sitemap_engine::{
    DownloadError, EngineEvent, EngineHandle, PollSchedule, StartRequest, StatusReport,
};

/// Something the app loop has to react to.
pub enum Inbound {
    Msg(Msg),
    Downloaded(Result<PathBuf, DownloadError>),
}

pub struct EffectRunner {
    engine: EngineHandle,
    schedule: PollSchedule,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, schedule: PollSchedule) -> Self {
        Self { engine, schedule }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartJob {
                    session_id,
                    request,
                } => {
                    poller_info!(
                        "StartJob session_id={} home_url={}",
                        session_id,
                        request.home_url
                    );
                    self.engine.start_job(session_id, map_request(request));
                }
                Effect::StartPolling { session_id, token } => {
                    poller_info!("StartPolling session_id={} token={}", session_id, token);
                    self.engine.start_polling(session_id, token, self.schedule);
                }
                Effect::CancelPolling { session_id } => {
                    self.engine.cancel_polling(session_id);
                }
            }
        }
    }

    pub fn download(&self, session_id: SessionId, token: String, target: PathBuf) {
        self.engine.download(session_id, token, target);
    }

    pub fn next_inbound(&self, timeout: Duration) -> Option<Inbound> {
        self.engine.recv_timeout(timeout).map(map_event)
    }
}

fn map_request(request: JobRequest) -> StartRequest {
    StartRequest {
        home_url: request.home_url,
        levels: request.levels,
    }
}

fn map_event(event: EngineEvent) -> Inbound {
    let msg = match event {
        EngineEvent::JobStarted { session_id, token } => Msg::JobStarted { session_id, token },
        EngineEvent::StartFailed { session_id, error } => Msg::StartFailed {
            session_id,
            reason: error.to_string(),
        },
        EngineEvent::Status {
            session_id,
            seq,
            report,
        } => Msg::StatusReceived {
            session_id,
            seq,
            snapshot: map_report(report),
        },
        EngineEvent::PollFailed {
            session_id,
            seq,
            error,
        } => {
            poller_warn!("Poll {} of session {} failed: {}", seq, session_id, error);
            Msg::PollFailed {
                session_id,
                reason: error.to_string(),
            }
        }
        EngineEvent::Downloaded { result, .. } => return Inbound::Downloaded(result),
    };
    Inbound::Msg(msg)
}

fn map_report(report: StatusReport) -> StatusSnapshot {
    StatusSnapshot {
        root_url: report.root_url,
        max_level: report.max_level,
        found_urls: report.found_urls,
        scan_queue: report.scan_queue,
        last_modify_queue: report.last_modify_queue,
        done: report.done,
    }
}
