use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use poller_logging::{poller_debug, poller_info, poller_warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::poller::{run_poll_loop, ChannelEventSink, EventSink};
use crate::{
    write_atomic, ApiError, ApiSettings, DownloadError, EngineEvent, JobApi, PollSchedule,
    ReqwestJobApi, SessionId, StartRequest,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("could not build job api client: {0}")]
    Api(#[from] ApiError),
}

enum EngineCommand {
    StartJob {
        session_id: SessionId,
        request: StartRequest,
    },
    StartPolling {
        session_id: SessionId,
        token: String,
        schedule: PollSchedule,
    },
    CancelPolling {
        session_id: SessionId,
    },
    Download {
        session_id: SessionId,
        token: String,
        target: PathBuf,
    },
}

pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ApiSettings) -> Result<Self, EngineError> {
        let api: Arc<dyn JobApi> = Arc::new(ReqwestJobApi::new(settings)?);
        Self::with_api(api)
    }

    /// Runs the engine against any `JobApi`, e.g. a scripted one in tests.
    pub fn with_api(api: Arc<dyn JobApi>) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::spawn(move || {
            let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
            let mut loops: HashMap<SessionId, CancellationToken> = HashMap::new();
            while let Ok(command) = cmd_rx.recv() {
                // Loops cancel themselves on done or failure.
                loops.retain(|_, cancel| !cancel.is_cancelled());
                match command {
                    EngineCommand::StartPolling {
                        session_id,
                        token,
                        schedule,
                    } => {
                        let cancel = CancellationToken::new();
                        if let Some(previous) = loops.insert(session_id, cancel.clone()) {
                            previous.cancel();
                        }
                        runtime.spawn(run_poll_loop(
                            api.clone(),
                            session_id,
                            token,
                            schedule,
                            cancel,
                            sink.clone(),
                        ));
                    }
                    EngineCommand::CancelPolling { session_id } => {
                        if let Some(cancel) = loops.remove(&session_id) {
                            poller_debug!("cancelling poll loop for session {}", session_id);
                            cancel.cancel();
                        }
                    }
                    command => {
                        let api = api.clone();
                        let sink = sink.clone();
                        runtime.spawn(async move {
                            handle_command(api.as_ref(), command, sink.as_ref()).await;
                        });
                    }
                }
            }
            for cancel in loops.into_values() {
                cancel.cancel();
            }
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn start_job(&self, session_id: SessionId, request: StartRequest) {
        let _ = self.cmd_tx.send(EngineCommand::StartJob {
            session_id,
            request,
        });
    }

    pub fn start_polling(&self, session_id: SessionId, token: String, schedule: PollSchedule) {
        let _ = self.cmd_tx.send(EngineCommand::StartPolling {
            session_id,
            token,
            schedule,
        });
    }

    pub fn cancel_polling(&self, session_id: SessionId) {
        let _ = self.cmd_tx.send(EngineCommand::CancelPolling { session_id });
    }

    pub fn download(&self, session_id: SessionId, token: String, target: PathBuf) {
        let _ = self.cmd_tx.send(EngineCommand::Download {
            session_id,
            token,
            target,
        });
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(api: &dyn JobApi, command: EngineCommand, sink: &dyn EventSink) {
    match command {
        EngineCommand::StartJob {
            session_id,
            request,
        } => {
            poller_info!(
                "session {} starting job home_url={} levels={}",
                session_id,
                request.home_url,
                request.levels
            );
            let event = match api.start_job(&request).await {
                Ok(token) => EngineEvent::JobStarted { session_id, token },
                Err(error) => {
                    poller_warn!("session {} start failed: {}", session_id, error);
                    EngineEvent::StartFailed { session_id, error }
                }
            };
            sink.emit(event);
        }
        EngineCommand::Download {
            session_id,
            token,
            target,
        } => {
            let result = download(api, &token, target).await;
            if let Err(err) = &result {
                poller_warn!("session {} download failed: {}", session_id, err);
            }
            sink.emit(EngineEvent::Downloaded { session_id, result });
        }
        EngineCommand::StartPolling { .. } | EngineCommand::CancelPolling { .. } => {}
    }
}

async fn download(api: &dyn JobApi, token: &str, target: PathBuf) -> Result<PathBuf, DownloadError> {
    let bytes = api.download_sitemap(token).await?;
    let written = write_atomic(&target, &bytes)?;
    poller_info!("wrote {} bytes of sitemap to {:?}", bytes.len(), written);
    Ok(written)
}
