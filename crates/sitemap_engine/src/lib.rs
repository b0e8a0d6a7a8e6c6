//! Sitemap engine: job API client, poll scheduling and effect execution.
mod api;
mod engine;
mod persist;
mod poller;
mod schedule;
mod types;
mod wire;

pub use api::{ApiSettings, JobApi, ReqwestJobApi};
pub use engine::{EngineError, EngineHandle};
pub use persist::{ensure_output_dir, write_atomic, AtomicFileWriter, PersistError};
pub use poller::{run_poll_loop, ChannelEventSink, EventSink};
pub use schedule::{Backoff, PollSchedule, DEFAULT_POLL_PERIOD};
pub use types::{
    ApiError, ApiFailureKind, DownloadError, EngineEvent, SessionId, StartRequest, StatusReport,
};
