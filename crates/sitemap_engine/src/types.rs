use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::PersistError;

pub type SessionId = u64;

/// Form fields sent to the start-job endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub home_url: String,
    pub levels: String,
}

/// Decoded status response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusReport {
    pub root_url: Option<String>,
    pub max_level: Option<u64>,
    pub found_urls: Option<u64>,
    pub scan_queue: Option<u64>,
    pub last_modify_queue: Option<u64>,
    pub done: bool,
}

#[derive(Debug)]
pub enum EngineEvent {
    JobStarted {
        session_id: SessionId,
        token: String,
    },
    StartFailed {
        session_id: SessionId,
        error: ApiError,
    },
    Status {
        session_id: SessionId,
        seq: u64,
        report: StatusReport,
    },
    PollFailed {
        session_id: SessionId,
        seq: u64,
        error: ApiError,
    },
    Downloaded {
        session_id: SessionId,
        result: Result<PathBuf, DownloadError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ApiFailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: ApiFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// Body was not the JSON shape the endpoint promises.
    Decode,
    MissingToken,
    TooLarge { max_bytes: u64 },
}

impl fmt::Display for ApiFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailureKind::InvalidUrl => write!(f, "invalid url"),
            ApiFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            ApiFailureKind::Timeout => write!(f, "timeout"),
            ApiFailureKind::Network => write!(f, "network error"),
            ApiFailureKind::Decode => write!(f, "malformed response"),
            ApiFailureKind::MissingToken => write!(f, "missing job token"),
            ApiFailureKind::TooLarge { max_bytes } => {
                write!(f, "response larger than {max_bytes} bytes")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download failed: {0}")]
    Api(#[from] ApiError),
    #[error("could not save sitemap: {0}")]
    Persist(#[from] PersistError),
}
