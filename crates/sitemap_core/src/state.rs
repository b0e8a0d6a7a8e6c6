use url::form_urlencoded;

use crate::view_model::{AppViewModel, StatField};

pub type SessionId = u64;

const DOWNLOAD_PATH: &str = "sitemap.xml";

/// Parameters of one sitemap job, captured from the input fields at submit time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobRequest {
    pub home_url: String,
    /// Crawl depth, passed through verbatim; the backend parses it.
    pub levels: String,
}

/// Crawl progress as last reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    pub root_url: Option<String>,
    pub max_level: Option<u64>,
    pub found_urls: Option<u64>,
    pub scan_queue: Option<u64>,
    pub last_modify_queue: Option<u64>,
    pub done: bool,
}

impl StatusSnapshot {
    /// Display fields for every value the backend sent, in a stable order.
    pub fn fields(&self) -> Vec<StatField> {
        let mut fields = Vec::with_capacity(5);
        if let Some(root) = &self.root_url {
            fields.push(StatField::new("rootURL", root.clone()));
        }
        let counts = [
            ("maxLevel", self.max_level),
            ("foundURLs", self.found_urls),
            ("scanQueue", self.scan_queue),
            ("lastModifyQueue", self.last_modify_queue),
        ];
        for (id, value) in counts {
            if let Some(value) = value {
                fields.push(StatField::new(id, value.to_string()));
            }
        }
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitted,
    Polling,
    Done,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }
}

/// Relative link to the finished sitemap for `token`.
pub fn download_href(token: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(token.as_bytes()).collect();
    format!("{DOWNLOAD_PATH}?token={encoded}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Session {
    id: SessionId,
    request: JobRequest,
    phase: Phase,
    token: Option<String>,
    snapshot: Option<StatusSnapshot>,
    last_seq: u64,
    failure: Option<String>,
}

impl Session {
    fn new(id: SessionId, request: JobRequest) -> Self {
        Self {
            id,
            request,
            phase: Phase::Submitted,
            token: None,
            snapshot: None,
            last_seq: 0,
            failure: None,
        }
    }
}

/// What applying a status response did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusOutcome {
    Ignored,
    Updated,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    home_url_input: String,
    levels_input: String,
    next_session_id: SessionId,
    session: Option<Session>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let session = self.session.as_ref();
        let phase = session.map_or(Phase::Idle, |s| s.phase);
        // Stats stay visible after completion or a failed poll; only a
        // session that never got a token keeps them hidden.
        let stats_visible = session.is_some_and(|s| s.token.is_some());
        let result_href = session
            .filter(|s| s.phase == Phase::Done)
            .and_then(|s| s.token.as_deref())
            .map(download_href);

        AppViewModel {
            phase,
            home_url: self.home_url_input.clone(),
            levels: self.levels_input.clone(),
            session_id: session.map(|s| s.id),
            submitted: session.map(|s| s.request.clone()),
            token: session.and_then(|s| s.token.clone()),
            stats_visible,
            stats: session
                .and_then(|s| s.snapshot.as_ref())
                .map(StatusSnapshot::fields)
                .unwrap_or_default(),
            result_href,
            failure: session.and_then(|s| s.failure.clone()),
        }
    }

    /// Returns whether anything visible changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn phase(&self) -> Phase {
        self.session.as_ref().map_or(Phase::Idle, |s| s.phase)
    }

    pub(crate) fn set_home_url(&mut self, text: String) {
        if self.home_url_input != text {
            self.home_url_input = text;
            self.dirty = true;
        }
    }

    pub(crate) fn set_levels(&mut self, text: String) {
        if self.levels_input != text {
            self.levels_input = text;
            self.dirty = true;
        }
    }

    /// Session that currently owns a running poll loop, if any.
    pub(crate) fn polling_session_id(&self) -> Option<SessionId> {
        self.session
            .as_ref()
            .filter(|s| s.phase == Phase::Polling)
            .map(|s| s.id)
    }

    /// Replaces any previous session with a new one built from the inputs.
    pub(crate) fn begin_session(&mut self) -> (SessionId, JobRequest) {
        self.next_session_id += 1;
        let id = self.next_session_id;
        let request = JobRequest {
            home_url: self.home_url_input.trim().to_string(),
            levels: self.levels_input.trim().to_string(),
        };
        self.session = Some(Session::new(id, request.clone()));
        self.dirty = true;
        (id, request)
    }

    /// Binds `token` to the session if it is still waiting for one.
    pub(crate) fn accept_token(&mut self, session_id: SessionId, token: &str) -> bool {
        let Some(session) = self.live_session(session_id, Phase::Submitted) else {
            return false;
        };
        session.token = Some(token.to_string());
        session.phase = Phase::Polling;
        self.dirty = true;
        true
    }

    pub(crate) fn apply_status(
        &mut self,
        session_id: SessionId,
        seq: u64,
        snapshot: StatusSnapshot,
    ) -> StatusOutcome {
        let Some(session) = self.live_session(session_id, Phase::Polling) else {
            return StatusOutcome::Ignored;
        };
        // Overlapping requests may answer out of order.
        if seq <= session.last_seq {
            return StatusOutcome::Ignored;
        }
        session.last_seq = seq;
        let done = snapshot.done;
        session.snapshot = Some(snapshot);
        if done {
            session.phase = Phase::Done;
        }
        self.dirty = true;
        if done {
            StatusOutcome::Completed
        } else {
            StatusOutcome::Updated
        }
    }

    /// Marks the session failed if it is still in `expected` phase.
    pub(crate) fn fail_session(
        &mut self,
        session_id: SessionId,
        expected: Phase,
        reason: String,
    ) -> bool {
        let Some(session) = self.live_session(session_id, expected) else {
            return false;
        };
        session.phase = Phase::Failed;
        session.failure = Some(reason);
        self.dirty = true;
        true
    }

    fn live_session(&mut self, session_id: SessionId, expected: Phase) -> Option<&mut Session> {
        self.session
            .as_mut()
            .filter(|s| s.id == session_id && s.phase == expected)
    }
}
