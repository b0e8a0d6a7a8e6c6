use crate::{SessionId, StatusSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the home URL field.
    HomeUrlChanged(String),
    /// User edited the levels field.
    LevelsChanged(String),
    /// User asked for a sitemap to be generated from the current fields.
    SubmitClicked,
    /// Backend accepted the job and handed out a token.
    JobStarted { session_id: SessionId, token: String },
    /// Start request failed in transport or returned garbage.
    StartFailed { session_id: SessionId, reason: String },
    /// One status poll came back. `seq` counts polls within the session, from 1.
    StatusReceived {
        session_id: SessionId,
        seq: u64,
        snapshot: StatusSnapshot,
    },
    /// A status poll failed; polling for the session is over.
    PollFailed { session_id: SessionId, reason: String },
    /// Render tick.
    Tick,
    NoOp,
}
