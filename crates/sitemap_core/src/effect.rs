use crate::{JobRequest, SessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue the start-job request for a freshly submitted session.
    StartJob {
        session_id: SessionId,
        request: JobRequest,
    },
    /// Begin the recurring status poll bound to `token`.
    StartPolling { session_id: SessionId, token: String },
    /// Stop the recurring poll for `session_id`. Idempotent.
    CancelPolling { session_id: SessionId },
}
