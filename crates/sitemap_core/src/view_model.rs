use crate::{JobRequest, Phase, SessionId};

/// One labelled value in the statistics area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatField {
    pub id: &'static str,
    pub value: String,
}

impl StatField {
    pub fn new(id: &'static str, value: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub home_url: String,
    pub levels: String,
    pub session_id: Option<SessionId>,
    /// Request as it was sent for the current session.
    pub submitted: Option<JobRequest>,
    pub token: Option<String>,
    pub stats_visible: bool,
    pub stats: Vec<StatField>,
    /// Set once the session is done; hidden otherwise.
    pub result_href: Option<String>,
    pub failure: Option<String>,
}
