use crate::state::StatusOutcome;
use crate::{AppState, Effect, Msg, Phase};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::HomeUrlChanged(text) => {
            state.set_home_url(text);
            Vec::new()
        }
        Msg::LevelsChanged(text) => {
            state.set_levels(text);
            Vec::new()
        }
        Msg::SubmitClicked => {
            let mut effects = Vec::with_capacity(2);
            // The old loop must be gone before the new job can start polling.
            if let Some(previous) = state.polling_session_id() {
                effects.push(Effect::CancelPolling {
                    session_id: previous,
                });
            }
            let (session_id, request) = state.begin_session();
            effects.push(Effect::StartJob {
                session_id,
                request,
            });
            effects
        }
        Msg::JobStarted { session_id, token } => {
            if state.accept_token(session_id, &token) {
                vec![Effect::StartPolling { session_id, token }]
            } else {
                Vec::new()
            }
        }
        Msg::StartFailed { session_id, reason } => {
            state.fail_session(session_id, Phase::Submitted, reason);
            Vec::new()
        }
        Msg::StatusReceived {
            session_id,
            seq,
            snapshot,
        } => match state.apply_status(session_id, seq, snapshot) {
            StatusOutcome::Completed => vec![Effect::CancelPolling { session_id }],
            StatusOutcome::Updated | StatusOutcome::Ignored => Vec::new(),
        },
        Msg::PollFailed { session_id, reason } => {
            if state.fail_session(session_id, Phase::Polling, reason) {
                vec![Effect::CancelPolling { session_id }]
            } else {
                Vec::new()
            }
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
