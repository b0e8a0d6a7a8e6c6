use sitemap_core::{update, AppState, Effect, Msg, Phase, StatusSnapshot};

fn polling_state(token: &str) -> AppState {
    let (state, _) = update(AppState::new(), Msg::HomeUrlChanged("http://example.com".into()));
    let (state, _) = update(state, Msg::LevelsChanged("2".into()));
    let (state, _) = update(state, Msg::SubmitClicked);
    let (state, _) = update(
        state,
        Msg::JobStarted {
            session_id: 1,
            token: token.to_string(),
        },
    );
    state
}

fn found(n: u64, done: bool) -> StatusSnapshot {
    StatusSnapshot {
        found_urls: Some(n),
        done,
        ..StatusSnapshot::default()
    }
}

fn status(session_id: u64, seq: u64, snapshot: StatusSnapshot) -> Msg {
    Msg::StatusReceived {
        session_id,
        seq,
        snapshot,
    }
}

#[test]
fn not_done_responses_keep_polling() {
    let mut state = polling_state("t");
    for seq in 1..=5 {
        let (next, effects) = update(state, status(1, seq, found(seq, false)));
        assert!(effects.is_empty());
        assert_eq!(next.view().result_href, None);
        assert_eq!(next.phase(), Phase::Polling);
        state = next;
    }
}

#[test]
fn out_of_order_response_is_dropped() {
    let state = polling_state("t");
    let (state, _) = update(state, status(1, 3, found(30, false)));
    let (mut state, effects) = update(state, status(1, 2, found(20, false)));

    assert!(effects.is_empty());
    assert!(state.consume_dirty());
    assert_eq!(state.view().stats[0].value, "30");

    let (mut state, _) = update(state, status(1, 3, found(99, false)));
    assert!(!state.consume_dirty());
    assert_eq!(state.view().stats[0].value, "30");
}

#[test]
fn responses_after_done_are_ignored() {
    let state = polling_state("t");
    let (state, effects) = update(state, status(1, 1, found(4, true)));
    assert_eq!(effects, vec![Effect::CancelPolling { session_id: 1 }]);
    let done_view = state.view();

    let (state, effects) = update(state, status(1, 2, found(8, false)));
    assert!(effects.is_empty());
    assert_eq!(state.view(), done_view);

    let (state, effects) = update(
        state,
        Msg::PollFailed {
            session_id: 1,
            reason: "late".into(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view(), done_view);
}

#[test]
fn done_link_is_revealed_once() {
    let state = polling_state("abc123");
    let (state, effects) = update(state, status(1, 1, found(4, true)));
    assert_eq!(effects.len(), 1);
    let (_state, effects) = update(state, status(1, 2, found(4, true)));
    assert!(effects.is_empty());
}

#[test]
fn messages_for_a_replaced_session_are_ignored() {
    let state = polling_state("old");
    let (state, _) = update(state, Msg::SubmitClicked);
    let before = state.view();

    let (state, effects) = update(state, status(1, 1, found(4, true)));
    assert!(effects.is_empty());
    let (state, effects) = update(
        state,
        Msg::JobStarted {
            session_id: 1,
            token: "again".into(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view(), before);
}

#[test]
fn status_before_token_is_ignored() {
    let (state, _) = update(AppState::new(), Msg::SubmitClicked);
    let (state, effects) = update(state, status(1, 1, found(1, false)));
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Submitted);
}

#[test]
fn failure_after_failure_does_not_cancel_twice() {
    let state = polling_state("t");
    let failed = Msg::PollFailed {
        session_id: 1,
        reason: "boom".into(),
    };
    let (state, effects) = update(state, failed.clone());
    assert_eq!(effects.len(), 1);
    let (state, effects) = update(state, failed);
    assert!(effects.is_empty());
    assert_eq!(state.view().failure.as_deref(), Some("boom"));
}
