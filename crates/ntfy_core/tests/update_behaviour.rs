use std::sync::Once;

use ntfy_core::{
    update, AppState, ClientEvent, Effect, Msg, SinceWindow, SubscriptionError, SubscriptionKey,
    SubscriptionStatus,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ntfy_logging::initialize_for_tests);
}

fn key(server: &str, topic: &str) -> SubscriptionKey {
    SubscriptionKey::new(server, topic).unwrap()
}

fn with_subscriptions(keys: &[SubscriptionKey]) -> AppState {
    keys.iter().fold(AppState::new(), |state, key| {
        update(state, Msg::SubscriptionAdded(key.clone())).0
    })
}

#[test]
fn adding_a_subscription_notifies_and_persists() {
    init_logging();
    let alerts = key("ntfy.sh", "alerts");
    let (mut state, effects) = update(AppState::new(), Msg::SubscriptionAdded(alerts.clone()));

    assert_eq!(
        effects,
        vec![
            Effect::Notify(ClientEvent::SubscriptionAdded(alerts.clone())),
            Effect::Persist,
        ]
    );
    let view = state.view();
    assert_eq!(view.subscriptions.len(), 1);
    assert_eq!(view.subscriptions[0].server, "https://ntfy.sh");
    assert_eq!(view.subscriptions[0].status, SubscriptionStatus::Disconnected);
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn duplicate_subscriptions_are_rejected_up_front() {
    init_logging();
    let state = with_subscriptions(&[key("https://ntfy.sh", "alerts")]);

    assert_eq!(
        state.validate_new_subscription("ntfy.sh/", "alerts"),
        Err(SubscriptionError::Duplicate(key("ntfy.sh", "alerts")))
    );
    assert_eq!(
        state.validate_new_subscription("ntfy.sh", "other"),
        Ok(key("ntfy.sh", "other"))
    );

    let (state, effects) = update(state, Msg::SubscriptionAdded(key("ntfy.sh", "alerts")));
    assert!(effects.is_empty());
    assert_eq!(state.registry().len(), 1);
}

#[test]
fn start_listening_starts_every_subscription() {
    init_logging();
    let a = key("ntfy.sh", "a");
    let b = key("http://localhost:8080", "b");
    let state = with_subscriptions(&[a.clone(), b.clone()]);

    let (state, effects) = update(
        state,
        Msg::StartListening {
            auto_reconnect: false,
        },
    );
    assert!(state.is_listening());
    assert!(!state.auto_reconnect());
    assert_eq!(
        effects,
        vec![Effect::StartStreams {
            targets: vec![a, b],
            auto_reconnect: false,
        }]
    );
}

#[test]
fn start_listening_without_subscriptions_does_nothing() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::StartListening {
            auto_reconnect: true,
        },
    );
    assert!(!state.is_listening());
    assert!(effects.is_empty());
}

#[test]
fn subscriptions_added_while_listening_get_their_own_worker() {
    init_logging();
    let state = with_subscriptions(&[key("ntfy.sh", "a")]);
    let (state, _) = update(
        state,
        Msg::StartListening {
            auto_reconnect: true,
        },
    );

    let late = key("ntfy.sh", "late");
    let (_state, effects) = update(state, Msg::SubscriptionAdded(late.clone()));
    assert!(effects.contains(&Effect::StartStream {
        target: late,
        auto_reconnect: true,
    }));
}

#[test]
fn removing_an_active_subscription_stops_its_worker_first() {
    init_logging();
    let a = key("ntfy.sh", "a");
    let state = with_subscriptions(&[a.clone()]);
    let (state, _) = update(
        state,
        Msg::StartListening {
            auto_reconnect: true,
        },
    );

    let (state, effects) = update(state, Msg::SubscriptionRemoved(a.clone()));
    assert_eq!(
        effects,
        vec![
            Effect::StopStream { target: a.clone() },
            Effect::Notify(ClientEvent::SubscriptionRemoved(a.clone())),
            Effect::Persist,
        ]
    );
    assert!(state.registry().is_empty());

    let (_state, effects) = update(state, Msg::SubscriptionRemoved(a));
    assert!(effects.is_empty());
}

#[test]
fn stop_listening_stops_all_streams() {
    init_logging();
    let state = with_subscriptions(&[key("ntfy.sh", "a")]);
    let (state, _) = update(
        state,
        Msg::StartListening {
            auto_reconnect: true,
        },
    );
    let (state, effects) = update(state, Msg::StopListening);
    assert!(!state.is_listening());
    assert_eq!(effects, vec![Effect::StopAllStreams]);
}

#[test]
fn status_changes_are_reported_once_and_errors_are_kept() {
    init_logging();
    let a = key("ntfy.sh", "a");
    let state = with_subscriptions(&[a.clone()]);

    let status = |state, status, error: Option<&str>| {
        update(
            state,
            Msg::StatusChanged {
                key: a.clone(),
                status,
                error: error.map(str::to_string),
            },
        )
    };

    let (state, effects) = status(state, SubscriptionStatus::Connecting, None);
    assert_eq!(
        effects,
        vec![Effect::Notify(ClientEvent::StatusChanged {
            key: a.clone(),
            status: SubscriptionStatus::Connecting,
        })]
    );
    let (state, effects) = status(state, SubscriptionStatus::Connecting, None);
    assert!(effects.is_empty());

    let (state, _) = status(state, SubscriptionStatus::Error, Some("connection refused"));
    let (state, _) = status(state, SubscriptionStatus::Disconnected, None);
    let row = &state.view().subscriptions[0];
    assert_eq!(row.status_label, "Disconnected");
    assert_eq!(row.last_error.as_deref(), Some("connection refused"));

    let (state, _) = status(state, SubscriptionStatus::Connected, None);
    assert_eq!(state.view().subscriptions[0].last_error, None);
}

#[test]
fn status_for_unknown_subscription_is_ignored() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::StatusChanged {
            key: key("ntfy.sh", "ghost"),
            status: SubscriptionStatus::Connected,
            error: None,
        },
    );
    assert!(effects.is_empty());
    assert!(state.registry().is_empty());
}

#[test]
fn only_one_history_fetch_runs_at_a_time() {
    init_logging();
    let a = key("ntfy.sh", "a");
    let state = with_subscriptions(&[a.clone()]);

    let (state, effects) = update(state, Msg::HistoryFetchRequested(SinceWindow::OneHour));
    assert_eq!(
        effects,
        vec![Effect::FetchHistory {
            targets: vec![a],
            since: SinceWindow::OneHour,
        }]
    );
    assert!(state.history_fetch_in_progress());

    let (state, effects) = update(state, Msg::HistoryFetchRequested(SinceWindow::All));
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::HistoryFetchFinished {
            since: SinceWindow::OneHour,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(ClientEvent::HistoryFetchCompleted {
            new_count: 0,
            since: SinceWindow::OneHour,
        })]
    );
    assert!(!state.history_fetch_in_progress());
}

#[test]
fn history_fetch_without_subscriptions_is_ignored() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::HistoryFetchRequested(SinceWindow::All));
    assert!(effects.is_empty());
    assert!(!state.history_fetch_in_progress());
}
