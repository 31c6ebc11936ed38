use std::sync::Once;

use ntfy_core::{
    update, AppState, ClientEvent, Effect, Message, MessageOrigin, Msg, SinceWindow,
    SubscriptionKey,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ntfy_logging::initialize_for_tests);
}

fn alerts() -> SubscriptionKey {
    SubscriptionKey::new("https://ntfy.sh", "alerts").unwrap()
}

fn decode(line: &str) -> Message {
    Message::decode_line(line.as_bytes(), "https://ntfy.sh").unwrap()
}

/// The message as stored and announced once admitted through `alerts()`.
fn admitted(line: &str) -> Message {
    let mut message = decode(line);
    message.subscription_topic = alerts().topic;
    message
}

fn subscribed() -> AppState {
    update(AppState::new(), Msg::SubscriptionAdded(alerts())).0
}

fn receive(state: AppState, line: &str, origin: MessageOrigin) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::MessageReceived {
            key: alerts(),
            message: decode(line),
            origin,
        },
    )
}

fn history_ids(state: &AppState) -> Vec<(String, i64)> {
    state
        .history()
        .messages()
        .iter()
        .map(|m| (m.id.clone(), m.timestamp))
        .collect()
}

const A1: &str = r#"{"id":"a1","time":1000,"event":"message","topic":"alerts","message":"hi"}"#;
const A2: &str = r#"{"id":"a2","time":1001,"event":"message","topic":"alerts","message":"bye"}"#;

#[test]
fn live_duplicates_are_counted_once() {
    init_logging();
    let state = subscribed();

    let (state, first) = receive(state, A1, MessageOrigin::Live);
    let (state, duplicate) = receive(state, A1, MessageOrigin::Live);
    let (state, second) = receive(state, A2, MessageOrigin::Live);

    assert_eq!(
        first,
        vec![
            Effect::Notify(ClientEvent::MessageCountChanged {
                key: alerts(),
                count: 1,
            }),
            Effect::Notify(ClientEvent::NewLiveMessage(admitted(A1))),
        ]
    );
    assert!(duplicate.is_empty());
    assert_eq!(
        second[0],
        Effect::Notify(ClientEvent::MessageCountChanged {
            key: alerts(),
            count: 2,
        })
    );

    assert_eq!(
        history_ids(&state),
        vec![("a2".to_string(), 1001), ("a1".to_string(), 1000)]
    );
    assert_eq!(state.registry().get(&alerts()).unwrap().message_count, 2);
    let stats = state.stats();
    assert_eq!(stats.admitted, 2);
    assert_eq!(stats.duplicates, 1);
}

#[test]
fn historical_admissions_never_raise_live_notifications() {
    init_logging();
    let (state, _) = update(subscribed(), Msg::HistoryFetchRequested(SinceWindow::OneDay));

    let (state, effects) = receive(state, A1, MessageOrigin::History);
    assert_eq!(
        effects,
        vec![Effect::Notify(ClientEvent::MessageCountChanged {
            key: alerts(),
            count: 1,
        })]
    );

    let (state, effects) = receive(state, A1, MessageOrigin::History);
    assert!(effects.is_empty());
    let (state, _) = receive(state, A2, MessageOrigin::History);

    let (_state, effects) = update(
        state,
        Msg::HistoryFetchFinished {
            since: SinceWindow::OneDay,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(ClientEvent::HistoryFetchCompleted {
            new_count: 2,
            since: SinceWindow::OneDay,
        })]
    );
}

#[test]
fn messages_seen_live_do_not_count_as_new_history() {
    init_logging();
    let (state, _) = receive(subscribed(), A1, MessageOrigin::Live);
    let (state, _) = update(state, Msg::HistoryFetchRequested(SinceWindow::All));
    let (state, _) = receive(state, A1, MessageOrigin::History);
    let (_state, effects) = update(
        state,
        Msg::HistoryFetchFinished {
            since: SinceWindow::All,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Notify(ClientEvent::HistoryFetchCompleted {
            new_count: 0,
            since: SinceWindow::All,
        })]
    );
}

#[test]
fn non_message_events_are_not_admitted() {
    init_logging();
    let state = subscribed();
    let (state, open) = receive(
        state,
        r#"{"id":"o1","time":5,"event":"open","topic":"alerts"}"#,
        MessageOrigin::Live,
    );
    let (state, keepalive) = receive(
        state,
        r#"{"id":"k1","time":6,"event":"keepalive","topic":"alerts"}"#,
        MessageOrigin::Live,
    );
    let (state, no_id) = receive(
        state,
        r#"{"time":7,"event":"message","topic":"alerts","message":"?"}"#,
        MessageOrigin::Live,
    );

    assert!(open.is_empty() && keepalive.is_empty() && no_id.is_empty());
    assert!(state.history().is_empty());
    assert_eq!(state.stats().ineligible, 3);
    assert_eq!(state.registry().get(&alerts()).unwrap().message_count, 0);
}

#[test]
fn history_stays_sorted_for_any_arrival_order() {
    init_logging();
    let mut state = subscribed();
    for (id, time) in [("m1", 30), ("m2", 10), ("m3", 20), ("m4", 30), ("m5", 5)] {
        let line = format!(r#"{{"id":"{id}","time":{time},"event":"message","topic":"alerts"}}"#);
        state = receive(state, &line, MessageOrigin::Live).0;
    }
    let ids: Vec<String> = history_ids(&state).into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["m4", "m1", "m3", "m2", "m5"]);

    let view = state.view();
    assert_eq!(view.messages.len(), 5);
    assert_eq!(view.messages[0].id, "m4");
    assert_eq!(view.messages[0].summary, "No Title");
}

#[test]
fn clearing_resets_counts_but_remembers_ids() {
    init_logging();
    let (state, _) = receive(subscribed(), A1, MessageOrigin::Live);
    let (state, effects) = update(state, Msg::ClearMessages);
    assert_eq!(
        effects,
        vec![Effect::Notify(ClientEvent::MessageCountChanged {
            key: alerts(),
            count: 0,
        })]
    );
    assert!(state.history().is_empty());

    let (state, effects) = receive(state, A1, MessageOrigin::Live);
    assert!(effects.is_empty());
    assert!(state.history().is_empty());
}

#[test]
fn messages_for_removed_subscriptions_still_enter_history() {
    init_logging();
    let (state, _) = update(subscribed(), Msg::SubscriptionRemoved(alerts()));
    let (state, effects) = receive(state, A1, MessageOrigin::Live);
    assert_eq!(
        effects,
        vec![Effect::Notify(ClientEvent::NewLiveMessage(admitted(A1)))]
    );
    assert_eq!(state.history().len(), 1);
}
