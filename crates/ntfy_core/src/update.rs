use ntfy_logging::{ntfy_debug, ntfy_info, ntfy_trace, ntfy_warn};

use crate::state::HistoryFetchProgress;
use crate::{
    Admission, AppState, ClientEvent, Effect, Message, MessageOrigin, Msg, PersistedState,
    SinceWindow, SubscriptionKey, SubscriptionStatus, ValidationError,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// `Effect::Notify` entries appear in the order the state changed.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::RestoreState(persisted) => restore(&mut state, persisted),
        Msg::SubscriptionAdded(key) => {
            if let Err(err) = state.registry.add(key.clone()).map(|_| ()) {
                ntfy_warn!("Ignoring subscription add: {}", err);
                return (state, Vec::new());
            }
            state.mark_dirty();
            let mut effects = vec![
                Effect::Notify(ClientEvent::SubscriptionAdded(key.clone())),
                Effect::Persist,
            ];
            if state.listening {
                effects.push(Effect::StartStream {
                    target: key,
                    auto_reconnect: state.auto_reconnect,
                });
            }
            effects
        }
        Msg::SubscriptionRemoved(key) => {
            if let Err(err) = state.registry.remove(&key) {
                ntfy_warn!("Ignoring subscription removal: {}", err);
                return (state, Vec::new());
            }
            state.mark_dirty();
            let mut effects = Vec::with_capacity(3);
            if state.listening {
                effects.push(Effect::StopStream {
                    target: key.clone(),
                });
            }
            effects.push(Effect::Notify(ClientEvent::SubscriptionRemoved(key)));
            effects.push(Effect::Persist);
            effects
        }
        Msg::StartListening { auto_reconnect } => {
            if state.registry.is_empty() {
                ntfy_warn!("StartListening with no subscriptions; nothing to do");
                return (state, Vec::new());
            }
            state.listening = true;
            state.auto_reconnect = auto_reconnect;
            state.mark_dirty();
            vec![Effect::StartStreams {
                targets: state.registry.keys(),
                auto_reconnect,
            }]
        }
        Msg::StopListening => {
            state.listening = false;
            state.mark_dirty();
            vec![Effect::StopAllStreams]
        }
        Msg::HistoryFetchRequested(since) => request_history(&mut state, since),
        Msg::ClearMessages => {
            state.history.clear();
            state.mark_dirty();
            let mut effects = Vec::new();
            for key in state.registry.keys() {
                if state.registry.set_count(&key, 0) {
                    effects.push(Effect::Notify(ClientEvent::MessageCountChanged {
                        key,
                        count: 0,
                    }));
                }
            }
            effects
        }
        Msg::WindowLayoutChanged(layout) => {
            if state.window_layout != layout {
                state.window_layout = layout;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StatusChanged { key, status, error } => apply_status(&mut state, key, status, error),
        Msg::MessageReceived {
            key,
            message,
            origin,
        } => admit(&mut state, key, message, origin),
        Msg::HistoryFetchFinished { since } => {
            let new_count = match state.history_fetch.take() {
                Some(progress) => progress.new_count,
                None => {
                    ntfy_warn!(
                        "History fetch finished (since={}) without a pending request",
                        since
                    );
                    0
                }
            };
            ntfy_info!("History fetch complete: {} new (since={})", new_count, since);
            state.mark_dirty();
            vec![Effect::Notify(ClientEvent::HistoryFetchCompleted { new_count, since })]
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn restore(state: &mut AppState, persisted: PersistedState) -> Vec<Effect> {
    let mut effects = Vec::new();
    for entry in persisted.subscriptions {
        match state.validate_new_subscription(&entry.server, &entry.topic) {
            Ok(key) => {
                if state.registry.add(key.clone()).is_ok() {
                    effects.push(Effect::Notify(ClientEvent::SubscriptionAdded(key)));
                }
            }
            Err(err) => ntfy_warn!(
                "Skipping persisted subscription {}/{}: {}",
                entry.server,
                entry.topic,
                err
            ),
        }
    }

    let restored = state.history.restore(persisted.messages);
    ntfy_info!("Restored {} persisted messages", restored);

    for key in state.registry.keys() {
        let count = state.history.count_for(&key.server, &key.topic);
        state.registry.set_count(&key, count);
        effects.push(Effect::Notify(ClientEvent::MessageCountChanged { key, count }));
    }

    state.window_layout = persisted.window_layout;
    state.mark_dirty();
    effects
}

fn request_history(state: &mut AppState, since: SinceWindow) -> Vec<Effect> {
    if state.registry.is_empty() {
        ntfy_warn!("History fetch requested with no subscriptions");
        return Vec::new();
    }
    if let Some(pending) = state.history_fetch {
        ntfy_warn!(
            "History fetch (since={}) already running; ignoring request for since={}",
            pending.since,
            since
        );
        return Vec::new();
    }
    state.history_fetch = Some(HistoryFetchProgress {
        since,
        new_count: 0,
    });
    state.mark_dirty();
    vec![Effect::FetchHistory {
        targets: state.registry.keys(),
        since,
    }]
}

fn apply_status(
    state: &mut AppState,
    key: SubscriptionKey,
    status: SubscriptionStatus,
    error: Option<String>,
) -> Vec<Effect> {
    if let Some(error) = error {
        state.registry.record_error(&key, error);
    }
    if status == SubscriptionStatus::Connected {
        state.registry.clear_error(&key);
    }
    if !state.registry.set_status(&key, status) {
        return Vec::new();
    }
    state.mark_dirty();
    vec![Effect::Notify(ClientEvent::StatusChanged { key, status })]
}

fn admit(
    state: &mut AppState,
    key: SubscriptionKey,
    mut message: Message,
    origin: MessageOrigin,
) -> Vec<Effect> {
    message.subscription_topic = key.topic.clone();
    let live_copy = (origin == MessageOrigin::Live).then(|| message.clone());
    let id = message.id.clone();
    let admission = state.history.admit(message);
    state.stats.record(admission);

    match admission {
        Admission::Admitted => {}
        Admission::Duplicate => {
            ntfy_debug!("Message {} from {} already present, skipping", id, key);
            return Vec::new();
        }
        Admission::Ineligible(ValidationError::MissingId) => {
            ntfy_warn!("Message event without id from {}, skipping", key);
            return Vec::new();
        }
        Admission::Ineligible(reason) => {
            ntfy_trace!("Not admitting event from {}: {}", key, reason);
            return Vec::new();
        }
    }

    state.mark_dirty();
    let mut effects = Vec::with_capacity(2);
    if let Some(count) = state.registry.increment_count(&key) {
        effects.push(Effect::Notify(ClientEvent::MessageCountChanged { key, count }));
    }
    match origin {
        MessageOrigin::Live => {
            if let Some(message) = live_copy {
                effects.push(Effect::Notify(ClientEvent::NewLiveMessage(message)));
            }
        }
        MessageOrigin::History => {
            if let Some(progress) = state.history_fetch.as_mut() {
                progress.new_count += 1;
            }
        }
    }
    effects
}
