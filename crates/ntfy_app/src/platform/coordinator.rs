use std::sync::{Mutex, MutexGuard, PoisonError};

use ntfy_core::{
    update, AppState, AppViewModel, Msg, PersistedState, SinceWindow, SubscriptionError,
    SubscriptionKey,
};
use thiserror::Error;

use super::effects::EffectRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("add at least one subscription first")]
    NoSubscriptions,
    #[error("a history fetch is already running")]
    HistoryFetchInProgress,
}

/// Single entry point for every state mutation.
///
/// User actions and engine events are serialized through one lock; effects
/// run before the lock is released so observers see events in state order.
pub struct Coordinator {
    state: Mutex<AppState>,
    effects: EffectRunner,
}

impl Coordinator {
    pub fn new(effects: EffectRunner) -> Self {
        Self {
            state: Mutex::new(AppState::new()),
            effects,
        }
    }

    pub fn dispatch(&self, msg: Msg) {
        let mut state = self.lock();
        self.apply(&mut state, msg);
    }

    pub fn restore(&self, persisted: PersistedState) {
        self.dispatch(Msg::RestoreState(persisted));
    }

    /// Validates and adds a subscription, returning its normalized key.
    pub fn add_subscription(
        &self,
        server: &str,
        topic: &str,
    ) -> Result<SubscriptionKey, SubscriptionError> {
        let mut state = self.lock();
        let key = state.validate_new_subscription(server, topic)?;
        self.apply(&mut state, Msg::SubscriptionAdded(key.clone()));
        Ok(key)
    }

    pub fn remove_subscription(&self, key: &SubscriptionKey) -> Result<(), SubscriptionError> {
        let mut state = self.lock();
        if !state.registry().contains(key) {
            return Err(SubscriptionError::NotFound(key.clone()));
        }
        self.apply(&mut state, Msg::SubscriptionRemoved(key.clone()));
        Ok(())
    }

    pub fn start_listening(&self, auto_reconnect: bool) -> Result<(), SessionError> {
        let mut state = self.lock();
        if state.registry().is_empty() {
            return Err(SessionError::NoSubscriptions);
        }
        self.apply(&mut state, Msg::StartListening { auto_reconnect });
        Ok(())
    }

    pub fn stop_listening(&self) {
        self.dispatch(Msg::StopListening);
    }

    pub fn fetch_history(&self, since: SinceWindow) -> Result<(), SessionError> {
        let mut state = self.lock();
        if state.registry().is_empty() {
            return Err(SessionError::NoSubscriptions);
        }
        if state.history_fetch_in_progress() {
            return Err(SessionError::HistoryFetchInProgress);
        }
        self.apply(&mut state, Msg::HistoryFetchRequested(since));
        Ok(())
    }

    pub fn clear_messages(&self) {
        self.dispatch(Msg::ClearMessages);
    }

    pub fn view(&self) -> AppViewModel {
        self.lock().view()
    }

    /// Multi-line detail text for the message with `id`, if it is in the history.
    pub fn message_detail(&self, id: &str) -> Option<String> {
        self.lock()
            .history()
            .messages()
            .iter()
            .find(|message| message.id == id)
            .map(|message| message.detail_text())
    }

    pub fn save(&self) {
        let state = self.lock();
        self.effects.save(&state);
    }

    /// Stops the engine and waits for its tasks. Returns `false` when the
    /// engine did not confirm within its grace period.
    pub fn shutdown_engine(&self) -> bool {
        self.effects.shutdown_engine()
    }

    fn apply(&self, state: &mut AppState, msg: Msg) {
        let (next, effects) = update(std::mem::take(state), msg);
        *state = next;
        self.effects.run(effects, state);
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
