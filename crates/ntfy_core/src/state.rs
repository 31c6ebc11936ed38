use crate::view_model::{AppViewModel, MessageRowView, RowEmphasis, SubscriptionRowView};
use crate::{
    Admission, MessageHistory, PersistedState, PersistedSubscription, SinceWindow,
    SubscriptionError, SubscriptionKey, SubscriptionRegistry, WindowLayout,
};

/// Running totals of admission outcomes for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdmissionStats {
    pub admitted: usize,
    pub duplicates: usize,
    pub ineligible: usize,
}

impl AdmissionStats {
    pub(crate) fn record(&mut self, admission: Admission) {
        match admission {
            Admission::Admitted => self.admitted += 1,
            Admission::Duplicate => self.duplicates += 1,
            Admission::Ineligible(_) => self.ineligible += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HistoryFetchProgress {
    pub since: SinceWindow,
    pub new_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub(crate) registry: SubscriptionRegistry,
    pub(crate) history: MessageHistory,
    pub(crate) listening: bool,
    pub(crate) auto_reconnect: bool,
    pub(crate) history_fetch: Option<HistoryFetchProgress>,
    pub(crate) window_layout: WindowLayout,
    pub(crate) stats: AdmissionStats,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            registry: SubscriptionRegistry::default(),
            history: MessageHistory::new(),
            listening: false,
            auto_reconnect: true,
            history_fetch: None,
            window_layout: WindowLayout::default(),
            stats: AdmissionStats::default(),
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates user input for a new subscription against the registry.
    pub fn validate_new_subscription(
        &self,
        server: &str,
        topic: &str,
    ) -> Result<SubscriptionKey, SubscriptionError> {
        let key = SubscriptionKey::new(server, topic)?;
        if self.registry.contains(&key) {
            return Err(SubscriptionError::Duplicate(key));
        }
        Ok(key)
    }

    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    pub fn history(&self) -> &MessageHistory {
        &self.history
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn auto_reconnect(&self) -> bool {
        self.auto_reconnect
    }

    pub fn history_fetch_in_progress(&self) -> bool {
        self.history_fetch.is_some()
    }

    pub fn window_layout(&self) -> &WindowLayout {
        &self.window_layout
    }

    pub fn stats(&self) -> AdmissionStats {
        self.stats
    }

    /// Snapshot handed to the state store.
    pub fn persisted_snapshot(&self) -> PersistedState {
        PersistedState {
            subscriptions: self
                .registry
                .iter()
                .map(|entry| PersistedSubscription {
                    server: entry.key.server.clone(),
                    topic: entry.key.topic.clone(),
                })
                .collect(),
            messages: self.history.messages().to_vec(),
            window_layout: self.window_layout.clone(),
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            listening: self.listening,
            subscriptions: self
                .registry
                .iter()
                .map(|entry| SubscriptionRowView {
                    server: entry.key.server.clone(),
                    topic: entry.key.topic.clone(),
                    status: entry.status,
                    status_label: entry.status.to_string(),
                    message_count: entry.message_count,
                    last_error: entry.last_error.clone(),
                })
                .collect(),
            messages: self
                .history
                .messages()
                .iter()
                .map(|message| MessageRowView {
                    id: message.id.clone(),
                    time: message.formatted_time(),
                    topic: message.topic.clone(),
                    summary: message.summary(),
                    priority: message.priority_label(),
                    server: message.server_origin.clone(),
                    emphasis: RowEmphasis::for_message(message),
                })
                .collect(),
            history_fetch_in_progress: self.history_fetch.is_some(),
            stats: self.stats,
            dirty: self.dirty,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether anything changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
