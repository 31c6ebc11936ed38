use crate::{
    Message, MessageOrigin, PersistedState, SinceWindow, SubscriptionKey, SubscriptionStatus,
    WindowLayout,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Restore subscriptions, history and layout loaded at startup.
    RestoreState(PersistedState),
    /// A validated subscription was added by the user.
    SubscriptionAdded(SubscriptionKey),
    /// User confirmed removal of a subscription.
    SubscriptionRemoved(SubscriptionKey),
    /// User asked to connect every subscription.
    StartListening { auto_reconnect: bool },
    /// User asked to disconnect every subscription.
    StopListening,
    /// User asked for a one-shot backfill over all subscriptions.
    HistoryFetchRequested(SinceWindow),
    /// User cleared the message list.
    ClearMessages,
    /// Presentation layer moved or resized the window.
    WindowLayoutChanged(WindowLayout),
    /// Engine: a worker changed connection state.
    StatusChanged {
        key: SubscriptionKey,
        status: SubscriptionStatus,
        error: Option<String>,
    },
    /// Engine: a line was decoded on a live stream or history fetch.
    MessageReceived {
        key: SubscriptionKey,
        message: Message,
        origin: MessageOrigin,
    },
    /// Engine: the history fetch finished for every subscription.
    HistoryFetchFinished { since: SinceWindow },
    /// Fallback for placeholder wiring.
    NoOp,
}
