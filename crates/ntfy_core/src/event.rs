use crate::{Message, SinceWindow, SubscriptionKey, SubscriptionStatus};

/// Where an admitted message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    Live,
    History,
}

/// Notifications pushed to observers (UI, tray, logs).
///
/// Events for one subscription are delivered in the order the underlying
/// state changes happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    SubscriptionAdded(SubscriptionKey),
    SubscriptionRemoved(SubscriptionKey),
    StatusChanged {
        key: SubscriptionKey,
        status: SubscriptionStatus,
    },
    MessageCountChanged {
        key: SubscriptionKey,
        count: usize,
    },
    NewLiveMessage(Message),
    HistoryFetchCompleted {
        new_count: usize,
        since: SinceWindow,
    },
}
