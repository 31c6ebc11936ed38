use crate::{ClientEvent, SinceWindow, SubscriptionKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartStreams {
        targets: Vec<SubscriptionKey>,
        auto_reconnect: bool,
    },
    StartStream {
        target: SubscriptionKey,
        auto_reconnect: bool,
    },
    StopStream {
        target: SubscriptionKey,
    },
    StopAllStreams,
    FetchHistory {
        targets: Vec<SubscriptionKey>,
        since: SinceWindow,
    },
    Notify(ClientEvent),
    Persist,
}
