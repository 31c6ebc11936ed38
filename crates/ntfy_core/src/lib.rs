//! Listener core: message model, dedup history, subscription registry and
//! the pure state machine driven by user actions and engine events.
mod effect;
mod event;
mod history;
mod message;
mod msg;
mod persisted;
mod since;
mod state;
mod subscription;
mod update;
mod view_model;

pub use effect::Effect;
pub use event::{ClientEvent, MessageOrigin};
pub use history::{Admission, DedupIndex, MessageHistory};
pub use message::{Attachment, DecodeError, EventKind, Message, ValidationError, DEFAULT_PRIORITY};
pub use msg::Msg;
pub use persisted::{PersistedState, PersistedSubscription, StateStore, StoreError, WindowLayout};
pub use since::{SinceWindow, UnknownSinceWindow};
pub use state::{AdmissionStats, AppState};
pub use subscription::{
    normalize_server_url, Subscription, SubscriptionError, SubscriptionKey, SubscriptionRegistry,
    SubscriptionStatus,
};
pub use update::update;
pub use view_model::{AppViewModel, MessageRowView, RowEmphasis, SubscriptionRowView};
