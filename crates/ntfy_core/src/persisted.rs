use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Message;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSubscription {
    pub server: String,
    pub topic: String,
}

/// Window geometry, carried through untouched for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WindowLayout {
    #[serde(default)]
    pub size: Option<(i32, i32)>,
    #[serde(default)]
    pub position: Option<(i32, i32)>,
    #[serde(default)]
    pub splitter_position: Option<i32>,
}

/// Everything written to and read from the state store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PersistedState {
    #[serde(default)]
    pub subscriptions: Vec<PersistedSubscription>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub window_layout: WindowLayout,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state store format error: {0}")]
    Format(String),
    #[error("state location unusable: {0}")]
    Location(String),
}

/// Persistence boundary: read once at startup, written on changes and shutdown.
pub trait StateStore: Send + Sync {
    /// Returns `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<PersistedState>, StoreError>;
    fn save(&self, state: &PersistedState) -> Result<(), StoreError>;
}
