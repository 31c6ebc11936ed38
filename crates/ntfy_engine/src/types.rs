use std::time::Duration;

use ntfy_core::{Message, MessageOrigin, SinceWindow, SubscriptionKey, SubscriptionStatus};
use thiserror::Error;

/// Per-worker behaviour, fixed when the worker is spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    pub auto_reconnect: bool,
    pub reconnect_delay: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub connect_timeout: Duration,
    /// Whole-request bound for one-shot history fetches. Live streams have none.
    pub history_timeout: Duration,
    /// How long shutdown waits for cancelled tasks to wind down.
    pub shutdown_grace: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            history_timeout: Duration::from_secs(10),
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    StatusChanged {
        target: SubscriptionKey,
        status: SubscriptionStatus,
        error: Option<String>,
    },
    MessageReceived {
        target: SubscriptionKey,
        message: Message,
        origin: MessageOrigin,
    },
    DecodeFailed {
        target: SubscriptionKey,
        origin: MessageOrigin,
        error: String,
    },
    HistoryTargetFailed {
        target: SubscriptionKey,
        error: TransportError,
    },
    HistoryFetchFinished {
        since: SinceWindow,
        /// Decoded lines across all subscriptions, duplicates included.
        received: usize,
        failed: usize,
    },
    WorkerExited {
        target: SubscriptionKey,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout")]
    Timeout,
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("network error: {0}")]
    Network(String),
}
