use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    #[error("server URL and topic must not be empty")]
    Empty,
    #[error("invalid server URL {url}: {reason}")]
    InvalidServer { url: String, reason: String },
    #[error("invalid topic {0:?}")]
    InvalidTopic(String),
    #[error("already subscribed to {0}")]
    Duplicate(SubscriptionKey),
    #[error("no subscription for {0}")]
    NotFound(SubscriptionKey),
}

/// Identity of a subscription: normalized server URL plus topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionKey {
    pub server: String,
    pub topic: String,
}

impl SubscriptionKey {
    /// Builds a key from user input, normalizing the server URL.
    ///
    /// A missing scheme becomes `https://` and trailing slashes are removed.
    pub fn new(server: &str, topic: &str) -> Result<Self, SubscriptionError> {
        let server = server.trim();
        let topic = topic.trim();
        if server.is_empty() || topic.is_empty() {
            return Err(SubscriptionError::Empty);
        }
        if topic.contains('/') || topic.chars().any(char::is_whitespace) {
            return Err(SubscriptionError::InvalidTopic(topic.to_string()));
        }
        Ok(Self {
            server: normalize_server_url(server)?,
            topic: topic.to_string(),
        })
    }

    /// Parses a combined `server/topic` string such as `ntfy.sh/alerts`.
    pub fn parse_combined(raw: &str) -> Result<Self, SubscriptionError> {
        let trimmed = raw.trim().trim_end_matches('/');
        match trimmed.rsplit_once('/') {
            Some((server, topic)) if !server.ends_with('/') && !server.ends_with(':') => {
                Self::new(server, topic)
            }
            _ => Err(SubscriptionError::InvalidTopic(raw.trim().to_string())),
        }
    }

    /// Live stream endpoint.
    pub fn stream_url(&self) -> String {
        format!("{}/{}/json", self.server, self.topic)
    }

    /// One-shot history endpoint for the given `since` query value.
    pub fn poll_url(&self, since: &str) -> String {
        format!("{}/{}/json?poll=1&since={}", self.server, self.topic, since)
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.server, self.topic)
    }
}

pub fn normalize_server_url(raw: &str) -> Result<String, SubscriptionError> {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let normalized = with_scheme.trim_end_matches('/').to_string();

    let parsed = url::Url::parse(&normalized).map_err(|err| SubscriptionError::InvalidServer {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(SubscriptionError::InvalidServer {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(normalized)
}

/// Connection state of one subscription as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting(u32),
    Error,
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionStatus::Disconnected => write!(f, "Disconnected"),
            SubscriptionStatus::Connecting => write!(f, "Connecting..."),
            SubscriptionStatus::Connected => write!(f, "Connected"),
            SubscriptionStatus::Reconnecting(attempt) => write!(f, "Reconnecting({attempt})"),
            SubscriptionStatus::Error => write!(f, "Error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub key: SubscriptionKey,
    pub status: SubscriptionStatus,
    pub message_count: usize,
    /// Most recent transport error; survives the final `Disconnected`.
    pub last_error: Option<String>,
}

impl Subscription {
    fn new(key: SubscriptionKey) -> Self {
        Self {
            key,
            status: SubscriptionStatus::Disconnected,
            message_count: 0,
            last_error: None,
        }
    }
}

/// Subscriptions in the order they were added.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubscriptionRegistry {
    entries: Vec<Subscription>,
}

impl SubscriptionRegistry {
    pub fn add(&mut self, key: SubscriptionKey) -> Result<&Subscription, SubscriptionError> {
        if self.contains(&key) {
            return Err(SubscriptionError::Duplicate(key));
        }
        self.entries.push(Subscription::new(key));
        let last = self.entries.len() - 1;
        Ok(&self.entries[last])
    }

    pub fn remove(&mut self, key: &SubscriptionKey) -> Result<Subscription, SubscriptionError> {
        let position = self
            .entries
            .iter()
            .position(|entry| &entry.key == key)
            .ok_or_else(|| SubscriptionError::NotFound(key.clone()))?;
        Ok(self.entries.remove(position))
    }

    pub fn contains(&self, key: &SubscriptionKey) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &SubscriptionKey) -> Option<&Subscription> {
        self.entries.iter().find(|entry| &entry.key == key)
    }

    fn get_mut(&mut self, key: &SubscriptionKey) -> Option<&mut Subscription> {
        self.entries.iter_mut().find(|entry| &entry.key == key)
    }

    /// Returns `true` when the stored status actually changed.
    pub fn set_status(&mut self, key: &SubscriptionKey, status: SubscriptionStatus) -> bool {
        match self.get_mut(key) {
            Some(entry) if entry.status != status => {
                entry.status = status;
                true
            }
            _ => false,
        }
    }

    pub fn record_error(&mut self, key: &SubscriptionKey, error: impl Into<String>) {
        if let Some(entry) = self.get_mut(key) {
            entry.last_error = Some(error.into());
        }
    }

    pub fn clear_error(&mut self, key: &SubscriptionKey) {
        if let Some(entry) = self.get_mut(key) {
            entry.last_error = None;
        }
    }

    /// Increments the message count and returns the new value.
    pub fn increment_count(&mut self, key: &SubscriptionKey) -> Option<usize> {
        self.get_mut(key).map(|entry| {
            entry.message_count += 1;
            entry.message_count
        })
    }

    pub fn set_count(&mut self, key: &SubscriptionKey, count: usize) -> bool {
        match self.get_mut(key) {
            Some(entry) if entry.message_count != count => {
                entry.message_count = count;
                true
            }
            _ => false,
        }
    }

    pub fn keys(&self) -> Vec<SubscriptionKey> {
        self.entries.iter().map(|entry| entry.key.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
