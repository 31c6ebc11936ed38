use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Priority assigned when the payload omits it or carries an out-of-range value.
pub const DEFAULT_PRIORITY: u8 = 3;

const SUMMARY_CHARS: usize = 30;
const NOTIFICATION_CHARS: usize = 50;

/// Kind of event carried by one line of the JSON stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Open,
    Keepalive,
    Message,
    PollRequest,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Attachment {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// One event received from a server, stamped with the server it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "time", default)]
    pub timestamp: i64,
    #[serde(rename = "event", default)]
    pub event_kind: EventKind,
    #[serde(default)]
    pub topic: String,
    #[serde(rename = "message", default)]
    pub body: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(rename = "click", default, skip_serializing_if = "Option::is_none")]
    pub click_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    #[serde(rename = "server", default)]
    pub server_origin: String,
    /// Topic of the subscription the message was admitted through. Counts are
    /// credited to it; the payload `topic` can differ for multi-topic
    /// subscriptions.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subscription_topic: String,
}

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

/// One `/json` line as servers actually send it: any field may be missing or
/// `null`, and `priority` is not guaranteed to be a small integer.
#[derive(Deserialize)]
struct WireMessage {
    id: Option<String>,
    time: Option<i64>,
    event: Option<EventKind>,
    topic: Option<String>,
    message: Option<String>,
    title: Option<String>,
    tags: Option<Vec<Option<String>>>,
    priority: Option<serde_json::Value>,
    click: Option<String>,
    attachment: Option<WireAttachment>,
}

#[derive(Deserialize)]
struct WireAttachment {
    name: Option<String>,
    url: Option<String>,
}

impl WireMessage {
    fn into_message(self, server: &str) -> Message {
        Message {
            id: self.id.unwrap_or_default(),
            timestamp: self.time.unwrap_or_default(),
            event_kind: self.event.unwrap_or_default(),
            topic: self.topic.unwrap_or_default(),
            body: self.message.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            tags: self.tags.into_iter().flatten().flatten().collect(),
            priority: lenient_priority(self.priority),
            click_url: self.click,
            attachment: self.attachment.map(|attachment| Attachment {
                name: attachment.name.unwrap_or_default(),
                url: attachment.url.unwrap_or_default(),
            }),
            server_origin: server.to_string(),
            subscription_topic: String::new(),
        }
    }
}

/// Anything that is not an integer in 1..=5 becomes the default priority.
fn lenient_priority(raw: Option<serde_json::Value>) -> u8 {
    let parsed = match &raw {
        Some(serde_json::Value::Number(number)) => number.as_i64(),
        Some(serde_json::Value::String(text)) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed.and_then(|value| u8::try_from(value).ok()) {
        Some(priority) if (1..=5).contains(&priority) => priority,
        _ => {
            if let Some(raw) = raw.filter(|value| !value.is_null()) {
                ntfy_logging::ntfy_debug!("Priority {} out of range, using default", raw);
            }
            DEFAULT_PRIORITY
        }
    }
}

#[derive(Debug, Error)]
#[error("malformed event line: {source}")]
pub struct DecodeError {
    #[from]
    source: serde_json::Error,
}

/// Why a decoded message cannot enter the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("event kind {0:?} is not admittable")]
    NotMessageKind(EventKind),
    #[error("message event without an id")]
    MissingId,
}

impl Message {
    /// Decodes one line of the `/json` stream.
    ///
    /// `server` is the normalized server URL of the subscription that received
    /// the line; it always overrides whatever the payload claims.
    pub fn decode_line(line: &[u8], server: &str) -> Result<Self, DecodeError> {
        let wire: WireMessage = serde_json::from_slice(line.trim_ascii())?;
        Ok(wire.into_message(server))
    }

    /// Topic of the subscription this message counts towards. Messages saved
    /// before admission stamping fall back to the payload topic.
    pub fn credited_topic(&self) -> &str {
        if self.subscription_topic.is_empty() {
            &self.topic
        } else {
            &self.subscription_topic
        }
    }

    /// Checks whether this event may be admitted into the history.
    pub fn validate_for_admission(&self) -> Result<(), ValidationError> {
        if self.event_kind != EventKind::Message {
            return Err(ValidationError::NotMessageKind(self.event_kind));
        }
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingId);
        }
        Ok(())
    }

    pub fn formatted_time(&self) -> String {
        self.formatted_time_in(&Local)
    }

    /// Formats the timestamp as `YYYY-MM-DD HH:MM:SS` in the given zone.
    pub fn formatted_time_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        match DateTime::from_timestamp(self.timestamp, 0) {
            Some(utc) => utc
                .with_timezone(tz)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            None => String::from("-"),
        }
    }

    pub fn priority_label(&self) -> &'static str {
        match self.priority {
            1 => "Min",
            2 => "Low",
            3 => "Default",
            4 => "High",
            5 => "Max",
            _ => "Unknown",
        }
    }

    pub fn is_high_priority(&self) -> bool {
        self.priority >= 4
    }

    pub fn is_low_priority(&self) -> bool {
        self.priority <= 2
    }

    /// Short label for list rows.
    pub fn summary(&self) -> String {
        if !self.title.is_empty() {
            return self.title.clone();
        }
        let body = prefix_chars(&self.body, SUMMARY_CHARS);
        if body.is_empty() {
            String::from("No Title")
        } else {
            body
        }
    }

    /// Text shown in a desktop notification for a live message.
    pub fn notification_text(&self) -> String {
        if self.title.is_empty() {
            prefix_chars(&self.body, NOTIFICATION_CHARS)
        } else {
            self.title.clone()
        }
    }

    /// Multi-line description used by the detail pane.
    pub fn detail_text(&self) -> String {
        let mut detail = format!(
            "ID: {}\nServer: {}\nTime: {}\nTopic: {}\nTitle: {}\nMessage: {}\nPriority: {} ({})\nTags: {}\n",
            self.id,
            self.server_origin,
            self.formatted_time(),
            self.topic,
            self.title,
            self.body,
            self.priority_label(),
            self.priority,
            self.tags.join(", "),
        );
        if let Some(click) = self.click_url.as_deref().filter(|url| !url.is_empty()) {
            detail.push_str(&format!("Click: {click}\n"));
        }
        if let Some(attachment) = &self.attachment {
            detail.push_str(&format!(
                "Attachment: {}\nAttachment URL: {}\n",
                or_na(&attachment.name),
                or_na(&attachment.url)
            ));
        }
        detail
    }
}

fn prefix_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}
