use std::collections::HashSet;

use crate::message::{Message, ValidationError};

/// Outcome of offering a message to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Duplicate,
    Ineligible(ValidationError),
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Ids admitted during this process lifetime. Never shrinks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DedupIndex {
    seen: HashSet<String>,
}

impl DedupIndex {
    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Returns `false` if the id was already present.
    pub fn insert(&mut self, id: &str) -> bool {
        self.seen.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Messages in descending timestamp order, unique by id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageHistory {
    messages: Vec<Message>,
    index: DedupIndex,
}

impl MessageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `message` unless it is ineligible or its id was seen before.
    ///
    /// A new message goes in front of every entry with an equal timestamp.
    pub fn admit(&mut self, message: Message) -> Admission {
        if let Err(reason) = message.validate_for_admission() {
            return Admission::Ineligible(reason);
        }
        if !self.index.insert(&message.id) {
            return Admission::Duplicate;
        }
        let position = self
            .messages
            .partition_point(|existing| existing.timestamp > message.timestamp);
        self.messages.insert(position, message);
        Admission::Admitted
    }

    /// Replaces the history with persisted messages and seeds the dedup index.
    ///
    /// Ineligible entries and repeated ids are dropped; the rest are sorted
    /// newest first, keeping persisted order among equal timestamps.
    pub fn restore(&mut self, persisted: Vec<Message>) -> usize {
        self.messages.clear();
        for message in persisted {
            if message.validate_for_admission().is_err() || !self.index.insert(&message.id) {
                continue;
            }
            self.messages.push(message);
        }
        self.messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.messages.len()
    }

    /// Empties the visible history. Seen ids stay in the dedup index.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn dedup_index(&self) -> &DedupIndex {
        &self.index
    }

    /// Messages credited to the subscription `(server, topic)`.
    pub fn count_for(&self, server: &str, topic: &str) -> usize {
        self.messages
            .iter()
            .filter(|message| {
                message.server_origin == server && message.credited_topic() == topic
            })
            .count()
    }
}
