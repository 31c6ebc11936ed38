use crate::{AdmissionStats, Message, SubscriptionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowEmphasis {
    High,
    Normal,
    Low,
}

impl RowEmphasis {
    pub fn for_message(message: &Message) -> Self {
        if message.is_high_priority() {
            RowEmphasis::High
        } else if message.is_low_priority() {
            RowEmphasis::Low
        } else {
            RowEmphasis::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRowView {
    pub server: String,
    pub topic: String,
    pub status: SubscriptionStatus,
    pub status_label: String,
    pub message_count: usize,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRowView {
    pub id: String,
    pub time: String,
    pub topic: String,
    pub summary: String,
    pub priority: &'static str,
    pub server: String,
    pub emphasis: RowEmphasis,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub listening: bool,
    pub subscriptions: Vec<SubscriptionRowView>,
    pub messages: Vec<MessageRowView>,
    pub history_fetch_in_progress: bool,
    pub stats: AdmissionStats,
    pub dirty: bool,
}
