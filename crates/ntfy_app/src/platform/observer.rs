use std::sync::mpsc;
use std::thread;

use ntfy_core::{ClientEvent, SubscriptionStatus};
use ntfy_logging::{ntfy_debug, ntfy_info, ntfy_warn};

/// Consumer of client events. A desktop shell would render these; the
/// headless binary logs them.
pub trait ClientObserver: Send {
    fn on_event(&mut self, event: ClientEvent);
}

/// Writes client events to the log, with live messages at `info` so they
/// show up like notifications.
#[derive(Debug, Default)]
pub struct LogObserver;

impl ClientObserver for LogObserver {
    fn on_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::SubscriptionAdded(key) => ntfy_info!("Subscribed to {}", key),
            ClientEvent::SubscriptionRemoved(key) => ntfy_info!("Unsubscribed from {}", key),
            ClientEvent::StatusChanged { key, status } => match status {
                SubscriptionStatus::Error => ntfy_warn!("{}: {}", key, status),
                _ => ntfy_info!("{}: {}", key, status),
            },
            ClientEvent::MessageCountChanged { key, count } => {
                ntfy_debug!("{} now holds {} messages", key, count)
            }
            ClientEvent::NewLiveMessage(message) => ntfy_info!(
                "[{}] {} ({}): {}",
                message.priority_label(),
                message.topic,
                message.formatted_time(),
                message.notification_text()
            ),
            ClientEvent::HistoryFetchCompleted { new_count, since } => ntfy_info!(
                "History fetch over the last {} added {} messages",
                since.label(),
                new_count
            ),
        }
    }
}

/// Delivers events to `observer` on its own thread until every sender is gone.
pub fn spawn_observer(
    events: mpsc::Receiver<ClientEvent>,
    mut observer: Box<dyn ClientObserver>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for event in events {
            observer.on_event(event);
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use ntfy_core::{SinceWindow, SubscriptionKey};
    use pretty_assertions::assert_eq;

    use super::*;

    struct Recording(Arc<Mutex<Vec<ClientEvent>>>);

    impl ClientObserver for Recording {
        fn on_event(&mut self, event: ClientEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn observer_thread_delivers_in_send_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel();
        let handle = spawn_observer(rx, Box::new(Recording(seen.clone())));

        let key = SubscriptionKey::new("ntfy.sh", "alerts").unwrap();
        let sent = vec![
            ClientEvent::SubscriptionAdded(key.clone()),
            ClientEvent::MessageCountChanged { key, count: 2 },
            ClientEvent::HistoryFetchCompleted {
                new_count: 2,
                since: SinceWindow::OneHour,
            },
        ];
        for event in sent.clone() {
            tx.send(event).unwrap();
        }
        drop(tx);
        handle.join().unwrap();

        assert_eq!(*seen.lock().unwrap(), sent);
    }

    #[test]
    fn log_observer_accepts_every_event() {
        ntfy_logging::initialize_for_tests();
        let key = SubscriptionKey::new("ntfy.sh", "alerts").unwrap();
        let mut observer = LogObserver;
        observer.on_event(ClientEvent::StatusChanged {
            key: key.clone(),
            status: SubscriptionStatus::Error,
        });
        observer.on_event(ClientEvent::SubscriptionRemoved(key));
    }
}
