use std::sync::{mpsc, Arc};
use std::thread;

use ntfy_core::{AppState, ClientEvent, Effect, Msg, StateStore};
use ntfy_engine::{EngineEvent, EngineEvents, EngineHandle, WorkerConfig};
use ntfy_logging::{ntfy_debug, ntfy_error, ntfy_info, ntfy_warn};

use super::coordinator::Coordinator;

/// Carries effects produced by `update` out to the engine, the observer
/// channel and the state store.
pub struct EffectRunner {
    engine: EngineHandle,
    observer: mpsc::Sender<ClientEvent>,
    store: Box<dyn StateStore>,
    worker: WorkerConfig,
}

impl EffectRunner {
    /// `worker.auto_reconnect` is overridden per start by the session setting;
    /// the reconnect delay is taken as is.
    pub fn new(
        engine: EngineHandle,
        observer: mpsc::Sender<ClientEvent>,
        store: Box<dyn StateStore>,
        worker: WorkerConfig,
    ) -> Self {
        Self {
            engine,
            observer,
            store,
            worker,
        }
    }

    pub fn run(&self, effects: Vec<Effect>, state: &AppState) {
        for effect in effects {
            match effect {
                Effect::StartStreams {
                    targets,
                    auto_reconnect,
                } => {
                    ntfy_info!("Starting {} subscription streams", targets.len());
                    self.engine.start_all(targets, self.worker_config(auto_reconnect));
                }
                Effect::StartStream {
                    target,
                    auto_reconnect,
                } => self.engine.start(target, self.worker_config(auto_reconnect)),
                Effect::StopStream { target } => self.engine.stop(target),
                Effect::StopAllStreams => self.engine.stop_all(),
                Effect::FetchHistory { targets, since } => {
                    self.engine.fetch_history(targets, since)
                }
                Effect::Notify(event) => {
                    if self.observer.send(event).is_err() {
                        ntfy_debug!("Observer channel closed; event dropped");
                    }
                }
                Effect::Persist => self.save(state),
            }
        }
    }

    pub fn save(&self, state: &AppState) {
        let snapshot = state.persisted_snapshot();
        match self.store.save(&snapshot) {
            Ok(()) => ntfy_debug!(
                "Saved {} subscriptions and {} messages",
                snapshot.subscriptions.len(),
                snapshot.messages.len()
            ),
            Err(err) => ntfy_error!("Failed to save state: {}", err),
        }
    }

    pub fn shutdown_engine(&self) -> bool {
        self.engine.shutdown()
    }

    fn worker_config(&self, auto_reconnect: bool) -> WorkerConfig {
        WorkerConfig {
            auto_reconnect,
            ..self.worker
        }
    }
}

/// Translates engine events into core messages. Events that only matter for
/// diagnostics have already been logged by the engine and map to `None`.
pub fn map_engine_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::StatusChanged {
            target,
            status,
            error,
        } => Some(Msg::StatusChanged {
            key: target,
            status,
            error,
        }),
        EngineEvent::MessageReceived {
            target,
            message,
            origin,
        } => Some(Msg::MessageReceived {
            key: target,
            message,
            origin,
        }),
        EngineEvent::HistoryFetchFinished {
            since,
            received,
            failed,
        } => {
            if failed > 0 {
                ntfy_warn!(
                    "History fetch (since={}) finished with {} failed subscriptions",
                    since,
                    failed
                );
            }
            ntfy_debug!("History fetch delivered {} lines", received);
            Some(Msg::HistoryFetchFinished { since })
        }
        EngineEvent::DecodeFailed { target, .. } => {
            ntfy_debug!("Decode failure on {} already reported", target);
            None
        }
        EngineEvent::HistoryTargetFailed { target, error } => {
            ntfy_debug!("History fetch for {} failed: {}", target, error);
            None
        }
        EngineEvent::WorkerExited { target } => {
            ntfy_debug!("Worker for {} exited", target);
            None
        }
    }
}

/// Feeds engine events into the coordinator until the engine goes away.
pub fn spawn_event_pump(
    coordinator: Arc<Coordinator>,
    events: EngineEvents,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while let Some(event) = events.recv() {
            if let Some(msg) = map_engine_event(event) {
                coordinator.dispatch(msg);
            }
        }
        ntfy_debug!("Engine event stream closed");
    })
}

#[cfg(test)]
mod tests {
    use ntfy_core::{MessageOrigin, SinceWindow, SubscriptionKey, SubscriptionStatus};
    use ntfy_engine::TransportError;
    use pretty_assertions::assert_eq;

    use super::*;

    fn key() -> SubscriptionKey {
        SubscriptionKey::new("ntfy.sh", "alerts").unwrap()
    }

    #[test]
    fn status_and_finish_events_become_messages() {
        let status = map_engine_event(EngineEvent::StatusChanged {
            target: key(),
            status: SubscriptionStatus::Error,
            error: Some("http status 500".to_string()),
        });
        assert_eq!(
            status,
            Some(Msg::StatusChanged {
                key: key(),
                status: SubscriptionStatus::Error,
                error: Some("http status 500".to_string()),
            })
        );

        let finished = map_engine_event(EngineEvent::HistoryFetchFinished {
            since: SinceWindow::OneDay,
            received: 4,
            failed: 1,
        });
        assert_eq!(
            finished,
            Some(Msg::HistoryFetchFinished {
                since: SinceWindow::OneDay
            })
        );
    }

    #[test]
    fn diagnostic_events_are_dropped() {
        assert_eq!(
            map_engine_event(EngineEvent::DecodeFailed {
                target: key(),
                origin: MessageOrigin::Live,
                error: "bad json".to_string(),
            }),
            None
        );
        assert_eq!(
            map_engine_event(EngineEvent::HistoryTargetFailed {
                target: key(),
                error: TransportError::Timeout,
            }),
            None
        );
        assert_eq!(
            map_engine_event(EngineEvent::WorkerExited { target: key() }),
            None
        );
    }
}
