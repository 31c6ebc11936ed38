use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use ntfy_core::{SinceWindow, SubscriptionKey};
use ntfy_logging::ntfy_error;
use tokio::sync::mpsc::UnboundedSender;

use crate::connector::{ReqwestConnector, StreamConnector};
use crate::supervisor::{EngineCommand, Supervisor};
use crate::{EngineEvent, EngineSettings, TransportError, WorkerConfig};

/// Command side of the engine. The engine runs its own runtime on a
/// dedicated thread; every method here returns immediately.
pub struct EngineHandle {
    cmd_tx: UnboundedSender<EngineCommand>,
    shutdown_grace: Duration,
}

/// Event side of the engine. Events from one worker arrive in order.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<(Self, EngineEvents), TransportError> {
        let connector = Arc::new(ReqwestConnector::new(&settings)?);
        Ok(Self::with_connector(settings, connector))
    }

    pub fn with_connector(
        settings: EngineSettings,
        connector: Arc<dyn StreamConnector>,
    ) -> (Self, EngineEvents) {
        let (cmd_tx, cmd_rx) = tokio::sync::mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        let shutdown_grace = settings.shutdown_grace;
        let (supervisor, exit_rx) = Supervisor::new(connector, settings, event_tx);

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    ntfy_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(supervisor.run(cmd_rx, exit_rx));
        });

        (
            Self {
                cmd_tx,
                shutdown_grace,
            },
            EngineEvents { event_rx },
        )
    }

    /// Starts one worker per target. Ignored (with a warning) while any
    /// worker is still active.
    pub fn start_all(&self, targets: Vec<SubscriptionKey>, config: WorkerConfig) {
        self.send(EngineCommand::StartAll { targets, config });
    }

    pub fn start(&self, target: SubscriptionKey, config: WorkerConfig) {
        self.send(EngineCommand::Start { target, config });
    }

    pub fn stop(&self, target: SubscriptionKey) {
        self.send(EngineCommand::Stop { target });
    }

    pub fn stop_all(&self) {
        self.send(EngineCommand::StopAll);
    }

    pub fn fetch_history(&self, targets: Vec<SubscriptionKey>, since: SinceWindow) {
        self.send(EngineCommand::FetchHistory { targets, since });
    }

    /// Cancels every task and waits for them to finish, bounded by the
    /// configured grace period. Returns `false` if the engine did not confirm.
    pub fn shutdown(&self) -> bool {
        let (done_tx, done_rx) = mpsc::channel();
        if self.cmd_tx.send(EngineCommand::Shutdown { done: done_tx }).is_err() {
            return false;
        }
        done_rx
            .recv_timeout(self.shutdown_grace + Duration::from_secs(1))
            .is_ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            ntfy_error!("Engine thread is gone; command dropped");
        }
    }
}

impl EngineEvents {
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}
