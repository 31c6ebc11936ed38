use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use futures_util::future::join_all;
use ntfy_core::{MessageOrigin, SinceWindow, SubscriptionKey, SubscriptionStatus};
use ntfy_logging::{ntfy_debug, ntfy_error, ntfy_info, ntfy_warn};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::connector::StreamConnector;
use crate::history::fetch_history;
use crate::stream::pump_lines;
use crate::{EngineEvent, EngineSettings, TransportError, WorkerConfig};

pub(crate) enum EngineCommand {
    StartAll {
        targets: Vec<SubscriptionKey>,
        config: WorkerConfig,
    },
    Start {
        target: SubscriptionKey,
        config: WorkerConfig,
    },
    Stop {
        target: SubscriptionKey,
    },
    StopAll,
    FetchHistory {
        targets: Vec<SubscriptionKey>,
        since: SinceWindow,
    },
    Shutdown {
        done: mpsc::Sender<()>,
    },
}

pub(crate) struct WorkerExit {
    target: SubscriptionKey,
    id: u64,
}

struct ActiveWorker {
    id: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    /// Cancelled but not yet exited. The entry stays until the task reports
    /// its exit so a new worker for the same key never overlaps it.
    stopping: bool,
    /// Start requested while stopping; spawned once the old task is reaped.
    restart: Option<WorkerConfig>,
}

impl ActiveWorker {
    fn stop(&mut self) {
        self.stopping = true;
        self.restart = None;
        self.cancel.cancel();
    }
}

/// Owns every streaming worker and the history fetch task.
///
/// Lives on the engine thread; all commands are handled sequentially.
pub(crate) struct Supervisor {
    connector: Arc<dyn StreamConnector>,
    settings: EngineSettings,
    events: mpsc::Sender<EngineEvent>,
    root: CancellationToken,
    workers: HashMap<SubscriptionKey, ActiveWorker>,
    history: Option<JoinHandle<()>>,
    next_id: u64,
    exit_tx: UnboundedSender<WorkerExit>,
}

impl Supervisor {
    pub(crate) fn new(
        connector: Arc<dyn StreamConnector>,
        settings: EngineSettings,
        events: mpsc::Sender<EngineEvent>,
    ) -> (Self, UnboundedReceiver<WorkerExit>) {
        let (exit_tx, exit_rx) = tokio::sync::mpsc::unbounded_channel();
        let supervisor = Self {
            connector,
            settings,
            events,
            root: CancellationToken::new(),
            workers: HashMap::new(),
            history: None,
            next_id: 0,
            exit_tx,
        };
        (supervisor, exit_rx)
    }

    pub(crate) async fn run(
        mut self,
        mut commands: UnboundedReceiver<EngineCommand>,
        mut exits: UnboundedReceiver<WorkerExit>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(EngineCommand::Shutdown { done }) => {
                        self.shutdown().await;
                        let _ = done.send(());
                        return;
                    }
                    Some(command) => self.handle(command),
                    None => {
                        self.shutdown().await;
                        return;
                    }
                },
                Some(exit) = exits.recv() => self.reap(exit),
            }
        }
    }

    fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::StartAll { targets, config } => {
                let running = self.workers.values().filter(|w| !w.stopping).count();
                if running > 0 {
                    ntfy_warn!(
                        "Already listening on {} subscriptions; stop before restarting",
                        running
                    );
                    return;
                }
                for target in targets {
                    self.start_or_queue(target, config);
                }
            }
            EngineCommand::Start { target, config } => {
                if self.workers.get(&target).is_some_and(|w| !w.stopping) {
                    ntfy_warn!("Worker for {} already running", target);
                    return;
                }
                self.start_or_queue(target, config);
            }
            EngineCommand::Stop { target } => {
                if let Some(worker) = self.workers.get_mut(&target) {
                    ntfy_info!("Stopping worker for {}", target);
                    worker.stop();
                }
            }
            EngineCommand::StopAll => {
                for (target, worker) in self.workers.iter_mut() {
                    ntfy_debug!("Stopping worker for {}", target);
                    worker.stop();
                }
            }
            EngineCommand::FetchHistory { targets, since } => {
                if self
                    .history
                    .as_ref()
                    .is_some_and(|handle| !handle.is_finished())
                {
                    ntfy_warn!("History fetch already running; ignoring since={}", since);
                    return;
                }
                let task = fetch_history(
                    self.connector.clone(),
                    targets,
                    since,
                    self.settings.history_timeout,
                    self.events.clone(),
                    self.root.child_token(),
                );
                self.history = Some(tokio::spawn(task));
            }
            EngineCommand::Shutdown { .. } => {}
        }
    }

    fn start_or_queue(&mut self, target: SubscriptionKey, config: WorkerConfig) {
        match self.workers.get_mut(&target) {
            Some(worker) => {
                ntfy_debug!("Worker for {} still stopping; restart queued", target);
                worker.restart = Some(config);
            }
            None => self.spawn_worker(target, config),
        }
    }

    fn spawn_worker(&mut self, target: SubscriptionKey, config: WorkerConfig) {
        self.next_id += 1;
        let id = self.next_id;
        let cancel = self.root.child_token();
        let worker = Worker {
            target: target.clone(),
            config,
            connector: self.connector.clone(),
            events: self.events.clone(),
            cancel: cancel.clone(),
        };
        let exit_tx = self.exit_tx.clone();
        let exit_target = target.clone();
        let handle = tokio::spawn(async move {
            worker.run().await;
            let _ = exit_tx.send(WorkerExit {
                target: exit_target,
                id,
            });
        });
        self.workers.insert(
            target,
            ActiveWorker {
                id,
                cancel,
                handle,
                stopping: false,
                restart: None,
            },
        );
    }

    fn reap(&mut self, exit: WorkerExit) {
        if !self
            .workers
            .get(&exit.target)
            .is_some_and(|worker| worker.id == exit.id)
        {
            return;
        }
        let restart = self
            .workers
            .remove(&exit.target)
            .and_then(|worker| worker.restart);
        if let Some(config) = restart {
            if !self.root.is_cancelled() {
                self.spawn_worker(exit.target, config);
            }
        }
    }

    async fn shutdown(&mut self) {
        self.root.cancel();
        let mut handles: Vec<JoinHandle<()>> =
            self.workers.drain().map(|(_, worker)| worker.handle).collect();
        handles.extend(self.history.take());
        if handles.is_empty() {
            return;
        }
        ntfy_info!("Waiting for {} engine tasks to stop", handles.len());
        if tokio::time::timeout(self.settings.shutdown_grace, join_all(handles))
            .await
            .is_err()
        {
            ntfy_warn!(
                "Engine tasks still running after {:?}; abandoning them",
                self.settings.shutdown_grace
            );
        }
    }
}

/// One long-lived stream for one subscription.
struct Worker {
    target: SubscriptionKey,
    config: WorkerConfig,
    connector: Arc<dyn StreamConnector>,
    events: mpsc::Sender<EngineEvent>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) {
        let url = self.target.stream_url();
        let mut attempts: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            self.emit_status(SubscriptionStatus::Connecting, None);

            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => break,
                outcome = self.stream_once(&url) => outcome,
            };
            if self.cancel.is_cancelled() {
                break;
            }

            if !self.config.auto_reconnect {
                match outcome {
                    Ok(()) => {
                        ntfy_info!("Stream for {} ended", self.target);
                        self.emit_status(SubscriptionStatus::Disconnected, None);
                    }
                    Err(err) => {
                        ntfy_error!("Stream for {} failed: {}", self.target, err);
                        self.emit_status(SubscriptionStatus::Error, Some(err.to_string()));
                    }
                }
                break;
            }

            attempts += 1;
            let error = match outcome {
                Ok(()) => {
                    ntfy_info!(
                        "Stream for {} ended, reconnecting (attempt {})",
                        self.target,
                        attempts
                    );
                    None
                }
                Err(err) => {
                    ntfy_error!(
                        "Stream for {} failed: {}, reconnecting (attempt {})",
                        self.target,
                        err,
                        attempts
                    );
                    Some(err.to_string())
                }
            };
            self.emit_status(SubscriptionStatus::Reconnecting(attempts), error);

            if !self.backoff(self.config.reconnect_delay).await {
                break;
            }
        }

        self.emit_status(SubscriptionStatus::Disconnected, None);
        let _ = self.events.send(EngineEvent::WorkerExited {
            target: self.target.clone(),
        });
    }

    async fn stream_once(&self, url: &str) -> Result<(), TransportError> {
        ntfy_info!("Connecting to {}: {}", self.target, url);
        let mut reader = self.connector.open(url, None).await?;
        self.emit_status(SubscriptionStatus::Connected, None);
        pump_lines(&mut reader, &self.target, MessageOrigin::Live, &self.events).await?;
        Ok(())
    }

    /// Sleeps for `delay`; returns `false` if cancelled first.
    async fn backoff(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    fn emit_status(&self, status: SubscriptionStatus, error: Option<String>) {
        let _ = self.events.send(EngineEvent::StatusChanged {
            target: self.target.clone(),
            status,
            error,
        });
    }
}
