use std::sync::{mpsc, Arc};

use anyhow::Context;
use ntfy_core::SubscriptionError;
use ntfy_engine::{EngineHandle, EngineSettings};
use ntfy_logging::{ntfy_debug, ntfy_info, ntfy_warn};
use tokio::sync::oneshot;

use super::config::ClientConfig;
use super::console::spawn_console;
use super::coordinator::Coordinator;
use super::effects::{spawn_event_pump, EffectRunner};
use super::logging;
use super::observer::{spawn_observer, LogObserver};
use super::persistence::{load_or_empty, RonStateStore};

pub fn run_app() -> anyhow::Result<()> {
    let (config, problems) = ClientConfig::from_env();
    logging::initialize(config.log_destination, config.log_level);
    for problem in &problems {
        ntfy_warn!("{}", problem);
    }
    ntfy_info!("ntfy listener starting, state file {:?}", config.state_path);

    let store = RonStateStore::new(config.state_path.clone());
    let persisted = load_or_empty(&store);

    let (engine, engine_events) =
        EngineHandle::new(EngineSettings::default()).context("failed to start the engine")?;
    let (observer_tx, observer_rx) = mpsc::channel();
    spawn_observer(observer_rx, Box::new(LogObserver));

    let coordinator = Arc::new(Coordinator::new(EffectRunner::new(
        engine,
        observer_tx,
        Box::new(store),
        config.worker,
    )));
    spawn_event_pump(Arc::clone(&coordinator), engine_events);

    if let Some(persisted) = persisted {
        coordinator.restore(persisted);
    }
    for key in &config.subscribe {
        match coordinator.add_subscription(&key.server, &key.topic) {
            Ok(_) => {}
            Err(SubscriptionError::Duplicate(existing)) => {
                ntfy_debug!("{} is already subscribed", existing)
            }
            Err(err) => ntfy_warn!("Could not subscribe to {}: {}", key, err),
        }
    }

    match coordinator.start_listening(config.worker.auto_reconnect) {
        Ok(()) => {}
        Err(err) => ntfy_info!("Not listening yet: {}", err),
    }
    if let Some(since) = config.backfill {
        if let Err(err) = coordinator.fetch_history(since) {
            ntfy_warn!("Skipping startup history fetch: {}", err);
        }
    }

    let quit = spawn_console(Arc::clone(&coordinator), config.worker.auto_reconnect);
    wait_for_exit(quit)?;

    ntfy_info!("Shutting down");
    coordinator.stop_listening();
    if !coordinator.shutdown_engine() {
        ntfy_warn!("Engine did not confirm shutdown within its grace period");
    }
    coordinator.save();
    Ok(())
}

/// Blocks until Ctrl-C or a `quit` command.
fn wait_for_exit(quit: oneshot::Receiver<()>) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build the signal runtime")?;
    runtime.block_on(async {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => signal.context("failed to listen for Ctrl-C"),
            _ = wait_for_quit(quit) => Ok(()),
        }
    })
}

/// Resolves on `quit`; never resolves once the console reader is gone.
async fn wait_for_quit(quit: oneshot::Receiver<()>) {
    if quit.await.is_err() {
        std::future::pending::<()>().await;
    }
}
