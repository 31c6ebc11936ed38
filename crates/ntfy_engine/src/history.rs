use std::sync::{mpsc, Arc};
use std::time::Duration;

use ntfy_core::{MessageOrigin, SinceWindow, SubscriptionKey};
use ntfy_logging::{ntfy_error, ntfy_info};
use tokio_util::sync::CancellationToken;

use crate::connector::StreamConnector;
use crate::stream::pump_lines;
use crate::{EngineEvent, TransportError};

/// One-shot backfill over `targets`, one subscription after another.
///
/// A failing subscription is reported and skipped. `HistoryFetchFinished` is
/// always emitted last, even when cancelled part-way.
pub(crate) async fn fetch_history(
    connector: Arc<dyn StreamConnector>,
    targets: Vec<SubscriptionKey>,
    since: SinceWindow,
    timeout: Duration,
    events: mpsc::Sender<EngineEvent>,
    cancel: CancellationToken,
) {
    let mut received = 0;
    let mut failed = 0;

    for target in targets {
        let url = target.poll_url(since.query_value());
        ntfy_info!("Fetching history for {}: {}", target, url);

        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = fetch_one(connector.as_ref(), &target, &url, timeout, &events) => result,
        };
        match result {
            Ok(count) => received += count,
            Err(error) => {
                failed += 1;
                ntfy_error!("History fetch for {} failed: {}", target, error);
                let _ = events.send(EngineEvent::HistoryTargetFailed { target, error });
            }
        }
    }

    let _ = events.send(EngineEvent::HistoryFetchFinished {
        since,
        received,
        failed,
    });
}

async fn fetch_one(
    connector: &dyn StreamConnector,
    target: &SubscriptionKey,
    url: &str,
    timeout: Duration,
    events: &mpsc::Sender<EngineEvent>,
) -> Result<usize, TransportError> {
    let mut reader = connector.open(url, Some(timeout)).await?;
    pump_lines(&mut reader, target, MessageOrigin::History, events).await
}
