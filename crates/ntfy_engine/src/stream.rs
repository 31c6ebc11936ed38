use std::sync::mpsc;

use ntfy_core::{Message, MessageOrigin, SubscriptionKey};
use ntfy_logging::{ntfy_warn, payload_preview};
use tokio::io::AsyncBufReadExt;

use crate::connector::{classify_read_error, LineReader};
use crate::{EngineEvent, TransportError};

/// Reads `reader` to the end, forwarding every decodable line.
///
/// Returns the number of lines that decoded, or the transport error that
/// ended the body early.
pub(crate) async fn pump_lines(
    reader: &mut LineReader,
    target: &SubscriptionKey,
    origin: MessageOrigin,
    events: &mpsc::Sender<EngineEvent>,
) -> Result<usize, TransportError> {
    let mut line = Vec::new();
    let mut decoded = 0;
    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .await
            .map_err(classify_read_error)?;
        if read == 0 {
            return Ok(decoded);
        }
        if forward_line(&line, target, origin, events) {
            decoded += 1;
        }
    }
}

/// Decodes one raw line and emits it. Blank lines are skipped silently.
pub(crate) fn forward_line(
    raw: &[u8],
    target: &SubscriptionKey,
    origin: MessageOrigin,
    events: &mpsc::Sender<EngineEvent>,
) -> bool {
    if raw.trim_ascii().is_empty() {
        return false;
    }
    match Message::decode_line(raw, &target.server) {
        Ok(message) => {
            let _ = events.send(EngineEvent::MessageReceived {
                target: target.clone(),
                message,
                origin,
            });
            true
        }
        Err(err) => {
            ntfy_warn!(
                "Decode error on {}: {} (line: {})",
                target,
                err,
                payload_preview(raw)
            );
            let _ = events.send(EngineEvent::DecodeFailed {
                target: target.clone(),
                origin,
                error: err.to_string(),
            });
            false
        }
    }
}
