//! Application-level keepalive: `ping` requests answered by `pong` frames.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use hassbridge_protocol::Request;
use hassbridge_protocol::constants::WS_PING_PERIOD;

use crate::correlator::Requester;
use crate::error::HubError;

/// Sends a `ping` request every [`WS_PING_PERIOD`] until cancelled or the
/// connection goes away. A missing pong is only logged; the read pump's
/// deadline decides when the hub is gone.
pub(crate) async fn ping_pump(requester: Requester, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(WS_PING_PERIOD);
    interval.tick().await; // Skip immediate first tick.

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let reply = match requester.send(Request::Ping).await {
                    Ok(reply) => reply,
                    Err(_) => break,
                };
                let id = reply.id;
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => break,
                    outcome = reply.wait(WS_PING_PERIOD) => outcome,
                };
                match outcome {
                    Ok(_) => {}
                    Err(HubError::Closed) => break,
                    Err(e) => debug!(id, "ping unanswered: {e}"),
                }
            }
        }
    }
}
