//! WebSocket read pump: hands text frames to the session in arrival order.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use hassbridge_protocol::constants::WS_PONG_WAIT;

/// Reads frames from the socket and forwards text payloads to `inbound_tx`.
///
/// Any inbound frame resets a read deadline of [`WS_PONG_WAIT`]; if it
/// expires the hub is considered gone. Returning drops `inbound_tx`, which
/// is how the session learns the socket closed.
pub(crate) async fn read_pump<S>(
    mut read: S,
    inbound_tx: mpsc::Sender<String>,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let deadline = tokio::time::sleep(WS_PONG_WAIT);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            () = &mut deadline => {
                warn!("hub silent past read deadline, closing");
                break;
            }

            msg = read.next() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        warn!("hub socket read error: {e}");
                        break;
                    }
                    None => {
                        debug!("hub socket stream ended");
                        break;
                    }
                };

                deadline.as_mut().reset(tokio::time::Instant::now() + WS_PONG_WAIT);

                match msg {
                    tungstenite::Message::Text(text) => {
                        trace!(len = text.len(), "frame received");
                        if inbound_tx.send(text.as_str().to_owned()).await.is_err() {
                            debug!("session gone, stopping read pump");
                            break;
                        }
                    }
                    tungstenite::Message::Ping(data) => {
                        let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                    }
                    tungstenite::Message::Close(frame) => {
                        debug!(frame = ?frame, "hub closed the socket");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }
}
