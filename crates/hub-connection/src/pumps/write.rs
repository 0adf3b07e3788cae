//! WebSocket write pump: the only writer on the socket.

use futures_util::SinkExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

/// Drains the outbound queue onto the socket until cancelled or the socket
/// fails, then sends a close frame.
pub(crate) async fn write_pump<S>(
    mut write: S,
    mut write_rx: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    let mut sent: u64 = 0;
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = write_rx.recv() => msg,
        };
        let Some(msg) = msg else {
            break;
        };
        if let Err(e) = write.send(msg).await {
            error!("hub socket write error: {e}");
            break;
        }
        sent += 1;
        trace!(sent, "frame written");
    }

    debug!(sent, "write pump stopping");
    let _ = write.send(tungstenite::Message::Close(None)).await;
}
