//! WebSocket transport to the hub.
//!
//! Owns the socket halves through the read and write pumps. Frames go out
//! through a single queue so concurrent callers never interleave writes;
//! text frames come in on a channel, in arrival order.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;

use hassbridge_protocol::constants::WS_MAX_MESSAGE_SIZE;

use crate::error::HubError;

const WRITE_QUEUE: usize = 256;
const INBOUND_QUEUE: usize = 256;

/// An open socket to the hub.
pub struct WsClient {
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
    _read_handle: tokio::task::JoinHandle<()>,
    _write_handle: tokio::task::JoinHandle<()>,
}

impl WsClient {
    /// Opens the socket and starts the pumps.
    ///
    /// The returned receiver yields every inbound text frame and ends when
    /// the socket closes.
    pub async fn connect(url: &str) -> Result<(Self, mpsc::Receiver<String>), HubError> {
        let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
        let (ws_stream, _) =
            tokio_tungstenite::connect_async_with_config(url, Some(ws_config), false).await?;
        let (write, read) = ws_stream.split();

        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(WRITE_QUEUE);
        let (inbound_tx, inbound_rx) = mpsc::channel::<String>(INBOUND_QUEUE);
        let cancel = CancellationToken::new();

        let write_handle = {
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::write::write_pump(write, write_rx, cancel))
        };

        let read_handle = {
            let cancel = cancel.clone();
            let write_tx = write_tx.clone();
            tokio::spawn(crate::pumps::read::read_pump(
                read, inbound_tx, write_tx, cancel,
            ))
        };

        let client = Self {
            write_tx,
            cancel,
            _read_handle: read_handle,
            _write_handle: write_handle,
        };
        Ok((client, inbound_rx))
    }

    /// Queue feeding the write pump.
    pub fn write_tx(&self) -> mpsc::Sender<tungstenite::Message> {
        self.write_tx.clone()
    }

    /// Token cancelled when this socket shuts down.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the socket has been shut down from either side.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self._read_handle.is_finished()
    }

    /// Gracefully closes the connection.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        self.cancel.cancel();
        self._read_handle.abort();
        self._write_handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached(cancel: CancellationToken) -> (WsClient, mpsc::Receiver<tungstenite::Message>) {
        let (write_tx, write_rx) = mpsc::channel(16);
        let client = WsClient {
            write_tx,
            cancel,
            _read_handle: tokio::spawn(std::future::pending()),
            _write_handle: tokio::spawn(std::future::pending()),
        };
        (client, write_rx)
    }

    #[tokio::test]
    async fn close_cancels_token() {
        let (client, _rx) = detached(CancellationToken::new());
        let token = client.cancel_token();
        assert!(!client.is_closed());

        client.close();

        assert!(token.is_cancelled());
        assert!(client.is_closed());
    }

    #[tokio::test]
    async fn drop_cancels_token() {
        let cancel = CancellationToken::new();
        let (client, _rx) = detached(cancel.clone());
        drop(client);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn write_tx_feeds_queue() {
        let (client, mut rx) = detached(CancellationToken::new());
        client
            .write_tx()
            .send(tungstenite::Message::Text("x".to_string().into()))
            .await
            .unwrap();
        assert!(matches!(rx.recv().await, Some(tungstenite::Message::Text(_))));
    }

    #[tokio::test]
    async fn connect_refused_is_ws_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("ws://{addr}/api/websocket");
        let err = WsClient::connect(&url).await.err().unwrap();
        assert!(matches!(err, HubError::Ws(_)));
    }
}
