//! Hub connection error types.

use tokio_tungstenite::tungstenite;

use crate::types::ConnectionState;

/// Errors produced while talking to the hub.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request timed out")]
    Timeout,

    #[error("connection closed")]
    Closed,

    #[error("hub connection not ready ({0})")]
    NotReady(ConnectionState),

    #[error("hub rejected request: {code}: {message}")]
    Rejected { code: String, message: String },
}
