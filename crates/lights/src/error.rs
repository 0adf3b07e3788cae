//! Error types for the light adapter.

use hassbridge_hub_connection::HubError;

/// Errors produced while reading, driving or discovering lights.
#[derive(Debug, thiserror::Error)]
pub enum LightsError {
    #[error("hub error: {0}")]
    Hub(#[from] HubError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("address belongs to protocol {0:?}")]
    ForeignAddress(String),
}
