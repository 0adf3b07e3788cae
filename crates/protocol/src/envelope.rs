use serde::{Deserialize, Serialize};

use crate::constants::WS_MAX_MESSAGE_SIZE;

/// Errors decoding an inbound frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame too large ({0} bytes)")]
    TooLarge(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error details attached to an unsuccessful `result` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubErrorInfo {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Answer to a request, correlated by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<HubErrorInfo>,
}

/// Event pushed on a subscription.
///
/// The body is left untyped here so that a malformed event can be reported
/// without failing the whole frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub event: serde_json::Value,
}

/// Answer to a `ping` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PongFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

/// Every frame the hub can send, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    AuthRequired {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ha_version: Option<String>,
    },
    AuthOk {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ha_version: Option<String>,
    },
    AuthInvalid {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Result(ResultFrame),
    Event(EventFrame),
    Pong(PongFrame),
    /// Any `type` this client does not know about.
    #[serde(other)]
    Unknown,
}

impl ServerFrame {
    /// Decodes a text frame received from the hub.
    pub fn from_text(text: &str) -> Result<Self, FrameError> {
        if text.len() > WS_MAX_MESSAGE_SIZE {
            return Err(FrameError::TooLarge(text.len()));
        }
        Ok(serde_json::from_str(text)?)
    }
}

/// Authentication frame, the only frame sent without an `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "auth")]
pub struct AuthFrame {
    pub access_token: String,
}

/// A service invocation on the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub service_data: serde_json::Value,
}

/// Commands sent to the hub after authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    GetStates,
    SubscribeEvents { event_type: String },
    CallService(ServiceCall),
    Ping,
}

/// A [`Request`] stamped with its correlation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub id: u64,
    #[serde(flatten)]
    pub request: Request,
}

impl RequestFrame {
    pub fn new(id: u64, request: Request) -> Self {
        Self { id, request }
    }

    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
