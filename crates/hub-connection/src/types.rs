//! Public types for the hub connection.

use std::fmt;

use serde::{Deserialize, Serialize};

use hassbridge_protocol::constants::{DEFAULT_HUB_PORT, WS_API_PATH};

/// Lifecycle state of the hub connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live socket.
    Disconnected,
    /// Socket open in progress.
    Connecting,
    /// Socket open, handshake not finished.
    AwaitingAuth,
    /// Handshake accepted; initial requests not yet sent.
    Authenticated,
    /// Initial fetch and standing subscription sent.
    Subscribed,
}

impl ConnectionState {
    /// Whether requests may be sent in this state.
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Authenticated | Self::Subscribed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::AwaitingAuth => "awaiting auth",
            Self::Authenticated => "authenticated",
            Self::Subscribed => "subscribed",
        };
        f.write_str(s)
    }
}

/// Settings for reaching the hub.
///
/// The camelCase aliases accept configuration written by older bridge
/// versions.
#[derive(Clone, Serialize, Deserialize)]
pub struct HubSettings {
    #[serde(default = "default_host", alias = "homeAssistantIp")]
    pub host: String,

    #[serde(default = "default_port", alias = "homeAssistantPort")]
    pub port: u16,

    /// Long-lived access token.
    #[serde(default, alias = "homeAssistantToken")]
    pub access_token: String,

    /// Mirror every light unless it opts out with `diyhue: exclude`.
    #[serde(default, alias = "homeAssistantIncludeByDefault")]
    pub include_by_default: bool,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    DEFAULT_HUB_PORT
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            access_token: String::new(),
            include_by_default: false,
        }
    }
}

impl HubSettings {
    /// WebSocket endpoint, `ws://<host>:<port>/api/websocket`.
    pub fn websocket_url(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, WS_API_PATH)
    }
}

// Keeps the token out of logs.
impl fmt::Debug for HubSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("access_token", &"<redacted>")
            .field("include_by_default", &self.include_by_default)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_states() {
        assert!(ConnectionState::Authenticated.is_ready());
        assert!(ConnectionState::Subscribed.is_ready());
        assert!(!ConnectionState::AwaitingAuth.is_ready());
        assert!(!ConnectionState::Connecting.is_ready());
        assert!(!ConnectionState::Disconnected.is_ready());
    }

    #[test]
    fn websocket_url_format() {
        let settings = HubSettings {
            host: "192.168.1.10".into(),
            port: 8124,
            ..HubSettings::default()
        };
        assert_eq!(
            settings.websocket_url(),
            "ws://192.168.1.10:8124/api/websocket"
        );
    }

    #[test]
    fn defaults() {
        let settings = HubSettings::default();
        assert_eq!(settings.port, 8123);
        assert!(!settings.include_by_default);
        assert!(settings.access_token.is_empty());
    }

    #[test]
    fn accepts_legacy_keys() {
        let settings: HubSettings = serde_json::from_value(serde_json::json!({
            "homeAssistantIp": "10.0.0.2",
            "homeAssistantPort": 9000,
            "homeAssistantToken": "tok",
            "homeAssistantIncludeByDefault": true
        }))
        .unwrap();
        assert_eq!(settings.host, "10.0.0.2");
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.access_token, "tok");
        assert!(settings.include_by_default);
    }

    #[test]
    fn debug_redacts_token() {
        let settings = HubSettings {
            access_token: "super-secret".into(),
            ..HubSettings::default()
        };
        let out = format!("{settings:?}");
        assert!(!out.contains("super-secret"));
        assert!(out.contains("<redacted>"));
    }
}
