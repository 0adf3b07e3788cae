use std::time::Duration;

/// Path of the WebSocket API on the hub.
pub const WS_API_PATH: &str = "/api/websocket";

/// Port the hub listens on when none is configured.
pub const DEFAULT_HUB_PORT: u16 = 8123;

/// Entity domain handled by this bridge.
pub const LIGHT_DOMAIN: &str = "light";

/// Event type carried by the standing subscription.
pub const EVENT_STATE_CHANGED: &str = "state_changed";

/// Entity attribute holding the per-entity inclusion override.
///
/// Values `"include"` and `"exclude"` are recognised; anything else is
/// treated as if the attribute were absent.
pub const INCLUSION_ATTRIBUTE: &str = "diyhue";

/// Inclusion override value that opts an entity in.
pub const INCLUDE_FLAG: &str = "include";

/// Inclusion override value that opts an entity out.
pub const EXCLUDE_FLAG: &str = "exclude";

/// How often to send an application-level ping once authenticated.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(30);

/// Read deadline: if nothing arrives within this window the connection is
/// considered dead. Must comfortably exceed [`WS_PING_PERIOD`].
pub const WS_PONG_WAIT: Duration = Duration::from_secs(90);

/// Maximum inbound message size in bytes. A full `get_states` dump on a
/// large installation runs to several megabytes.
pub const WS_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// How long callers wait for the handshake before giving up on a request.
pub const WS_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// How long discovery waits for the bulk state fetch to be answered.
pub const STATE_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Initial window for rate-limited connection error logging.
pub const LOG_BACKOFF_BASE: Duration = Duration::from_secs(2);
