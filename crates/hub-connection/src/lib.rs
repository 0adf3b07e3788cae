//! Connection to a Home Assistant hub over its WebSocket API.
//!
//! Owns the socket lifecycle (auth handshake, reconnect with rate-limited
//! error logging), correlates requests with their results, and keeps a
//! cache of the light entities the inclusion policy admits.

mod backoff;
pub mod cache;
pub mod correlator;
pub mod error;
pub mod filter;
pub mod manager;
mod pumps;
mod router;
pub mod types;
pub mod ws_client;

pub use cache::StateCache;
pub use correlator::{Correlator, PendingReply, RequestKind};
pub use error::HubError;
pub use filter::InclusionPolicy;
pub use manager::HubConnection;
pub use types::{ConnectionState, HubSettings};
pub use ws_client::WsClient;
