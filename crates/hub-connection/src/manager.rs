//! Connection lifecycle for a single hub.
//!
//! `HubConnection` is an explicit handle: share it through `Arc`. It opens
//! the socket lazily, re-opens it on the next use after any close, and logs
//! repeated connect failures at a decaying rate instead of on every attempt.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use hassbridge_protocol::constants::WS_READY_TIMEOUT;
use hassbridge_protocol::{Entity, Request, ServiceCall};

use crate::backoff::LogBackoff;
use crate::correlator::Requester;
use crate::error::HubError;
use crate::filter::InclusionPolicy;
use crate::router::{Session, Shared};
use crate::types::{ConnectionState, HubSettings};
use crate::ws_client::WsClient;

struct Link {
    client: WsClient,
    requester: Requester,
}

/// Handle to the hub connection and its entity cache.
pub struct HubConnection {
    settings: HubSettings,
    shared: Arc<Shared>,
    state_rx: watch::Receiver<ConnectionState>,
    link: Mutex<Option<Link>>,
    log_backoff: std::sync::Mutex<LogBackoff>,
}

impl HubConnection {
    /// Creates a handle. No connection is attempted until first use.
    pub fn new(settings: HubSettings) -> Self {
        let policy = InclusionPolicy::new(settings.include_by_default);
        let (shared, state_rx) = Shared::new(policy);
        Self {
            settings,
            shared: Arc::new(shared),
            state_rx,
            link: Mutex::new(None),
            log_backoff: std::sync::Mutex::new(LogBackoff::default()),
        }
    }

    pub fn settings(&self) -> &HubSettings {
        &self.settings
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Opens a connection unless a live one exists.
    ///
    /// Never fails: errors are logged (rate limited) and the slot is left
    /// empty so the next call tries again.
    pub async fn ensure_connected(&self) {
        let mut link = self.link.lock().await;
        if link.as_ref().is_some_and(|l| !l.client.is_closed()) {
            return;
        }
        if link.take().is_some() {
            // The old session may not have torn down yet; do not let its
            // snapshots outlive it.
            self.shared.retire().await;
        }

        let generation = self.shared.next_generation();
        self.shared.set_state(generation, ConnectionState::Connecting);

        let url = self.settings.websocket_url();
        let log_now = self.should_log_failure(Instant::now());
        if log_now {
            warn!(url = %url, "hub disconnected, trying to (re)connect");
        }

        match WsClient::connect(&url).await {
            Ok((client, inbound)) => {
                if let Ok(mut backoff) = self.log_backoff.lock() {
                    backoff.reset();
                }
                self.shared
                    .set_state(generation, ConnectionState::AwaitingAuth);

                let requester = Requester::new(client.write_tx());
                let session = Session::new(
                    generation,
                    self.shared.clone(),
                    requester.clone(),
                    self.settings.access_token.clone(),
                    client.cancel_token(),
                );
                tokio::spawn(session.run(inbound));

                info!(url = %url, generation, "connected to hub");
                *link = Some(Link { client, requester });
            }
            Err(e) => {
                if log_now {
                    error!(url = %url, "hub connection failed: {e}");
                    if let Ok(mut backoff) = self.log_backoff.lock() {
                        backoff.record_logged_failure(Instant::now());
                    }
                } else {
                    debug!(url = %url, "hub connection failed: {e}");
                }
                self.shared
                    .set_state(generation, ConnectionState::Disconnected);
            }
        }
    }

    fn should_log_failure(&self, now: Instant) -> bool {
        self.log_backoff
            .lock()
            .map(|backoff| backoff.should_log(now))
            .unwrap_or(true)
    }

    /// Waits until the handshake has completed.
    ///
    /// Fails with [`HubError::NotReady`] as soon as the connection drops to
    /// `Disconnected`, or [`HubError::Timeout`].
    pub async fn wait_ready(&self, timeout: Duration) -> Result<ConnectionState, HubError> {
        let mut rx = self.state_rx.clone();
        let waited = tokio::time::timeout(
            timeout,
            rx.wait_for(|s| s.is_ready() || *s == ConnectionState::Disconnected),
        )
        .await;

        match waited {
            Ok(Ok(state)) => {
                let state = *state;
                if state.is_ready() {
                    Ok(state)
                } else {
                    Err(HubError::NotReady(state))
                }
            }
            Ok(Err(_)) => Err(HubError::Closed),
            Err(_) => Err(HubError::Timeout),
        }
    }

    async fn ready_requester(&self, timeout: Duration) -> Result<Requester, HubError> {
        self.ensure_connected().await;
        self.wait_ready(timeout).await?;
        self.link
            .lock()
            .await
            .as_ref()
            .map(|l| l.requester.clone())
            .ok_or(HubError::Closed)
    }

    /// Requests a fresh state dump and waits until it has been loaded into
    /// the cache. Returns the number of discovered entities.
    pub async fn refresh_states(&self, timeout: Duration) -> Result<usize, HubError> {
        let started = Instant::now();
        let requester = self.ready_requester(timeout).await?;
        let reply = requester.send(Request::GetStates).await?;
        let id = reply.id;
        reply.wait(timeout.saturating_sub(started.elapsed())).await?;

        let discovered = self.shared.cache.read().await.discovered_len();
        debug!(id, discovered, "states refreshed");
        Ok(discovered)
    }

    /// Queues a service call. Returns its request id; the hub's answer is
    /// not awaited.
    pub async fn call_service(&self, call: ServiceCall) -> Result<u64, HubError> {
        let requester = self.ready_requester(WS_READY_TIMEOUT).await?;
        let domain = call.domain.clone();
        let service = call.service.clone();
        let reply = requester.send(Request::CallService(call)).await?;
        debug!(id = reply.id, domain = %domain, service = %service, "service call queued");
        Ok(reply.id)
    }

    /// Latest cached snapshot of an entity.
    pub async fn latest_state(&self, entity_id: &str) -> Option<Entity> {
        self.shared.cache.read().await.get(entity_id).cloned()
    }

    /// Entities found by the bulk fetch on the current connection.
    pub async fn discovered_entities(&self) -> Vec<Entity> {
        self.shared.cache.read().await.discovered()
    }

    /// Closes the current connection, if any. The next use reconnects.
    pub async fn close(&self) {
        let mut link = self.link.lock().await;
        if let Some(old) = link.take() {
            info!("closing hub connection");
            old.client.close();
            let generation = self.shared.retire().await;
            self.shared
                .set_state(generation, ConnectionState::Disconnected);
        }
    }
}
