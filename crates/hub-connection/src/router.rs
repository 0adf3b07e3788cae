//! Session task: dispatches inbound hub frames for one connection.
//!
//! Frames are handled one at a time in arrival order. Nothing the hub sends
//! terminates the session except `auth_invalid`; bad frames are logged and
//! dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{RwLock, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use hassbridge_protocol::constants::EVENT_STATE_CHANGED;
use hassbridge_protocol::{
    Entity, EventFrame, EventPayload, PongFrame, Request, ResultFrame, ServerFrame,
    StateChangedData, is_light_id,
};

use crate::cache::StateCache;
use crate::correlator::{RequestKind, Requester};
use crate::filter::InclusionPolicy;
use crate::types::ConnectionState;

/// State that outlives individual connections.
pub(crate) struct Shared {
    pub(crate) cache: RwLock<StateCache>,
    pub(crate) state_tx: watch::Sender<ConnectionState>,
    pub(crate) policy: InclusionPolicy,
    generation: AtomicU64,
}

impl Shared {
    pub(crate) fn new(policy: InclusionPolicy) -> (Self, watch::Receiver<ConnectionState>) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let shared = Self {
            cache: RwLock::new(StateCache::new()),
            state_tx,
            policy,
            generation: AtomicU64::new(0),
        };
        (shared, state_rx)
    }

    /// Starts a new connection generation; older sessions lose the right to
    /// publish state.
    pub(crate) fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Ends the live generation and invalidates the cache in one step, so
    /// no frame from the retired session can land afterwards. Returns the
    /// new generation.
    pub(crate) async fn retire(&self) -> u64 {
        let mut cache = self.cache.write().await;
        let generation = self.next_generation();
        cache.invalidate();
        debug!(generation, "connection generation retired");
        generation
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Publishes `state` if `generation` is still the live connection.
    pub(crate) fn set_state(&self, generation: u64, state: ConnectionState) -> bool {
        if !self.is_current(generation) {
            trace!(generation, %state, "stale state update ignored");
            return false;
        }
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!(generation, from = %previous, to = %state, "connection state changed");
        }
        true
    }
}

/// One connection's frame handler.
pub(crate) struct Session {
    generation: u64,
    shared: Arc<Shared>,
    requester: Requester,
    access_token: String,
    cancel: CancellationToken,
}

impl Session {
    pub(crate) fn new(
        generation: u64,
        shared: Arc<Shared>,
        requester: Requester,
        access_token: String,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            generation,
            shared,
            requester,
            access_token,
            cancel,
        }
    }

    /// Handles frames until the socket closes or the session is cancelled,
    /// then invalidates what this connection knew.
    pub(crate) async fn run(self, mut inbound: mpsc::Receiver<String>) {
        loop {
            let text = tokio::select! {
                _ = self.cancel.cancelled() => break,
                text = inbound.recv() => text,
            };
            let Some(text) = text else {
                break;
            };
            self.handle_text(&text).await;
        }
        self.teardown().await;
    }

    async fn handle_text(&self, text: &str) {
        let frame = match ServerFrame::from_text(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("dropping undecodable frame: {e}");
                return;
            }
        };

        match frame {
            ServerFrame::AuthRequired { ha_version } => {
                debug!(ha_version = ?ha_version, "hub requested authentication");
                if let Err(e) = self.requester.authenticate(&self.access_token).await {
                    warn!("failed to send auth frame: {e}");
                }
            }
            ServerFrame::AuthOk { ha_version } => self.on_authenticated(ha_version).await,
            ServerFrame::AuthInvalid { message } => {
                error!(
                    message = message.as_deref().unwrap_or_default(),
                    "hub rejected the access token"
                );
                self.shared
                    .set_state(self.generation, ConnectionState::Disconnected);
                self.cancel.cancel();
            }
            ServerFrame::Result(result) => self.on_result(result).await,
            ServerFrame::Event(event) => self.on_event(event).await,
            ServerFrame::Pong(pong) => self.on_pong(pong).await,
            ServerFrame::Unknown => warn!(frame = %text, "unexpected message from hub"),
        }
    }

    async fn on_authenticated(&self, ha_version: Option<String>) {
        info!(ha_version = ?ha_version, "authenticated with hub");
        self.shared
            .set_state(self.generation, ConnectionState::Authenticated);

        if let Err(e) = self.requester.send(Request::GetStates).await {
            warn!("failed to request states: {e}");
            return;
        }
        let subscribe = Request::SubscribeEvents {
            event_type: EVENT_STATE_CHANGED.to_string(),
        };
        if let Err(e) = self.requester.send(subscribe).await {
            warn!("failed to subscribe to state changes: {e}");
            return;
        }
        self.shared
            .set_state(self.generation, ConnectionState::Subscribed);

        tokio::spawn(crate::pumps::ping::ping_pump(
            self.requester.clone(),
            self.cancel.clone(),
        ));
    }

    async fn on_result(&self, result: ResultFrame) {
        let Some(id) = result.id else {
            debug!("result frame without id");
            return;
        };
        let pending = self.requester.correlator().lock().await.resolve(id);
        let Some(pending) = pending else {
            debug!(id, "result for unknown request");
            return;
        };

        if !result.success {
            let (code, message) = result
                .error
                .as_ref()
                .map(|e| (e.code.as_str(), e.message.as_str()))
                .unwrap_or_default();
            warn!(id, kind = ?pending.kind(), code, message, "hub request failed");
        } else if pending.kind() == RequestKind::FetchStates {
            self.seed(result.result.as_ref()).await;
        }
        pending.complete(result);
    }

    /// Loads a `get_states` answer. One malformed entity is skipped without
    /// losing the rest.
    async fn seed(&self, payload: Option<&Value>) {
        let Some(items) = payload.and_then(Value::as_array) else {
            warn!("states result is not a list");
            return;
        };

        let mut cache = self.shared.cache.write().await;
        if !self.shared.is_current(self.generation) {
            debug!(generation = self.generation, "states from retired connection dropped");
            return;
        }
        let mut seeded = 0usize;
        for item in items {
            let entity = match Entity::deserialize(item) {
                Ok(entity) => entity,
                Err(e) => {
                    debug!("skipping malformed entity: {e}");
                    continue;
                }
            };
            if self.shared.policy.admits(&entity) {
                cache.seed(entity);
                seeded += 1;
            }
        }
        info!(total = items.len(), seeded, "states loaded");
    }

    async fn on_event(&self, frame: EventFrame) {
        let payload: EventPayload = match serde_json::from_value(frame.event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("malformed event: {e}");
                return;
            }
        };
        if payload.event_type != EVENT_STATE_CHANGED {
            debug!(event_type = %payload.event_type, "ignoring event");
            return;
        }
        let data: StateChangedData = match serde_json::from_value(payload.data) {
            Ok(data) => data,
            Err(e) => {
                warn!("malformed state_changed event: {e}");
                return;
            }
        };
        if !is_light_id(&data.entity_id) {
            return;
        }

        match data.new_state {
            Some(entity) => {
                if !self.shared.policy.admits(&entity) {
                    return;
                }
                let mut cache = self.shared.cache.write().await;
                if self.shared.is_current(self.generation) {
                    trace!(entity = %entity.entity_id, state = %entity.state, "state changed");
                    cache.update(entity);
                }
            }
            None => {
                let mut cache = self.shared.cache.write().await;
                if self.shared.is_current(self.generation) {
                    debug!(entity = %data.entity_id, "entity removed");
                    cache.mark_unavailable(&data.entity_id);
                }
            }
        }
    }

    async fn on_pong(&self, pong: PongFrame) {
        let Some(id) = pong.id else {
            return;
        };
        let pending = self.requester.correlator().lock().await.resolve(id);
        match pending {
            Some(pending) => pending.complete(ResultFrame {
                id: Some(id),
                success: true,
                result: None,
                error: None,
            }),
            None => debug!(id, "pong for unknown ping"),
        }
    }

    async fn teardown(&self) {
        info!(generation = self.generation, "hub connection closed");
        if self.shared.is_current(self.generation) {
            self.shared.cache.write().await.invalidate();
        }
        self.requester.correlator().lock().await.fail_all();
        self.shared
            .set_state(self.generation, ConnectionState::Disconnected);
        self.cancel.cancel();
    }
}
