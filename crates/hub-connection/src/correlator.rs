//! Request id assignment and result correlation.
//!
//! Ids start at 1 for every connection and only ever increase. A result
//! frame removes its pending entry; results for unknown ids are ignored.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_tungstenite::tungstenite;
use tracing::trace;

use hassbridge_protocol::{AuthFrame, Request, RequestFrame, ResultFrame};

use crate::error::HubError;

/// What an in-flight request was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    FetchStates,
    Subscribe,
    ServiceCall,
    Ping,
}

impl RequestKind {
    pub fn of(request: &Request) -> Self {
        match request {
            Request::GetStates => Self::FetchStates,
            Request::SubscribeEvents { .. } => Self::Subscribe,
            Request::CallService(_) => Self::ServiceCall,
            Request::Ping => Self::Ping,
        }
    }
}

/// An in-flight request.
#[derive(Debug)]
pub struct Pending {
    kind: RequestKind,
    waiter: oneshot::Sender<ResultFrame>,
}

impl Pending {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Hands the result to whoever is waiting; nobody waiting is fine.
    pub fn complete(self, result: ResultFrame) {
        let _ = self.waiter.send(result);
    }
}

#[derive(Debug)]
pub struct Correlator {
    next_id: u64,
    pending: HashMap<u64, Pending>,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            pending: HashMap::new(),
        }
    }

    /// Allocates the next id and records what it is for.
    pub fn register(&mut self, kind: RequestKind) -> (u64, oneshot::Receiver<ResultFrame>) {
        let id = self.next_id;
        self.next_id += 1;
        let (waiter, rx) = oneshot::channel();
        self.pending.insert(id, Pending { kind, waiter });
        (id, rx)
    }

    /// Removes and returns the pending entry for `id`, if any.
    pub fn resolve(&mut self, id: u64) -> Option<Pending> {
        self.pending.remove(&id)
    }

    /// Drops every pending entry; their waiters see the connection close.
    pub fn fail_all(&mut self) {
        self.pending.clear();
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

/// Handle for a request that has been written to the socket.
#[derive(Debug)]
pub struct PendingReply {
    pub id: u64,
    rx: oneshot::Receiver<ResultFrame>,
    correlator: Arc<Mutex<Correlator>>,
}

impl PendingReply {
    /// Waits for the matching result frame.
    pub async fn wait(self, timeout: Duration) -> Result<ResultFrame, HubError> {
        let result = tokio::time::timeout(timeout, self.rx).await;

        // Clean up pending entry on any exit path.
        self.correlator.lock().await.resolve(self.id);

        match result {
            Ok(Ok(frame)) if frame.success => Ok(frame),
            Ok(Ok(frame)) => {
                let error = frame.error.unwrap_or_else(|| hassbridge_protocol::HubErrorInfo {
                    code: "unknown_error".into(),
                    message: String::new(),
                });
                Err(HubError::Rejected {
                    code: error.code,
                    message: error.message,
                })
            }
            Ok(Err(_)) => Err(HubError::Closed),
            Err(_) => Err(HubError::Timeout),
        }
    }
}

/// Outbound side of one connection: stamps ids and queues frames on the
/// serialized write channel.
#[derive(Clone)]
pub(crate) struct Requester {
    write_tx: mpsc::Sender<tungstenite::Message>,
    correlator: Arc<Mutex<Correlator>>,
}

impl Requester {
    pub(crate) fn new(write_tx: mpsc::Sender<tungstenite::Message>) -> Self {
        Self {
            write_tx,
            correlator: Arc::new(Mutex::new(Correlator::new())),
        }
    }

    pub(crate) fn correlator(&self) -> &Arc<Mutex<Correlator>> {
        &self.correlator
    }

    /// Sends the handshake frame.
    pub(crate) async fn authenticate(&self, access_token: &str) -> Result<(), HubError> {
        let frame = AuthFrame {
            access_token: access_token.to_string(),
        };
        let json = serde_json::to_string(&frame)?;
        self.write_tx
            .send(tungstenite::Message::Text(json.into()))
            .await
            .map_err(|_| HubError::Closed)
    }

    /// Assigns an id, records the request kind and queues the frame.
    pub(crate) async fn send(&self, request: Request) -> Result<PendingReply, HubError> {
        let kind = RequestKind::of(&request);
        let (id, rx) = self.correlator.lock().await.register(kind);

        let json = match RequestFrame::new(id, request).to_text() {
            Ok(json) => json,
            Err(e) => {
                self.correlator.lock().await.resolve(id);
                return Err(e.into());
            }
        };

        if self
            .write_tx
            .send(tungstenite::Message::Text(json.into()))
            .await
            .is_err()
        {
            self.correlator.lock().await.resolve(id);
            return Err(HubError::Closed);
        }

        trace!(id, kind = ?kind, "request queued");
        Ok(PendingReply {
            id,
            rx,
            correlator: self.correlator.clone(),
        })
    }
}
