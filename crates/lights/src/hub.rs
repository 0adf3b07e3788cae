//! The slice of the hub connection the light adapter depends on.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use hassbridge_hub_connection::{HubConnection, HubError};
use hassbridge_protocol::{Entity, ServiceCall};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Abstract hub connection.
///
/// [`HubConnection`] implements this; tests substitute a canned one.
pub trait HubLink: Send + Sync {
    /// Opens a connection if none is live. Never fails.
    fn ensure_connected(&self) -> BoxFuture<'_, ()>;

    /// Fetches all states and waits until they are cached.
    fn refresh_states(&self, timeout: Duration) -> BoxFuture<'_, Result<usize, HubError>>;

    /// Entities found by the last bulk fetch.
    fn discovered_entities(&self) -> BoxFuture<'_, Vec<Entity>>;

    /// Latest cached snapshot of one entity.
    fn latest_state<'a>(&'a self, entity_id: &'a str) -> BoxFuture<'a, Option<Entity>>;

    /// Queues a service call, returning its request id.
    fn call_service(&self, call: ServiceCall) -> BoxFuture<'_, Result<u64, HubError>>;
}

impl HubLink for HubConnection {
    fn ensure_connected(&self) -> BoxFuture<'_, ()> {
        Box::pin(HubConnection::ensure_connected(self))
    }

    fn refresh_states(&self, timeout: Duration) -> BoxFuture<'_, Result<usize, HubError>> {
        Box::pin(HubConnection::refresh_states(self, timeout))
    }

    fn discovered_entities(&self) -> BoxFuture<'_, Vec<Entity>> {
        Box::pin(HubConnection::discovered_entities(self))
    }

    fn latest_state<'a>(&'a self, entity_id: &'a str) -> BoxFuture<'a, Option<Entity>> {
        Box::pin(HubConnection::latest_state(self, entity_id))
    }

    fn call_service(&self, call: ServiceCall) -> BoxFuture<'_, Result<u64, HubError>> {
        Box::pin(HubConnection::call_service(self, call))
    }
}
