//! Light adapter facade: read, write and discovery entry points.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use hassbridge_protocol::constants::STATE_FETCH_TIMEOUT;

use crate::catalog::LightTypeCatalog;
use crate::discovery::register_new_lights;
use crate::error::LightsError;
use crate::hub::HubLink;
use crate::registry::LightRegistry;
use crate::translate::{to_local, to_service_call};
use crate::types::{LightAddress, LightCommand, LightState, NewLight};

/// Drives bridge lights backed by hub entities.
pub struct HassLights {
    hub: Arc<dyn HubLink>,
    fetch_timeout: Duration,
}

impl HassLights {
    pub fn new(hub: Arc<dyn HubLink>) -> Self {
        Self {
            hub,
            fetch_timeout: STATE_FETCH_TIMEOUT,
        }
    }

    /// Overrides how long discovery waits for the state dump.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Current state of the light at `address`, from the cache.
    ///
    /// Also (re)opens the hub connection when it is down, so a light that
    /// reads unreachable now can recover on a later poll.
    pub async fn get_light_state(&self, address: &LightAddress) -> LightState {
        self.hub.ensure_connected().await;
        match self.hub.latest_state(&address.entity_id).await {
            Some(entity) => to_local(&entity),
            None => LightState::unreachable(),
        }
    }

    /// Sends `command` to the light at `address`. Returns the request id;
    /// the hub's acknowledgement is not awaited.
    pub async fn set_light(
        &self,
        address: &LightAddress,
        current: &LightState,
        command: &LightCommand,
    ) -> Result<u64, LightsError> {
        if !address.is_hass() {
            return Err(LightsError::ForeignAddress(address.protocol.clone()));
        }
        let call = to_service_call(&address.entity_id, current, command)?;
        debug!(entity = %address.entity_id, service = %call.service, "setting light");
        Ok(self.hub.call_service(call).await?)
    }

    /// Refreshes the hub's states and registers every admitted light not
    /// yet in `registry`.
    pub async fn discover(
        &self,
        registry: &mut dyn LightRegistry,
        catalog: &dyn LightTypeCatalog,
    ) -> Result<Vec<NewLight>, LightsError> {
        info!("light discovery started");
        self.hub.refresh_states(self.fetch_timeout).await?;
        let entities = self.hub.discovered_entities().await;
        let added = register_new_lights(&entities, registry, catalog);
        info!(found = entities.len(), added = added.len(), "light discovery complete");
        Ok(added)
    }
}
