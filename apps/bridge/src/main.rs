//! hassbridge entry point.
//!
//! Mirrors Home Assistant lights as bridge lights: discovers them once at
//! startup, then polls their cached state until interrupted.

mod config;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use hassbridge_hub_connection::{ConnectionState, HubConnection};
use hassbridge_lights::{BuiltinCatalog, HassLights, LightState, MemoryRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting hassbridge"
    );

    let bridge_config = match config::BridgeConfig::load() {
        Ok(c) => {
            tracing::info!(hub = %c.hub.websocket_url(), "configuration loaded");
            c
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            config::BridgeConfig::default()
        }
    };
    if bridge_config.hub.access_token.is_empty() {
        tracing::warn!("no access token configured, the hub will reject the connection");
    }

    let hub = Arc::new(HubConnection::new(bridge_config.hub.clone()));
    let lights = HassLights::new(hub.clone());
    let mut registry = MemoryRegistry::new();

    let watcher = tokio::spawn(log_state_changes(hub.watch_state()));

    if bridge_config.discover_on_start {
        match lights.discover(&mut registry, &BuiltinCatalog).await {
            Ok(added) => {
                for light in &added {
                    tracing::info!(id = %light.id, name = %light.name, "light available");
                }
            }
            Err(e) => tracing::warn!(error = %e, "light discovery failed"),
        }
    }

    let period = Duration::from_secs(bridge_config.poll_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    let mut last: HashMap<String, LightState> = HashMap::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
            _ = ticker.tick() => {
                poll_lights(&lights, &registry, &mut last).await;
            }
        }
    }

    hub.close().await;
    watcher.abort();
    Ok(())
}

/// Reads every registered light and logs the ones whose state moved.
async fn poll_lights(
    lights: &HassLights,
    registry: &MemoryRegistry,
    last: &mut HashMap<String, LightState>,
) {
    for (id, address) in registry.addresses() {
        let state = lights.get_light_state(address).await;
        if last.get(id) != Some(&state) {
            match serde_json::to_string(&state) {
                Ok(json) => tracing::info!(id, entity = %address.entity_id, state = %json, "light state"),
                Err(e) => tracing::debug!(id, error = %e, "unprintable light state"),
            }
            last.insert(id.to_string(), state);
        }
    }
}

async fn log_state_changes(mut rx: watch::Receiver<ConnectionState>) {
    while rx.changed().await.is_ok() {
        let state = *rx.borrow_and_update();
        tracing::info!(%state, "hub connection");
    }
}
