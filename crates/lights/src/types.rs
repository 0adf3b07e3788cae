//! Domain types for the light adapter.

use serde::{Deserialize, Serialize};

/// Protocol tag stored in every address this adapter owns.
pub const PROTOCOL: &str = "homeassistant_ws";

/// Manufacturer reported for every light created by discovery.
pub const MANUFACTURER: &str = "Home Assistant";

/// Which color representation a light state reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Ct,
    Xy,
}

/// Bridge-local light state. Unset fields are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    pub reachable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ct: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xy: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sat: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colormode: Option<ColorMode>,
}

impl LightState {
    /// Exactly `{reachable: false}`.
    pub fn unreachable() -> Self {
        Self::default()
    }
}

/// A state change requested by a bridge client.
///
/// `hue` is on the 0-65535 wheel, `sat` and `bri` on 0-254,
/// `transitiontime` in deciseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ct: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xy: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sat: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transitiontime: Option<u16>,
}

/// `service_data` of a `light.turn_on` / `light.turn_off` call.
///
/// At most one of the three color fields is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightServiceData {
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_temp: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xy_color: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rgb_color: Option<[u8; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<f64>,
}

/// Back-reference from a bridge light to the hub entity driving it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LightAddress {
    pub protocol: String,
    pub entity_id: String,
}

impl LightAddress {
    /// Address of a hub entity under this adapter's protocol.
    pub fn hass(entity_id: impl Into<String>) -> Self {
        Self {
            protocol: PROTOCOL.to_string(),
            entity_id: entity_id.into(),
        }
    }

    pub fn is_hass(&self) -> bool {
        self.protocol == PROTOCOL
    }
}

/// A light as stored by the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub state: serde_json::Value,
    #[serde(rename = "type")]
    pub light_type: String,
    pub name: String,
    pub uniqueid: String,
    pub modelid: String,
    pub manufacturername: String,
    pub swversion: String,
}

/// A light registered by a discovery pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLight {
    pub id: String,
    pub name: String,
}
