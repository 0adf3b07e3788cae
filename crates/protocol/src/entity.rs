use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{INCLUSION_ATTRIBUTE, LIGHT_DOMAIN};

/// Status string of an entity, with the values this bridge cares about
/// pulled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityStatus {
    On,
    Off,
    Unavailable,
    /// Any other status (`unknown`, numeric sensor values, ...).
    Other(String),
}

impl EntityStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Unavailable => "unavailable",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for EntityStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "on" => Self::On,
            "off" => Self::Off,
            "unavailable" => Self::Unavailable,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for EntityStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<EntityStatus> for String {
    fn from(status: EntityStatus) -> Self {
        match status {
            EntityStatus::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open-ended entity attributes with typed accessors for the keys the
/// bridge reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(serde_json::Map<String, serde_json::Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }

    /// Brightness on the hub's 0-255 scale.
    pub fn brightness(&self) -> Option<u8> {
        self.number("brightness")
            .map(|v| v.round().clamp(0.0, 255.0) as u8)
    }

    /// Color temperature in mireds.
    pub fn color_temp(&self) -> Option<u16> {
        self.number("color_temp")
            .map(|v| v.round().clamp(0.0, u16::MAX as f64) as u16)
    }

    pub fn xy_color(&self) -> Option<[f64; 2]> {
        self.pair("xy_color")
    }

    /// Capability bitmask; zero when the hub does not report one.
    pub fn supported_features(&self) -> u32 {
        self.get("supported_features")
            .and_then(serde_json::Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0)
    }

    pub fn supported_color_modes(&self) -> Vec<String> {
        self.get("supported_color_modes")
            .and_then(serde_json::Value::as_array)
            .map(|modes| {
                modes
                    .iter()
                    .filter_map(|m| m.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.get("friendly_name").and_then(serde_json::Value::as_str)
    }

    /// Raw value of the inclusion override attribute, if it is a string.
    pub fn inclusion_flag(&self) -> Option<&str> {
        self.get(INCLUSION_ATTRIBUTE)
            .and_then(serde_json::Value::as_str)
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(serde_json::Value::as_f64)
    }

    fn pair(&self, key: &str) -> Option<[f64; 2]> {
        let arr = self.get(key)?.as_array()?;
        match arr.as_slice() {
            [a, b, ..] => Some([a.as_f64()?, b.as_f64()?]),
            _ => None,
        }
    }
}

/// One hub entity as returned by `get_states` or carried in a
/// `state_changed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: String,
    pub state: EntityStatus,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Entity {
    pub fn new(entity_id: impl Into<String>, state: impl Into<EntityStatus>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Attributes::new(),
            last_changed: None,
            last_updated: None,
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key, value);
        self
    }

    pub fn is_light(&self) -> bool {
        is_light_id(&self.entity_id)
    }
}

/// Returns `true` for entity ids in the light domain.
pub fn is_light_id(entity_id: &str) -> bool {
    entity_id
        .split_once('.')
        .is_some_and(|(domain, _)| domain == LIGHT_DOMAIN)
}

/// Body of an `event` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// `data` of a `state_changed` event. `new_state` is `null` when the
/// entity was removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChangedData {
    pub entity_id: String,
    #[serde(default)]
    pub new_state: Option<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_state: Option<Entity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_from_string() {
        assert_eq!(EntityStatus::from("on"), EntityStatus::On);
        assert_eq!(EntityStatus::from("off"), EntityStatus::Off);
        assert_eq!(EntityStatus::from("unavailable"), EntityStatus::Unavailable);
        assert_eq!(
            EntityStatus::from("unknown"),
            EntityStatus::Other("unknown".into())
        );
    }

    #[test]
    fn status_serializes_as_plain_string() {
        assert_eq!(serde_json::to_value(EntityStatus::On).unwrap(), json!("on"));
        assert_eq!(
            serde_json::to_value(EntityStatus::Other("unknown".into())).unwrap(),
            json!("unknown")
        );
    }

    #[test]
    fn parses_hub_state() {
        let entity: Entity = serde_json::from_value(json!({
            "entity_id": "light.my_light",
            "state": "on",
            "attributes": {
                "min_mireds": 153,
                "brightness": 254,
                "hs_color": [291.687, 65.098],
                "xy_color": [0.348, 0.168],
                "friendly_name": "My Light",
                "supported_features": 63
            },
            "last_changed": "2019-01-09T10:35:39.148462+00:00",
            "last_updated": "2019-01-09T10:35:39.148462+00:00",
            "context": {"id": "X", "parent_id": null, "user_id": null}
        }))
        .unwrap();

        assert_eq!(entity.state, EntityStatus::On);
        assert!(entity.is_light());
        assert_eq!(entity.attributes.brightness(), Some(254));
        assert_eq!(entity.attributes.xy_color(), Some([0.348, 0.168]));
        assert_eq!(entity.attributes.friendly_name(), Some("My Light"));
        assert_eq!(entity.attributes.supported_features(), 63);
        assert!(entity.last_changed.is_some());
    }

    #[test]
    fn missing_attributes_default_to_empty() {
        let entity: Entity =
            serde_json::from_value(json!({"entity_id": "light.a", "state": "off"})).unwrap();
        assert_eq!(entity.attributes, Attributes::new());
        assert_eq!(entity.attributes.supported_features(), 0);
        assert_eq!(entity.attributes.brightness(), None);
    }

    #[test]
    fn inclusion_flag_only_reads_strings() {
        let entity = Entity::new("light.a", "on").with_attribute("diyhue", json!("include"));
        assert_eq!(entity.attributes.inclusion_flag(), Some("include"));

        let entity = Entity::new("light.a", "on").with_attribute("diyhue", json!(true));
        assert_eq!(entity.attributes.inclusion_flag(), None);
    }

    #[test]
    fn light_domain_check() {
        assert!(Entity::new("light.kitchen", "on").is_light());
        assert!(!Entity::new("switch.fan", "on").is_light());
        assert!(!Entity::new("sensor.temp", "21").is_light());
        assert!(!Entity::new("bogus", "on").is_light());
        assert!(!is_light_id("lights.kitchen"));
    }

    #[test]
    fn color_modes_list() {
        let entity = Entity::new("light.a", "on")
            .with_attribute("supported_color_modes", json!(["color_temp", "hs"]));
        assert_eq!(
            entity.attributes.supported_color_modes(),
            vec!["color_temp".to_string(), "hs".to_string()]
        );
    }

    #[test]
    fn state_changed_with_removed_entity() {
        let data: StateChangedData = serde_json::from_value(json!({
            "entity_id": "light.gone",
            "old_state": {"entity_id": "light.gone", "state": "on"},
            "new_state": null
        }))
        .unwrap();
        assert!(data.new_state.is_none());
        assert!(data.old_state.is_some());
    }
}
