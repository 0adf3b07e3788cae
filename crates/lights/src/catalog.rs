//! Device classes and the light templates new records are built from.

use std::fmt;

use serde_json::json;

use hassbridge_protocol::Attributes;

const SUPPORT_BRIGHTNESS: u32 = 1;
const SUPPORT_COLOR_TEMP: u32 = 2;
const SUPPORT_COLOR: u32 = 16;

/// Bridge device class of a hub light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Rgb,
    WhiteAmbiance,
    Dimmable,
    Switch,
}

impl DeviceClass {
    /// Highest capability the light advertises: color, then color
    /// temperature, then brightness.
    ///
    /// The legacy `supported_features` bits are checked first; hubs that
    /// dropped them still list `supported_color_modes`.
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let features = attributes.supported_features();
        let modes = attributes.supported_color_modes();
        let has_mode = |wanted: &[&str]| {
            modes
                .iter()
                .any(|m| wanted.contains(&m.to_ascii_lowercase().as_str()))
        };

        if features & SUPPORT_COLOR != 0 || has_mode(&["hs", "xy", "rgb", "rgbw", "rgbww"]) {
            Self::Rgb
        } else if features & SUPPORT_COLOR_TEMP != 0 || has_mode(&["color_temp"]) {
            Self::WhiteAmbiance
        } else if features & SUPPORT_BRIGHTNESS != 0 || has_mode(&["brightness", "white"]) {
            Self::Dimmable
        } else {
            Self::Switch
        }
    }

    pub fn model_id(self) -> &'static str {
        match self {
            Self::Rgb => "HomeAssistant-RGB",
            Self::WhiteAmbiance => "HomeAssistant-WhiteAmbiance",
            Self::Dimmable => "HomeAssistant-Dimmable",
            Self::Switch => "HomeAssistant-Switch",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_id())
    }
}

/// Defaults copied into a new device record.
#[derive(Debug, Clone, PartialEq)]
pub struct LightTemplate {
    pub light_type: String,
    pub swversion: String,
    pub state: serde_json::Value,
}

/// Source of light templates keyed by model id.
pub trait LightTypeCatalog: Send + Sync {
    fn template(&self, model_id: &str) -> Option<LightTemplate>;
}

/// Templates for the four device classes this adapter produces.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

const SWVERSION: &str = "1.0.0";

impl LightTypeCatalog for BuiltinCatalog {
    fn template(&self, model_id: &str) -> Option<LightTemplate> {
        let (light_type, state) = match model_id {
            "HomeAssistant-RGB" => (
                "Extended color light",
                json!({
                    "on": false, "bri": 254, "hue": 0, "sat": 0, "xy": [0.3127, 0.329],
                    "ct": 366, "alert": "none", "effect": "none", "colormode": "xy",
                    "reachable": true
                }),
            ),
            "HomeAssistant-WhiteAmbiance" => (
                "Color temperature light",
                json!({
                    "on": false, "bri": 254, "ct": 366, "alert": "none",
                    "colormode": "ct", "reachable": true
                }),
            ),
            "HomeAssistant-Dimmable" => (
                "Dimmable light",
                json!({"on": false, "bri": 254, "alert": "none", "reachable": true}),
            ),
            "HomeAssistant-Switch" => (
                "On/Off plug-in unit",
                json!({"on": false, "alert": "none", "reachable": true}),
            ),
            _ => return None,
        };
        Some(LightTemplate {
            light_type: light_type.to_string(),
            swversion: SWVERSION.to_string(),
            state,
        })
    }
}
