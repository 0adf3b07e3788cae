//! Light adapter on top of the hub connection.
//!
//! Translates cached hub entities into bridge-local light state, bridge
//! commands into hub service calls, and discovered hub lights into new
//! device records. The registry and template catalog are traits so the
//! caller decides where lights are stored.
//!
//! # Operations
//!
//! - **Read**: [`HassLights::get_light_state`]
//! - **Write**: [`HassLights::set_light`]
//! - **Discover**: [`HassLights::discover`]

pub mod catalog;
pub mod color;
pub mod discovery;
pub mod error;
pub mod hub;
pub mod lights;
pub mod registry;
pub mod translate;
pub mod types;

// Re-export primary types for convenience.
pub use catalog::{BuiltinCatalog, DeviceClass, LightTemplate, LightTypeCatalog};
pub use color::hsv_to_rgb;
pub use discovery::register_new_lights;
pub use error::LightsError;
pub use hub::HubLink;
pub use lights::HassLights;
pub use registry::{LightRegistry, MemoryRegistry};
pub use translate::{to_local, to_service_call};
pub use types::{
    ColorMode, DeviceRecord, LightAddress, LightCommand, LightServiceData, LightState, NewLight,
};
