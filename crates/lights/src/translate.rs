//! Translation between hub entities and bridge light state.

use hassbridge_protocol::constants::LIGHT_DOMAIN;
use hassbridge_protocol::{Entity, EntityStatus, ServiceCall};

use crate::color::hsv_to_rgb;
use crate::error::LightsError;
use crate::types::{ColorMode, LightCommand, LightServiceData, LightState};

/// Brightness assumed for color conversion when the light reports none.
const FALLBACK_BRI: u8 = 254;
const FALLBACK_SAT: u8 = 254;

/// Bridge view of a cached hub entity.
///
/// Only `on`/`off` are reachable. An `off` light reports nothing else; an
/// `on` light carries whatever brightness and color attributes the hub
/// sent, with `xy` taking the color mode over `ct`.
pub fn to_local(entity: &Entity) -> LightState {
    match entity.state {
        EntityStatus::On => {}
        EntityStatus::Off => {
            return LightState {
                reachable: true,
                on: Some(false),
                ..LightState::default()
            };
        }
        _ => return LightState::unreachable(),
    }

    let attributes = &entity.attributes;
    let mut state = LightState {
        reachable: true,
        on: Some(true),
        bri: attributes.brightness(),
        ..LightState::default()
    };
    if let Some(ct) = attributes.color_temp() {
        state.ct = Some(ct);
        state.colormode = Some(ColorMode::Ct);
    }
    if let Some(xy) = attributes.xy_color() {
        state.xy = Some(xy);
        state.colormode = Some(ColorMode::Xy);
    }
    state
}

enum ColorTarget {
    Temperature(u16),
    Xy([f64; 2]),
    Rgb([u8; 3]),
}

/// Builds the hub service call for a bridge command.
///
/// An explicit `on` in the command decides the service; without one the
/// light stays on only if `current` says it is on. Hue/sat become
/// `rgb_color` at the light's current brightness, and only one color
/// representation is sent: rgb over xy over ct.
pub fn to_service_call(
    entity_id: &str,
    current: &LightState,
    command: &LightCommand,
) -> Result<ServiceCall, LightsError> {
    let turn_on = command.on.unwrap_or(current.on == Some(true));
    let service = if turn_on { "turn_on" } else { "turn_off" };

    let mut color = None;
    if let Some(ct) = command.ct {
        color = Some(ColorTarget::Temperature(ct));
    }
    if let Some(xy) = command.xy {
        color = Some(ColorTarget::Xy(xy));
    }
    if command.hue.is_some() || command.sat.is_some() {
        let hue = command.hue.or(current.hue).unwrap_or(0);
        let sat = command.sat.or(current.sat).unwrap_or(FALLBACK_SAT);
        let bri = current.bri.unwrap_or(FALLBACK_BRI);
        color = Some(ColorTarget::Rgb(hsv_to_rgb(hue, sat, bri)));
    }

    let mut data = LightServiceData {
        entity_id: entity_id.to_string(),
        brightness: command.bri,
        alert: command.alert.clone(),
        transition: command.transitiontime.map(|t| f64::from(t) / 10.0),
        ..LightServiceData::default()
    };
    match color {
        Some(ColorTarget::Temperature(ct)) => data.color_temp = Some(ct),
        Some(ColorTarget::Xy(xy)) => data.xy_color = Some(xy),
        Some(ColorTarget::Rgb(rgb)) => data.rgb_color = Some(rgb),
        None => {}
    }

    Ok(ServiceCall {
        domain: LIGHT_DOMAIN.to_string(),
        service: service.to_string(),
        service_data: serde_json::to_value(&data)?,
    })
}
