//! Registration of discovered hub lights as bridge device records.

use tracing::{info, warn};

use hassbridge_protocol::Entity;

use crate::catalog::{DeviceClass, LightTypeCatalog};
use crate::registry::LightRegistry;
use crate::types::{DeviceRecord, LightAddress, MANUFACTURER, NewLight};

/// Adds every entity not yet bound to a bridge light.
///
/// Entities already registered under this adapter's protocol are skipped,
/// so repeated passes never duplicate a light.
pub fn register_new_lights(
    entities: &[Entity],
    registry: &mut dyn LightRegistry,
    catalog: &dyn LightTypeCatalog,
) -> Vec<NewLight> {
    let mut added = Vec::new();

    for entity in entities {
        let address = LightAddress::hass(&entity.entity_id);
        if registry.is_registered(&address) {
            continue;
        }

        let name = entity
            .attributes
            .friendly_name()
            .unwrap_or(entity.entity_id.as_str())
            .to_string();
        let class = DeviceClass::from_attributes(&entity.attributes);
        let Some(template) = catalog.template(class.model_id()) else {
            warn!(entity = %entity.entity_id, model = %class, "no light template, skipping");
            continue;
        };

        let id = registry.next_free_id();
        info!(id = %id, entity = %entity.entity_id, name = %name, model = %class, "adding light");
        let record = DeviceRecord {
            state: template.state,
            light_type: template.light_type,
            name: name.clone(),
            uniqueid: pseudo_unique_id(),
            modelid: class.model_id().to_string(),
            manufacturername: MANUFACTURER.to_string(),
            swversion: template.swversion,
        };
        registry.insert(id.clone(), record, address);
        added.push(NewLight { id, name });
    }

    added
}

/// MAC-style id in the bridge's `xx:xx:xx:xx:xx:xx-1` shape.
fn pseudo_unique_id() -> String {
    let id = uuid::Uuid::new_v4();
    let b = id.as_bytes();
    format!("4a:e0:ad:{:02x}:{:02x}:{:02x}-1", b[0], b[1], b[2])
}
