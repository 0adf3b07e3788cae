//! Latest known state per mirrored entity, plus the set of entities found
//! by the bulk fetch since the last connection reset.

use std::collections::{BTreeSet, HashMap};

use hassbridge_protocol::{Entity, EntityStatus};

#[derive(Debug, Default)]
pub struct StateCache {
    states: HashMap<String, Entity>,
    discovered: BTreeSet<String>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an entity returned by the bulk fetch; it becomes
    /// discoverable.
    pub fn seed(&mut self, entity: Entity) {
        self.discovered.insert(entity.entity_id.clone());
        self.states.insert(entity.entity_id.clone(), entity);
    }

    /// Records a state pushed by the subscription.
    pub fn update(&mut self, entity: Entity) {
        self.states.insert(entity.entity_id.clone(), entity);
    }

    /// Marks an entity the hub reported as removed.
    pub fn mark_unavailable(&mut self, entity_id: &str) {
        if let Some(entity) = self.states.get_mut(entity_id) {
            entity.state = EntityStatus::Unavailable;
        }
    }

    /// Connection reset: forget what was discovered and stop serving the
    /// remaining snapshots as live. Attributes are kept.
    pub fn invalidate(&mut self) {
        self.discovered.clear();
        for entity in self.states.values_mut() {
            entity.state = EntityStatus::Unavailable;
        }
    }

    pub fn get(&self, entity_id: &str) -> Option<&Entity> {
        self.states.get(entity_id)
    }

    /// Current snapshots of the discovered entities, ordered by id.
    pub fn discovered(&self) -> Vec<Entity> {
        self.discovered
            .iter()
            .filter_map(|id| self.states.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn discovered_len(&self) -> usize {
        self.discovered.len()
    }
}
