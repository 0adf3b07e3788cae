//! Inclusion policy deciding which hub entities are mirrored.

use tracing::trace;

use hassbridge_protocol::Entity;
use hassbridge_protocol::constants::{EXCLUDE_FLAG, INCLUDE_FLAG};

/// Gate applied to both the bulk fetch and every state change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InclusionPolicy {
    pub include_by_default: bool,
}

impl InclusionPolicy {
    pub fn new(include_by_default: bool) -> Self {
        Self { include_by_default }
    }

    /// Applies the per-entity `diyhue` override on top of the default.
    ///
    /// With inclusion on by default only `"exclude"` opts out; with it off
    /// only `"include"` opts in. Any other value counts as absent.
    pub fn should_include(&self, entity: &Entity) -> bool {
        let flag = entity.attributes.inclusion_flag();
        let included = if self.include_by_default {
            flag != Some(EXCLUDE_FLAG)
        } else {
            flag == Some(INCLUDE_FLAG)
        };
        trace!(
            entity = %entity.entity_id,
            included,
            include_by_default = self.include_by_default,
            flag = ?flag,
            "inclusion decision"
        );
        included
    }

    /// Light-domain entities that pass [`should_include`](Self::should_include).
    pub fn admits(&self, entity: &Entity) -> bool {
        entity.is_light() && self.should_include(entity)
    }
}
