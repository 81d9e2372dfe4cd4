use bevy::prelude::*;

/// The block the next "upgrade selected" request applies to.
///
/// Holds the entity id only. Nothing checks liveness here; an upgrade on a
/// block that is gone is rejected as `TargetNotFound`.
#[derive(Resource, Default, Debug, Clone, PartialEq, Eq)]
pub struct Selection(Option<Entity>);

impl Selection {
    pub fn select(&mut self, block: Entity) {
        self.0 = Some(block);
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn current(&self) -> Option<Entity> {
        self.0
    }
}
