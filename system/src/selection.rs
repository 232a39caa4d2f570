use crate::message::*;
use crate::registry::MaterializationRegistry;
use crate::traits::Renderer;
use crate::types::{Bounds, PickResult};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SelectionState {
    Idle,
    Holding { object_id: ObjectId },
}

/// Drag-to-send state of the local participant.
///
/// `committed` keeps commit order and never holds an id twice.
pub struct Selection {
    owner: ParticipantId,
    state: SelectionState,
    committed: Vec<ObjectId>,
}

impl Selection {
    pub fn new(owner: ParticipantId) -> Self {
        Self {
            owner,
            state: SelectionState::Idle,
            committed: Vec::new(),
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_holding(&self) -> bool {
        matches!(self.state, SelectionState::Holding { .. })
    }

    pub fn committed(&self) -> &[ObjectId] {
        &self.committed
    }

    pub fn has_pending(&self) -> bool {
        !self.committed.is_empty()
    }

    /// Picks up the hit object when it is one of the owner's shapes.
    pub fn pointer_down(&mut self, pick: &PickResult, registry: &MaterializationRegistry) -> bool {
        if self.is_holding() {
            log::debug!("Pointer down while holding, ignored");
            return false;
        }
        let object_id = match (pick.hit, &pick.picked_id) {
            (true, Some(object_id)) => object_id,
            _ => return false,
        };
        if !registry.contains(&self.owner, object_id) {
            log::trace!("Picked {} is not an owned shape", object_id);
            return false;
        }
        log::debug!("Picked shape {}", object_id);
        self.state = SelectionState::Holding {
            object_id: object_id.clone(),
        };
        true
    }

    /// Drags the held object to where the pick ray meets the ground.
    pub fn pointer_move(
        &mut self,
        pick: &PickResult,
        registry: &mut MaterializationRegistry,
        renderer: &mut dyn Renderer,
    ) {
        if let SelectionState::Holding { object_id } = &self.state {
            if pick.hit {
                registry.move_to(renderer, &self.owner, object_id, pick.picked_point);
            }
        }
    }

    /// Releases the held object, committing it when it overlaps the send
    /// zone. Returns the new pending flag when it changed.
    pub fn pointer_up(
        &mut self,
        registry: &MaterializationRegistry,
        send_zone: &Bounds,
    ) -> Option<bool> {
        let object_id = match std::mem::replace(&mut self.state, SelectionState::Idle) {
            SelectionState::Holding { object_id } => object_id,
            SelectionState::Idle => return None,
        };
        let visual = match registry.get(&self.owner, &object_id) {
            Some(visual) => visual,
            None => {
                log::warn!("Held shape {} is gone. Releasing.", object_id);
                return None;
            }
        };
        if visual.kind.bounds_at(visual.position).intersects(send_zone) {
            log::info!("Shape {} inside send zone", object_id);
            self.commit(object_id)
        } else {
            None
        }
    }

    /// Adds `object_id` unless it is already committed. Returns the new
    /// pending flag when it changed.
    pub fn commit(&mut self, object_id: ObjectId) -> Option<bool> {
        if self.committed.contains(&object_id) {
            log::debug!("Shape {} already selected", object_id);
            return None;
        }
        let was_pending = self.has_pending();
        self.committed.push(object_id);
        log::debug!("Selection: {:?}", self.committed);
        if was_pending {
            None
        } else {
            Some(true)
        }
    }

    /// Empties the selection. Returns `Some(false)` when something was pending.
    pub fn clear(&mut self) -> Option<bool> {
        if self.committed.is_empty() {
            return None;
        }
        self.committed.clear();
        Some(false)
    }

    /// Drops the held reference and the commits that are no longer materialized.
    pub fn release_missing(&mut self, registry: &MaterializationRegistry) -> Option<bool> {
        if let SelectionState::Holding { object_id } = &self.state {
            if !registry.contains(&self.owner, object_id) {
                self.state = SelectionState::Idle;
            }
        }
        let was_pending = self.has_pending();
        let owner = &self.owner;
        self.committed
            .retain(|object_id| registry.contains(owner, object_id));
        if was_pending && !self.has_pending() {
            Some(false)
        } else {
            None
        }
    }
}
