use crate::config::Zone;
use crate::message::*;
use crate::traits::Renderer;
use crate::types::{GroundPoint, Position, VisualHandle};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    pub handle: VisualHandle,
    pub kind: ShapeKind,
    pub position: Position,
}

/// Local visual representations, namespaced by owning participant.
///
/// An object id appears at most once per owner. Everything that creates or
/// destroys a visual goes through here, so the owned set of a participant and
/// what the renderer shows stay in step.
pub struct MaterializationRegistry {
    visuals: HashMap<ParticipantId, HashMap<ObjectId, Visual>>,
    receive_area: Zone,
    rng: Box<dyn RngCore + Send>,
}

impl MaterializationRegistry {
    pub fn new(receive_area: Zone) -> Self {
        Self::with_rng(receive_area, StdRng::from_entropy())
    }

    pub fn with_rng<G: RngCore + Send + 'static>(receive_area: Zone, rng: G) -> Self {
        Self {
            visuals: HashMap::new(),
            receive_area,
            rng: Box::new(rng),
        }
    }

    pub fn contains(&self, owner: &ParticipantId, object_id: &ObjectId) -> bool {
        self.get(owner, object_id).is_some()
    }

    pub fn get(&self, owner: &ParticipantId, object_id: &ObjectId) -> Option<&Visual> {
        self.visuals
            .get(owner)
            .and_then(|visuals| visuals.get(object_id))
    }

    /// Sorted, so callers can compare views.
    pub fn owned_object_ids(&self, owner: &ParticipantId) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self
            .visuals
            .get(owner)
            .map(|visuals| visuals.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn owners(&self) -> impl Iterator<Item = &ParticipantId> + '_ {
        self.visuals
            .iter()
            .filter(|(_, visuals)| !visuals.is_empty())
            .map(|(owner, _)| owner)
    }

    pub fn len(&self) -> usize {
        self.visuals.values().map(|visuals| visuals.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Places `object_id` for `owner` at a fixed position. Returns `false`
    /// when it is already there.
    pub fn place(
        &mut self,
        renderer: &mut dyn Renderer,
        owner: &ParticipantId,
        object_id: &ObjectId,
        kind: ShapeKind,
        position: Position,
    ) -> bool {
        if self.contains(owner, object_id) {
            log::warn!(
                "Shape {} already exists for participant {}. Skipping.",
                object_id,
                owner
            );
            return false;
        }
        let handle = renderer.materialize(object_id, kind, position);
        self.visuals.entry(owner.clone()).or_default().insert(
            object_id.clone(),
            Visual {
                handle,
                kind,
                position,
            },
        );
        true
    }

    /// Idempotent. Uses the descriptor's kind, or the default kind when the
    /// descriptor is not known yet, at a random spot in the receive area.
    pub fn materialize(
        &mut self,
        renderer: &mut dyn Renderer,
        owner: &ParticipantId,
        object_id: &ObjectId,
        descriptor: Option<&ObjectDescriptor>,
    ) -> bool {
        if self.contains(owner, object_id) {
            log::warn!(
                "Duplicate materialization of {} for {}. Skipping.",
                object_id,
                owner
            );
            return false;
        }
        let kind = descriptor.map(|d| d.kind).unwrap_or_default();
        let position = self.receive_area.random_position(&mut *self.rng);
        log::debug!(
            "Materializing {} ({:?}) for {} at ({}, {}, {})",
            object_id,
            kind,
            owner,
            position.x,
            position.y,
            position.z
        );
        self.place(renderer, owner, object_id, kind, position)
    }

    /// Moves a visual on the ground plane, keeping its height.
    pub fn move_to(
        &mut self,
        renderer: &mut dyn Renderer,
        owner: &ParticipantId,
        object_id: &ObjectId,
        point: GroundPoint,
    ) -> Option<Position> {
        let visual = self
            .visuals
            .get_mut(owner)
            .and_then(|visuals| visuals.get_mut(object_id))?;
        visual.position.x = point.x;
        visual.position.z = point.z;
        renderer.set_position(visual.handle, visual.position);
        Some(visual.position)
    }

    /// Disposes a single visual. Returns `false` when `owner` has no such object.
    pub fn release(
        &mut self,
        renderer: &mut dyn Renderer,
        owner: &ParticipantId,
        object_id: &ObjectId,
    ) -> bool {
        let visuals = match self.visuals.get_mut(owner) {
            Some(visuals) => visuals,
            None => return false,
        };
        let visual = match visuals.remove(object_id) {
            Some(visual) => visual,
            None => return false,
        };
        if visuals.is_empty() {
            self.visuals.remove(owner);
        }
        renderer.dispose(visual.handle);
        true
    }

    /// Disposes every visual owned by `owner`. Returns the disposed ids.
    pub fn dispose_owner(
        &mut self,
        renderer: &mut dyn Renderer,
        owner: &ParticipantId,
    ) -> Vec<ObjectId> {
        let mut disposed: Vec<ObjectId> = Vec::new();
        if let Some(visuals) = self.visuals.remove(owner) {
            for (object_id, visual) in visuals {
                renderer.dispose(visual.handle);
                disposed.push(object_id);
            }
        }
        disposed.sort();
        disposed
    }
}
