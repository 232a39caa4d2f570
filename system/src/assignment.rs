use crate::config::GridLayout;
use crate::message::*;
use crate::mirror::ReplicaMirror;
use crate::registry::MaterializationRegistry;
use crate::traits::Renderer;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssignmentState {
    QuorumNotReached,
    Assigned,
}

pub struct AssignmentEngine {
    quorum: usize,
    layout: GridLayout,
    state: AssignmentState,
    assigned: HashMap<ParticipantId, Vec<ObjectId>>,
}

impl AssignmentEngine {
    pub fn new(quorum: usize, layout: GridLayout) -> Self {
        Self {
            quorum,
            layout,
            state: AssignmentState::QuorumNotReached,
            assigned: HashMap::new(),
        }
    }

    pub fn state(&self) -> AssignmentState {
        self.state
    }

    pub fn is_assigned(&self, participant_id: &ParticipantId) -> bool {
        self.assigned.contains_key(participant_id)
    }

    pub fn assigned_objects(&self, participant_id: &ParticipantId) -> Option<&[ObjectId]> {
        self.assigned.get(participant_id).map(|ids| ids.as_slice())
    }

    /// Quorum check, run after every join. Assigns every known participant
    /// the first time `count` equals the quorum. Returns whether a cycle ran.
    pub fn on_participant_added(
        &mut self,
        count: usize,
        mirror: &ReplicaMirror,
        registry: &mut MaterializationRegistry,
        renderer: &mut dyn Renderer,
    ) -> bool {
        if self.state == AssignmentState::Assigned || count != self.quorum {
            log::debug!(
                "Quorum check: {}/{} participants, state {:?}",
                count,
                self.quorum,
                self.state
            );
            return false;
        }

        log::info!("Quorum of {} reached. Assigning shapes.", self.quorum);
        let participant_ids: Vec<ParticipantId> =
            mirror.participants().map(|p| p.id.clone()).collect();
        for participant_id in &participant_ids {
            self.assign_participant(participant_id, mirror, registry, renderer);
        }
        self.state = AssignmentState::Assigned;
        true
    }

    /// Materializes the participant's declared shapes on the grid. Runs at
    /// most once per participant until it is forgotten.
    pub fn assign_participant(
        &mut self,
        participant_id: &ParticipantId,
        mirror: &ReplicaMirror,
        registry: &mut MaterializationRegistry,
        renderer: &mut dyn Renderer,
    ) -> Option<usize> {
        let participant = match mirror.participant(participant_id) {
            Some(participant) => participant,
            None => {
                log::warn!("Player with ID {} not found.", participant_id);
                return None;
            }
        };
        if self.assigned.contains_key(participant_id) {
            log::warn!(
                "Shapes already assigned to player {}. Skipping.",
                participant_id
            );
            return None;
        }

        log::info!(
            "Creating shapes for player {} with {} shapes",
            participant_id,
            participant.shape_ids.len()
        );
        let mut assigned_shapes = Vec::new();
        for (index, object_id) in participant.shape_ids.iter().enumerate() {
            let descriptor = match mirror.object(object_id) {
                Some(descriptor) => descriptor,
                None => {
                    log::warn!("Shape data not found for ID: {}", object_id);
                    continue;
                }
            };
            let position = self.layout.position(index);
            if registry.place(
                renderer,
                participant_id,
                object_id,
                descriptor.kind,
                position,
            ) {
                log::debug!(
                    "Assigned shape {} to player {} at ({}, {}, {})",
                    object_id,
                    participant_id,
                    position.x,
                    position.y,
                    position.z
                );
                assigned_shapes.push(object_id.clone());
            }
        }

        let count = assigned_shapes.len();
        self.assigned.insert(participant_id.clone(), assigned_shapes);
        Some(count)
    }

    pub fn forget(&mut self, participant_id: &ParticipantId) -> Option<Vec<ObjectId>> {
        self.assigned.remove(participant_id)
    }

    /// Allows the next quorum to run a fresh cycle.
    pub fn reset(&mut self) {
        if self.state != AssignmentState::QuorumNotReached {
            log::info!("Assignment reset, waiting for quorum");
        }
        self.state = AssignmentState::QuorumNotReached;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::euclid::default::Point3D;
    use crate::registry::tests::{registry, CountingRenderer};

    fn mirror_with(ids: &[&str], shapes_each: usize) -> ReplicaMirror {
        let mut mirror = ReplicaMirror::new();
        for id in ids {
            add(&mut mirror, id, shapes_each);
        }
        mirror
    }

    fn add(mirror: &mut ReplicaMirror, id: &str, shapes_each: usize) -> usize {
        let shape_ids: Vec<ObjectId> = (0..shapes_each).map(|i| format!("{}-{}", id, i)).collect();
        for shape_id in &shape_ids {
            mirror.apply(ChannelEvent::ObjectAdded {
                object_id: shape_id.clone(),
                descriptor: ObjectDescriptor {
                    kind: ShapeKind::Square,
                },
            });
        }
        mirror.apply(ChannelEvent::ParticipantAdded {
            participant_id: id.into(),
            descriptor: ParticipantDescriptor {
                display_name: id.into(),
                shape_ids,
            },
        });
        mirror.participant_count()
    }

    #[test]
    fn it_should_assign_only_when_count_first_equals_quorum() {
        let mut mirror = ReplicaMirror::new();
        let mut registry = registry();
        let mut renderer = CountingRenderer::default();
        let mut engine = AssignmentEngine::new(4, GridLayout::default());

        let mut cycles = Vec::new();
        for id in &["a", "b", "c", "d", "e"] {
            let count = add(&mut mirror, id, 2);
            cycles.push(engine.on_participant_added(count, &mirror, &mut registry, &mut renderer));
        }

        assert_eq!(cycles, vec![false, false, false, true, false]);
        assert_eq!(engine.state(), AssignmentState::Assigned);
        assert_eq!(renderer.materialized.len(), 8);
        assert!(!engine.is_assigned(&"e".to_string()));
    }

    #[test]
    fn it_should_run_once_when_quorum_is_signalled_repeatedly() {
        let mirror = mirror_with(&["a", "b", "c", "d"], 3);
        let mut registry = registry();
        let mut renderer = CountingRenderer::default();
        let mut engine = AssignmentEngine::new(4, GridLayout::default());

        assert!(engine.on_participant_added(4, &mirror, &mut registry, &mut renderer));
        assert!(!engine.on_participant_added(4, &mirror, &mut registry, &mut renderer));
        assert!(!engine.on_participant_added(4, &mirror, &mut registry, &mut renderer));
        assert_eq!(renderer.materialized.len(), 12);
    }

    #[test]
    fn it_should_guard_each_participant() {
        let mirror = mirror_with(&["a"], 2);
        let mut registry = registry();
        let mut renderer = CountingRenderer::default();
        let mut engine = AssignmentEngine::new(4, GridLayout::default());
        let a: ParticipantId = "a".into();

        assert_eq!(
            engine.assign_participant(&a, &mirror, &mut registry, &mut renderer),
            Some(2)
        );
        assert_eq!(
            engine.assign_participant(&a, &mirror, &mut registry, &mut renderer),
            None
        );
        assert_eq!(renderer.materialized.len(), 2);
    }

    #[test]
    fn it_should_skip_shapes_without_descriptor() {
        let mut mirror = ReplicaMirror::new();
        mirror.apply(ChannelEvent::ObjectAdded {
            object_id: "s0".into(),
            descriptor: ObjectDescriptor {
                kind: ShapeKind::Circle,
            },
        });
        mirror.apply(ChannelEvent::ObjectAdded {
            object_id: "s2".into(),
            descriptor: ObjectDescriptor {
                kind: ShapeKind::Square,
            },
        });
        mirror.apply(ChannelEvent::ParticipantAdded {
            participant_id: "a".into(),
            descriptor: ParticipantDescriptor {
                display_name: "a".into(),
                shape_ids: vec!["s0".into(), "s1".into(), "s2".into()],
            },
        });
        let mut registry = registry();
        let mut renderer = CountingRenderer::default();
        let mut engine = AssignmentEngine::new(1, GridLayout::default());

        assert!(engine.on_participant_added(1, &mirror, &mut registry, &mut renderer));
        assert_eq!(
            engine.assigned_objects(&"a".to_string()),
            Some(&["s0".to_string(), "s2".to_string()][..])
        );
        // the declared index is kept, so s2 lands in the third grid slot
        assert_eq!(renderer.materialized[1].2, Point3D::new(0.0, 0.5, 2.5));
    }

    #[test]
    fn it_should_allow_new_cycle_after_reset() {
        let mut mirror = mirror_with(&["a", "b", "c", "d"], 1);
        let mut registry = registry();
        let mut renderer = CountingRenderer::default();
        let mut engine = AssignmentEngine::new(4, GridLayout::default());
        engine.on_participant_added(4, &mirror, &mut registry, &mut renderer);

        mirror.apply(ChannelEvent::ParticipantRemoved {
            participant_id: "a".into(),
        });
        registry.dispose_owner(&mut renderer, &"a".to_string());
        engine.forget(&"a".to_string());
        engine.reset();

        let count = add(&mut mirror, "e", 1);
        assert!(engine.on_participant_added(count, &mirror, &mut registry, &mut renderer));
        assert!(engine.is_assigned(&"e".to_string()));
        assert_eq!(registry.len(), 4);
        assert_eq!(renderer.materialized.len(), 5);
    }
}
