use crate::assignment::AssignmentEngine;
use crate::message::*;
use crate::registry::MaterializationRegistry;
use crate::selection::Selection;
use crate::traits::Renderer;

#[derive(Debug, Clone, PartialEq)]
pub struct CleanupReport {
    pub disposed: Vec<ObjectId>,
    pub was_assigned: bool,
    /// New pending flag of the local selection, when it changed.
    pub pending_changed: Option<bool>,
}

/// Undoes a departed participant's assignment. Their shapes are disposed,
/// not handed to anybody else.
pub fn release_participant(
    participant_id: &ParticipantId,
    assignment: &mut AssignmentEngine,
    registry: &mut MaterializationRegistry,
    selection: &mut Selection,
    renderer: &mut dyn Renderer,
) -> CleanupReport {
    let disposed = registry.dispose_owner(renderer, participant_id);
    let was_assigned = assignment.forget(participant_id).is_some();
    assignment.reset();
    let pending_changed = selection.release_missing(registry);
    log::info!(
        "Cleaned up participant {}: {} shapes disposed",
        participant_id,
        disposed.len()
    );
    CleanupReport {
        disposed,
        was_assigned,
        pending_changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::AssignmentState;
    use crate::config::GridLayout;
    use crate::euclid::default::Point3D;
    use crate::registry::tests::{registry, CountingRenderer};

    #[test]
    fn it_should_dispose_untrack_and_reset() {
        let mut renderer = CountingRenderer::default();
        let mut registry = registry();
        let mut selection = Selection::new("b".into());
        let mut mirror = crate::mirror::ReplicaMirror::new();
        mirror.apply(ChannelEvent::ObjectAdded {
            object_id: "s1".into(),
            descriptor: ObjectDescriptor::default(),
        });
        mirror.apply(ChannelEvent::ParticipantAdded {
            participant_id: "a".into(),
            descriptor: ParticipantDescriptor {
                display_name: "a".into(),
                shape_ids: vec!["s1".into()],
            },
        });
        let mut assignment = AssignmentEngine::new(1, GridLayout::default());
        assignment.on_participant_added(1, &mirror, &mut registry, &mut renderer);
        assert_eq!(assignment.state(), AssignmentState::Assigned);

        let report = release_participant(
            &"a".into(),
            &mut assignment,
            &mut registry,
            &mut selection,
            &mut renderer,
        );

        assert_eq!(report.disposed, vec!["s1".to_string()]);
        assert!(report.was_assigned);
        assert_eq!(report.pending_changed, None);
        assert_eq!(renderer.disposed.len(), 1);
        assert!(!assignment.is_assigned(&"a".to_string()));
        assert_eq!(assignment.state(), AssignmentState::QuorumNotReached);
    }

    #[test]
    fn it_should_drop_local_selection_when_local_participant_leaves() {
        let mut renderer = CountingRenderer::default();
        let mut registry = registry();
        let local: ParticipantId = "a".into();
        registry.place(
            &mut renderer,
            &local,
            &"s1".to_string(),
            ShapeKind::Circle,
            Point3D::new(1.0, 0.5, 4.0),
        );
        let mut selection = Selection::new(local.clone());
        selection.commit("s1".into());
        let mut assignment = AssignmentEngine::new(4, GridLayout::default());

        let report = release_participant(
            &local,
            &mut assignment,
            &mut registry,
            &mut selection,
            &mut renderer,
        );
        assert!(!report.was_assigned);
        assert_eq!(report.pending_changed, Some(false));
        assert!(selection.committed().is_empty());
    }
}
