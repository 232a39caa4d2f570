use std::num::Wrapping;
use system::{
    ChannelEvent, ObjectDescriptor, ObjectId, ParticipantDescriptor, ParticipantId, SendShapes,
    SessionId, ShapeKind, ShapeTransfer,
};
use thiserror::Error;

const KIND_CYCLE: [ShapeKind; 3] = [ShapeKind::Circle, ShapeKind::Square, ShapeKind::Other];

pub struct ServiceState {
    session_id: SessionId,
    shapes_per_participant: usize,
    shape_id_source: Wrapping<u32>,
    participants: Vec<(ParticipantId, ParticipantDescriptor)>,
    objects: Vec<(ObjectId, ObjectDescriptor)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("unknown participant {0}")]
    UnknownParticipant(ParticipantId),
    #[error("transfer without shapes")]
    EmptyTransfer,
}

impl ServiceState {
    pub fn new(session_id: SessionId, shapes_per_participant: usize) -> Self {
        Self {
            session_id,
            shapes_per_participant,
            shape_id_source: Wrapping(0),
            participants: Vec::new(),
            objects: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn has_participant(&self, participant_id: &ParticipantId) -> bool {
        self.participants.iter().any(|(id, _)| id == participant_id)
    }

    /// Events that bring a fresh joiner up to date, objects first.
    pub fn snapshot_events(&self) -> Vec<ChannelEvent> {
        let objects = self
            .objects
            .iter()
            .map(|(object_id, descriptor)| ChannelEvent::ObjectAdded {
                object_id: object_id.clone(),
                descriptor: descriptor.clone(),
            });
        let participants =
            self.participants
                .iter()
                .map(|(participant_id, descriptor)| ChannelEvent::ParticipantAdded {
                    participant_id: participant_id.clone(),
                    descriptor: descriptor.clone(),
                });
        objects.chain(participants).collect()
    }

    /// Registers a participant with freshly created shapes. Returns the new
    /// id and the events announcing it, shapes before the participant.
    pub fn join(&mut self, display_name: &str) -> (ParticipantId, Vec<ChannelEvent>) {
        let participant_id = uuid::Uuid::new_v4().to_string();
        let mut events = Vec::new();
        let mut shape_ids = Vec::new();
        for i in 0..self.shapes_per_participant {
            let object_id = self.new_shape_id();
            let descriptor = ObjectDescriptor {
                kind: KIND_CYCLE[i % KIND_CYCLE.len()],
            };
            self.objects.push((object_id.clone(), descriptor.clone()));
            events.push(ChannelEvent::ObjectAdded {
                object_id: object_id.clone(),
                descriptor,
            });
            shape_ids.push(object_id);
        }
        let descriptor = ParticipantDescriptor {
            display_name: display_name.into(),
            shape_ids,
        };
        self.participants
            .push((participant_id.clone(), descriptor.clone()));
        events.push(ChannelEvent::ParticipantAdded {
            participant_id: participant_id.clone(),
            descriptor,
        });
        log::info!(
            "Participant {} ({}) joined session {}, {} present",
            participant_id,
            display_name,
            self.session_id,
            self.participant_count()
        );
        (participant_id, events)
    }

    /// Shapes stay in the session; they are descriptive only.
    pub fn leave(&mut self, participant_id: &ParticipantId) -> Option<ParticipantDescriptor> {
        let position = self
            .participants
            .iter()
            .position(|(id, _)| id == participant_id)?;
        let (_, descriptor) = self.participants.remove(position);
        log::info!(
            "Participant {} left session {}",
            participant_id,
            self.session_id
        );
        Some(descriptor)
    }

    pub fn transfer(
        &self,
        from: &ParticipantId,
        request: SendShapes,
    ) -> Result<ShapeTransfer, ServiceError> {
        if !self.has_participant(from) {
            return Err(ServiceError::UnknownParticipant(from.clone()));
        }
        if !self.has_participant(&request.player_id) {
            return Err(ServiceError::UnknownParticipant(request.player_id));
        }
        if request.shapes.is_empty() {
            return Err(ServiceError::EmptyTransfer);
        }
        Ok(ShapeTransfer {
            sender_id: from.clone(),
            receiver_id: request.player_id,
            shapes: request.shapes,
        })
    }

    fn new_shape_id(&mut self) -> ObjectId {
        self.shape_id_source += Wrapping(1);
        format!("shape-{}", self.shape_id_source.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_announce_shapes_before_participant() {
        let mut state = ServiceState::new("room".into(), 3);
        let (participant_id, events) = state.join("alice");
        assert_eq!(events.len(), 4);
        match &events[3] {
            ChannelEvent::ParticipantAdded {
                participant_id: id,
                descriptor,
            } => {
                assert_eq!(id, &participant_id);
                assert_eq!(descriptor.shape_ids, vec!["shape-1", "shape-2", "shape-3"]);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn it_should_replay_existing_state_to_joiner() {
        let mut state = ServiceState::new("room".into(), 2);
        state.join("alice");
        state.join("bob");
        let replay = state.snapshot_events();
        assert_eq!(replay.len(), 6);
        assert!(matches!(replay[4], ChannelEvent::ParticipantAdded { .. }));
    }

    #[test]
    fn it_should_stamp_sender_on_transfer() {
        let mut state = ServiceState::new("room".into(), 1);
        let (alice, _) = state.join("alice");
        let (bob, _) = state.join("bob");
        let transfer = state
            .transfer(
                &alice,
                SendShapes {
                    shapes: vec!["shape-1".into()],
                    player_id: bob.clone(),
                },
            )
            .unwrap();
        assert_eq!(transfer.sender_id, alice);
        assert_eq!(transfer.receiver_id, bob);

        let result = state.transfer(
            &alice,
            SendShapes {
                shapes: vec![],
                player_id: bob.clone(),
            },
        );
        assert_eq!(result, Err(ServiceError::EmptyTransfer));
    }

    #[test]
    fn it_should_forget_participant_on_leave() {
        let mut state = ServiceState::new("room".into(), 1);
        let (alice, _) = state.join("alice");
        assert!(state.leave(&alice).is_some());
        assert!(state.leave(&alice).is_none());
        assert_eq!(state.participant_count(), 0);
    }
}
