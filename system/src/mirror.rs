use crate::message::*;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    /// Shapes the service declared for this participant, in assignment order.
    pub shape_ids: Vec<ObjectId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MirrorChange {
    ParticipantAdded {
        participant_id: ParticipantId,
        count: usize,
    },
    ParticipantRemoved {
        participant: Participant,
        count: usize,
    },
    ObjectAdded(ObjectId),
    ObjectRemoved(ObjectId),
}

type ParticipantHandler = Box<dyn FnMut(&Participant, usize) + Send>;

/// Local read-through cache of the replicated session state.
///
/// Only descriptive data lives here. Who currently holds which shape is
/// tracked by the assignment engine and the materialization registry.
pub struct ReplicaMirror {
    participants: HashMap<ParticipantId, Participant>,
    join_order: Vec<ParticipantId>,
    objects: HashMap<ObjectId, ObjectDescriptor>,
    added_handlers: Vec<ParticipantHandler>,
    removed_handlers: Vec<ParticipantHandler>,
}

impl ReplicaMirror {
    pub fn new() -> Self {
        Self {
            participants: HashMap::new(),
            join_order: Vec::new(),
            objects: HashMap::new(),
            added_handlers: Vec::new(),
            removed_handlers: Vec::new(),
        }
    }

    /// Handler receives the participant and the participant count after the join.
    pub fn on_participant_added<F>(&mut self, handler: F)
    where
        F: FnMut(&Participant, usize) + Send + 'static,
    {
        self.added_handlers.push(Box::new(handler));
    }

    /// Handler receives the departed participant and the remaining count.
    pub fn on_participant_removed<F>(&mut self, handler: F)
    where
        F: FnMut(&Participant, usize) + Send + 'static,
    {
        self.removed_handlers.push(Box::new(handler));
    }

    /// Applies a state notification. Messages are not state and yield `None`.
    pub fn apply(&mut self, event: ChannelEvent) -> Option<MirrorChange> {
        match event {
            ChannelEvent::ParticipantAdded {
                participant_id,
                descriptor,
            } => self.add_participant(participant_id, descriptor),
            ChannelEvent::ParticipantRemoved { participant_id } => {
                self.remove_participant(&participant_id)
            }
            ChannelEvent::ObjectAdded {
                object_id,
                descriptor,
            } => {
                if self.objects.contains_key(&object_id) {
                    log::warn!("Object {} is already known. Skipping.", object_id);
                    return None;
                }
                log::debug!("Object added: {} ({:?})", object_id, descriptor.kind);
                self.objects.insert(object_id.clone(), descriptor);
                Some(MirrorChange::ObjectAdded(object_id))
            }
            ChannelEvent::ObjectRemoved { object_id } => {
                if self.objects.remove(&object_id).is_none() {
                    log::warn!("Tried to remove unknown object {}. Skipping.", object_id);
                    return None;
                }
                Some(MirrorChange::ObjectRemoved(object_id))
            }
            ChannelEvent::Message { kind, .. } => {
                log::trace!("Mirror ignores message {}", kind);
                None
            }
        }
    }

    fn add_participant(
        &mut self,
        participant_id: ParticipantId,
        descriptor: ParticipantDescriptor,
    ) -> Option<MirrorChange> {
        if self.participants.contains_key(&participant_id) {
            log::warn!("Participant {} joined twice. Skipping.", participant_id);
            return None;
        }
        let participant = Participant {
            id: participant_id.clone(),
            display_name: descriptor.display_name,
            shape_ids: descriptor.shape_ids,
        };
        log::info!(
            "Participant added - ID: {}, Name: {}",
            participant.id,
            participant.display_name
        );
        self.join_order.push(participant_id.clone());
        self.participants
            .insert(participant_id.clone(), participant.clone());

        let count = self.participant_count();
        for handler in self.added_handlers.iter_mut() {
            handler(&participant, count);
        }
        Some(MirrorChange::ParticipantAdded {
            participant_id,
            count,
        })
    }

    fn remove_participant(&mut self, participant_id: &ParticipantId) -> Option<MirrorChange> {
        let participant = match self.participants.remove(participant_id) {
            Some(participant) => participant,
            None => {
                log::warn!(
                    "Tried to remove unknown participant {}. Skipping.",
                    participant_id
                );
                return None;
            }
        };
        log::info!("Participant left: {}", participant_id);
        self.join_order.retain(|id| id != participant_id);

        let count = self.participant_count();
        for handler in self.removed_handlers.iter_mut() {
            handler(&participant, count);
        }
        Some(MirrorChange::ParticipantRemoved { participant, count })
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn participant(&self, participant_id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(participant_id)
    }

    /// Participants in the order they joined.
    pub fn participants(&self) -> impl Iterator<Item = &Participant> + '_ {
        self.join_order
            .iter()
            .filter_map(move |id| self.participants.get(id))
    }

    pub fn object(&self, object_id: &ObjectId) -> Option<&ObjectDescriptor> {
        self.objects.get(object_id)
    }
}
