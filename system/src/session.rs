use crate::assignment::{AssignmentEngine, AssignmentState};
use crate::cleanup::release_participant;
use crate::config::SessionConfig;
use crate::error::TransferError;
use crate::message::*;
use crate::mirror::{MirrorChange, ReplicaMirror};
use crate::registry::MaterializationRegistry;
use crate::selection::{Selection, SelectionState};
use crate::traits::{Channel, Renderer, SendAffordance};
use crate::transfer::{Received, TransferMessenger};
use crate::types::{Bounds, PointerEvent};
use rand::RngCore;
use serde::Serialize;
use std::collections::BTreeMap;

/// Serializable snapshot of a client's local view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub local_id: ParticipantId,
    pub participant_count: usize,
    pub assignment: AssignmentState,
    pub selection: Vec<ObjectId>,
    pub holding: Option<ObjectId>,
    pub send_enabled: bool,
    pub owned: BTreeMap<ParticipantId, Vec<ObjectId>>,
}

impl SessionView {
    pub fn owned_by(&self, participant_id: &str) -> &[ObjectId] {
        self.owned
            .get(participant_id)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }
}

/// Local state of one participant in a shape exchange session.
///
/// Every handler runs to completion and nothing here is shared, so callers
/// must drive a session from a single task.
pub struct ClientSession<C, R, A> {
    local_id: ParticipantId,
    send_zone: Bounds,
    mirror: ReplicaMirror,
    assignment: AssignmentEngine,
    registry: MaterializationRegistry,
    selection: Selection,
    messenger: TransferMessenger,
    channel: C,
    renderer: R,
    affordance: A,
}

impl<C, R, A> ClientSession<C, R, A>
where
    C: Channel,
    R: Renderer,
    A: SendAffordance,
{
    pub fn new(
        local_id: ParticipantId,
        config: SessionConfig,
        channel: C,
        renderer: R,
        affordance: A,
    ) -> Self {
        let registry = MaterializationRegistry::new(config.receive_area.clone());
        Self::with_registry(local_id, config, registry, channel, renderer, affordance)
    }

    /// Same as `new` but received shapes are placed with `rng`.
    pub fn with_rng<G: RngCore + Send + 'static>(
        local_id: ParticipantId,
        config: SessionConfig,
        rng: G,
        channel: C,
        renderer: R,
        affordance: A,
    ) -> Self {
        let registry = MaterializationRegistry::with_rng(config.receive_area.clone(), rng);
        Self::with_registry(local_id, config, registry, channel, renderer, affordance)
    }

    fn with_registry(
        local_id: ParticipantId,
        config: SessionConfig,
        registry: MaterializationRegistry,
        channel: C,
        renderer: R,
        mut affordance: A,
    ) -> Self {
        log::debug!("ClientSession created for {}", local_id);
        affordance.set_enabled(false);
        Self {
            send_zone: config.send_zone.bounds(),
            mirror: ReplicaMirror::new(),
            assignment: AssignmentEngine::new(config.quorum, config.layout),
            registry,
            selection: Selection::new(local_id.clone()),
            messenger: TransferMessenger::new(local_id.clone()),
            local_id,
            channel,
            renderer,
            affordance,
        }
    }

    pub fn handle_channel_event(&mut self, event: ChannelEvent) {
        if let ChannelEvent::Message { kind, payload } = event {
            self.handle_message(&kind, &payload);
            return;
        }
        match self.mirror.apply(event) {
            Some(MirrorChange::ParticipantAdded { count, .. }) => {
                self.assignment.on_participant_added(
                    count,
                    &self.mirror,
                    &mut self.registry,
                    &mut self.renderer,
                );
            }
            Some(MirrorChange::ParticipantRemoved { participant, .. }) => {
                let report = release_participant(
                    &participant.id,
                    &mut self.assignment,
                    &mut self.registry,
                    &mut self.selection,
                    &mut self.renderer,
                );
                self.notify_pending(report.pending_changed);
            }
            Some(MirrorChange::ObjectAdded(_)) | Some(MirrorChange::ObjectRemoved(_)) | None => {}
        }
    }

    fn handle_message(&mut self, kind: &str, payload: &str) {
        match kind {
            SHAPE_TRANSFER => {
                match self.messenger.receive(
                    payload,
                    &self.mirror,
                    &mut self.registry,
                    &mut self.renderer,
                ) {
                    Ok(Received::Accepted { materialized, .. }) => {
                        log::debug!("Materialized {} received shapes", materialized)
                    }
                    Ok(Received::Ignored) => {}
                    Err(e) => log::warn!("Dropping malformed {}: {}", kind, e),
                }
            }
            _ => log::debug!("Unhandled message kind: {}", kind),
        }
    }

    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down(pick) => {
                self.selection.pointer_down(&pick, &self.registry);
            }
            PointerEvent::Move(pick) => {
                self.selection
                    .pointer_move(&pick, &mut self.registry, &mut self.renderer);
            }
            PointerEvent::Up => {
                let changed = self.selection.pointer_up(&self.registry, &self.send_zone);
                self.notify_pending(changed);
            }
        }
    }

    /// Sends the current selection to `receiver_id`.
    pub fn send_selection(
        &mut self,
        receiver_id: &ParticipantId,
    ) -> Result<TransferMessage, TransferError> {
        let result = self
            .messenger
            .send(&mut self.selection, receiver_id, &mut self.channel);
        match &result {
            Ok(_) => self.notify_pending(Some(false)),
            Err(TransferError::EmptySelection) => {}
            Err(e) => log::warn!("Couldn't send shapes: {}", e),
        }
        result
    }

    fn notify_pending(&mut self, changed: Option<bool>) {
        if let Some(enabled) = changed {
            log::debug!("Send affordance enabled: {}", enabled);
            self.affordance.set_enabled(enabled);
        }
    }

    pub fn view(&self) -> SessionView {
        let owned = self
            .registry
            .owners()
            .map(|owner| (owner.clone(), self.registry.owned_object_ids(owner)))
            .collect();
        let holding = match self.selection.state() {
            SelectionState::Holding { object_id } => Some(object_id.clone()),
            SelectionState::Idle => None,
        };
        SessionView {
            local_id: self.local_id.clone(),
            participant_count: self.mirror.participant_count(),
            assignment: self.assignment.state(),
            selection: self.selection.committed().to_vec(),
            holding,
            send_enabled: self.selection.has_pending(),
            owned,
        }
    }

    pub fn local_id(&self) -> &ParticipantId {
        &self.local_id
    }

    pub fn mirror(&self) -> &ReplicaMirror {
        &self.mirror
    }

    /// For registering participant observers.
    pub fn mirror_mut(&mut self) -> &mut ReplicaMirror {
        &mut self.mirror
    }

    pub fn assignment(&self) -> &AssignmentEngine {
        &self.assignment
    }

    pub fn registry(&self) -> &MaterializationRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn affordance(&self) -> &A {
        &self.affordance
    }
}
