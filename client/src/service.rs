//! In-process stand-in for the session service. Good enough to run a session
//! end to end in one process: it hands out participant ids, declares every
//! participant's shapes and relays shape transfers to everyone.

use system::{decode_payload, encode_payload, ChannelEvent, ParticipantId, SendShapes};
use system::{SEND_SHAPES, SHAPE_TRANSFER};
use tokio::sync::mpsc::{channel, Sender};
use tokio::sync::oneshot;

use crate::connection::SessionHandle;
use crate::frame_tx_storage::{FrameTx, FrameTxStorage};
use crate::service_state::ServiceState;

pub type ServiceTx = Sender<ServiceCommand>;

#[derive(Debug)]
pub enum ServiceCommand {
    Join {
        display_name: String,
        frames: FrameTx,
        reply: oneshot::Sender<SessionHandle>,
    },
    Leave {
        from: ParticipantId,
    },
    Message {
        from: ParticipantId,
        kind: String,
        payload: String,
    },
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub session_id: String,
    pub shapes_per_participant: usize,
    pub command_buffer: usize,
}

impl std::default::Default for ServiceConfig {
    fn default() -> Self {
        Self {
            session_id: "my_room".into(),
            shapes_per_participant: 5,
            command_buffer: 64,
        }
    }
}

struct Service {
    state: ServiceState,
    frames: FrameTxStorage,
}

impl Service {
    fn new(config: &ServiceConfig) -> Self {
        Self {
            state: ServiceState::new(config.session_id.clone(), config.shapes_per_participant),
            frames: FrameTxStorage::new(),
        }
    }

    fn handle_command(&mut self, command: ServiceCommand) {
        match command {
            ServiceCommand::Join {
                display_name,
                frames,
                reply,
            } => {
                let replay = self.state.snapshot_events();
                let (participant_id, announced) = self.state.join(&display_name);
                self.frames.insert(participant_id.clone(), frames);
                for event in &replay {
                    self.frames.send(&participant_id, event);
                }
                for event in &announced {
                    self.frames.broadcast(event);
                }
                let handle = SessionHandle {
                    session_id: self.state.session_id().clone(),
                    participant_id: participant_id.clone(),
                };
                if reply.send(handle).is_err() {
                    log::warn!("{} went away before the join completed", participant_id);
                    self.leave(&participant_id);
                }
            }
            ServiceCommand::Leave { from } => self.leave(&from),
            ServiceCommand::Message {
                from,
                kind,
                payload,
            } => self.handle_message(&from, &kind, &payload),
        }
    }

    fn handle_message(&mut self, from: &ParticipantId, kind: &str, payload: &str) {
        if kind != SEND_SHAPES {
            log::warn!("Unknown message kind {} from {}", kind, from);
            return;
        }
        let request = match decode_payload::<SendShapes>(payload) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("Malformed {} from {}: {}", kind, from, e);
                return;
            }
        };
        let transfer = match self.state.transfer(from, request) {
            Ok(transfer) => transfer,
            Err(e) => {
                log::warn!("Rejected transfer from {}: {}", from, e);
                return;
            }
        };
        match encode_payload(&transfer) {
            Ok(payload) => self.frames.broadcast(&ChannelEvent::Message {
                kind: SHAPE_TRANSFER.into(),
                payload,
            }),
            Err(e) => log::error!("Couldn't encode transfer: {}", e),
        }
    }

    fn leave(&mut self, participant_id: &ParticipantId) {
        self.frames.remove(participant_id);
        if self.state.leave(participant_id).is_some() {
            self.frames.broadcast(&ChannelEvent::ParticipantRemoved {
                participant_id: participant_id.clone(),
            });
        } else {
            log::warn!("{} is not in the session", participant_id);
        }
    }
}

pub fn spawn_service(config: ServiceConfig) -> ServiceTx {
    let (srv_tx, mut srv_rx) = channel::<ServiceCommand>(config.command_buffer.max(1));

    tokio::spawn(async move {
        let mut service = Box::new(Service::new(&config));
        log::info!("session service - started ({})", config.session_id);

        while let Some(command) = srv_rx.recv().await {
            service.handle_command(command);
        }
        log::info!("session service - terminated");
    });

    srv_tx
}
