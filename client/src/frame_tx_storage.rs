use std::collections::HashMap;
use system::{encode_event, ChannelEvent, ParticipantId};
use tokio::sync::mpsc::error::TrySendError;

pub type FrameTx = tokio::sync::mpsc::Sender<Vec<u8>>;
pub type FrameRx = tokio::sync::mpsc::Receiver<Vec<u8>>;

pub struct FrameTxStorage {
    frame_txs: HashMap<ParticipantId, FrameTx>,
}

impl FrameTxStorage {
    pub fn new() -> Self {
        Self {
            frame_txs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, participant_id: ParticipantId, tx: FrameTx) {
        self.frame_txs.insert(participant_id, tx);
    }

    pub fn remove(&mut self, participant_id: &ParticipantId) -> Option<FrameTx> {
        self.frame_txs.remove(participant_id)
    }

    pub fn send(&self, to: &ParticipantId, event: &ChannelEvent) {
        let frame = match encode_event(event) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("Couldn't encode {:?}: {}", event, e);
                return;
            }
        };
        self.send_frame(to, frame);
    }

    pub fn broadcast(&self, event: &ChannelEvent) {
        let frame = match encode_event(event) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("Couldn't encode {:?}: {}", event, e);
                return;
            }
        };
        for to in self.frame_txs.keys() {
            self.send_frame(to, frame.clone());
        }
    }

    fn send_frame(&self, to: &ParticipantId, frame: Vec<u8>) {
        match self.frame_txs.get(to) {
            Some(tx) => match tx.try_send(frame) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    log::warn!("Frame queue of {} is full, frame dropped", to)
                }
                Err(TrySendError::Closed(_)) => {
                    log::debug!("Frame queue of {} is closed", to)
                }
            },
            None => log::warn!("No frame queue for {}", to),
        }
    }
}
