use serde::Serialize;
use system::{Channel, ChannelError, ParticipantId, SessionId};
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

use crate::frame_tx_storage::FrameRx;
use crate::service::{ServiceCommand, ServiceTx};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionHandle {
    pub session_id: SessionId,
    pub participant_id: ParticipantId,
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("session service is unavailable")]
    Unavailable,
    #[error("session service dropped the join request")]
    Rejected,
}

/// A joined session. Frames emitted by the service after the join are
/// queued in `frames` until the client loop starts reading them.
pub struct Connection {
    pub(crate) handle: SessionHandle,
    pub(crate) frames: FrameRx,
    pub(crate) service: ServiceTx,
}

impl Connection {
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.handle.participant_id
    }
}

/// Joins the session. Suspends until the service hands out a participant
/// id. A failure is final; retrying is up to the caller.
pub async fn connect(
    service: &ServiceTx,
    display_name: &str,
    frame_buffer: usize,
) -> Result<Connection, ConnectError> {
    let (frames_tx, frames) = mpsc::channel(frame_buffer.max(1));
    let (reply_tx, reply_rx) = oneshot::channel();
    service
        .send(ServiceCommand::Join {
            display_name: display_name.into(),
            frames: frames_tx,
            reply: reply_tx,
        })
        .await
        .map_err(|_| ConnectError::Unavailable)?;
    let handle = reply_rx.await.map_err(|_| ConnectError::Rejected)?;
    log::info!(
        "Connected to session {} as {}",
        handle.session_id,
        handle.participant_id
    );
    Ok(Connection {
        handle,
        frames,
        service: service.clone(),
    })
}

/// Outgoing messages of one participant.
pub struct ServiceChannel {
    from: ParticipantId,
    service: ServiceTx,
}

impl ServiceChannel {
    pub fn new(from: ParticipantId, service: ServiceTx) -> Self {
        Self { from, service }
    }
}

impl Channel for ServiceChannel {
    fn send(&mut self, kind: &str, payload: String) -> Result<(), ChannelError> {
        log::debug!("Egress {} from {}", kind, self.from);
        self.service
            .try_send(ServiceCommand::Message {
                from: self.from.clone(),
                kind: kind.into(),
                payload,
            })
            .map_err(|e| match e {
                TrySendError::Full(_) => ChannelError::Full,
                TrySendError::Closed(_) => ChannelError::Closed,
            })
    }
}
