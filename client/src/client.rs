use std::time::Duration;
use system::{
    decode_event, ClientSession, ParticipantId, PointerEvent, Renderer, SendAffordance,
    SessionConfig, SessionView,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::connection::{Connection, ServiceChannel};
use crate::service::ServiceCommand;

#[derive(Debug)]
pub enum ClientInput {
    Pointer(PointerEvent),
    Send { receiver_id: ParticipantId },
    Inspect(oneshot::Sender<SessionView>),
    Leave,
}

/// Cheap handle to a running client loop.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    participant_id: ParticipantId,
    tx: mpsc::Sender<ClientInput>,
}

impl ClientHandle {
    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    /// Returns `false` once the loop has stopped.
    pub async fn pointer(&self, event: PointerEvent) -> bool {
        self.tx.send(ClientInput::Pointer(event)).await.is_ok()
    }

    pub async fn send_to(&self, receiver_id: &ParticipantId) -> bool {
        self.tx
            .send(ClientInput::Send {
                receiver_id: receiver_id.clone(),
            })
            .await
            .is_ok()
    }

    pub async fn view(&self) -> Option<SessionView> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(ClientInput::Inspect(reply_tx)).await.ok()?;
        reply_rx.await.ok()
    }

    /// Polls the view until `predicate` holds or `timeout` passes.
    pub async fn wait_for<F>(&self, predicate: F, timeout: Duration) -> Option<SessionView>
    where
        F: Fn(&SessionView) -> bool,
    {
        let poll = async {
            loop {
                let view = match self.view().await {
                    Some(view) => view,
                    None => return None,
                };
                if predicate(&view) {
                    return Some(view);
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.ok().flatten()
    }

    pub async fn leave(&self) {
        let _ = self.tx.send(ClientInput::Leave).await;
    }
}

/// Runs the session of one participant on its own task. Channel frames and
/// local input are applied one at a time, each to completion.
pub fn spawn_client<R, A>(
    connection: Connection,
    config: SessionConfig,
    renderer: R,
    affordance: A,
) -> (ClientHandle, JoinHandle<()>)
where
    R: Renderer + Send + 'static,
    A: SendAffordance + Send + 'static,
{
    let Connection {
        handle,
        mut frames,
        service,
    } = connection;
    let participant_id = handle.participant_id;
    let (tx, mut rx) = mpsc::channel::<ClientInput>(32);
    let channel = ServiceChannel::new(participant_id.clone(), service.clone());
    let mut session = ClientSession::new(
        participant_id.clone(),
        config,
        channel,
        renderer,
        affordance,
    );

    let local_id = participant_id.clone();
    let roster_owner = local_id.clone();
    session
        .mirror_mut()
        .on_participant_added(move |participant, count| {
            log::info!(
                "[{}] {} joined, {} present",
                roster_owner,
                participant.display_name,
                count
            )
        });
    let roster_owner = local_id.clone();
    session
        .mirror_mut()
        .on_participant_removed(move |participant, count| {
            log::info!(
                "[{}] {} left, {} present",
                roster_owner,
                participant.display_name,
                count
            )
        });
    let task = tokio::spawn(async move {
        log::info!("client loop - started ({})", local_id);
        loop {
            tokio::select! {
                frame = frames.recv() => match frame {
                    Some(bytes) => match decode_event(&bytes) {
                        Ok(event) => {
                            log::debug!("Ingress {:?}", event);
                            session.handle_channel_event(event)
                        }
                        Err(e) => log::warn!("Dropping undecodable frame: {}", e),
                    },
                    None => {
                        log::info!("Session service closed the connection");
                        break;
                    }
                },
                input = rx.recv() => match input {
                    Some(ClientInput::Pointer(event)) => session.handle_pointer_event(event),
                    Some(ClientInput::Send { receiver_id }) => {
                        let _ = session.send_selection(&receiver_id);
                    }
                    Some(ClientInput::Inspect(reply)) => {
                        let _ = reply.send(session.view());
                    }
                    Some(ClientInput::Leave) | None => {
                        if service
                            .send(ServiceCommand::Leave { from: local_id.clone() })
                            .await
                            .is_err()
                        {
                            log::warn!("Session service is gone, leaving anyway");
                        }
                        break;
                    }
                },
            }
        }
        log::info!("client loop - terminated ({})", local_id);
    });

    (ClientHandle { participant_id, tx }, task)
}
