use crate::codec::{decode_payload, encode_payload};
use crate::error::{CodecError, TransferError};
use crate::message::*;
use crate::mirror::ReplicaMirror;
use crate::registry::MaterializationRegistry;
use crate::selection::Selection;
use crate::traits::{Channel, Renderer};

pub struct TransferMessenger {
    local_id: ParticipantId,
}

/// What happened to an incoming `shapeTransfer`.
#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    /// Addressed to somebody else.
    Ignored,
    Accepted {
        message: TransferMessage,
        materialized: usize,
    },
}

impl TransferMessenger {
    pub fn new(local_id: ParticipantId) -> Self {
        Self { local_id }
    }

    /// Sends the whole selection to `receiver_id` and clears it. Nothing
    /// reaches the channel when the selection is empty. No ack is awaited.
    pub fn send(
        &self,
        selection: &mut Selection,
        receiver_id: &ParticipantId,
        channel: &mut dyn Channel,
    ) -> Result<TransferMessage, TransferError> {
        if !selection.has_pending() {
            log::debug!("Send requested with empty selection");
            return Err(TransferError::EmptySelection);
        }
        let message = TransferMessage {
            sender_id: self.local_id.clone(),
            receiver_id: receiver_id.clone(),
            object_ids: selection.committed().to_vec(),
        };
        let payload = encode_payload(&message.to_request())?;
        channel.send(SEND_SHAPES, payload)?;
        log::info!(
            "Sent {} shapes from {} to {}",
            message.object_ids.len(),
            message.sender_id,
            message.receiver_id
        );
        selection.clear();
        Ok(message)
    }

    /// Broadcast-and-filter receive path for `shapeTransfer` payloads. An
    /// accepted shape moves out of the sender's namespace into ours.
    pub fn receive(
        &self,
        payload: &str,
        mirror: &ReplicaMirror,
        registry: &mut MaterializationRegistry,
        renderer: &mut dyn Renderer,
    ) -> Result<Received, CodecError> {
        let transfer = decode_payload::<ShapeTransfer>(payload)?;
        if transfer.receiver_id != self.local_id {
            log::debug!(
                "Transfer from {} to {} is not for us",
                transfer.sender_id,
                transfer.receiver_id
            );
            return Ok(Received::Ignored);
        }

        let message = TransferMessage::from(transfer);
        log::info!(
            "Received {} shapes from {}",
            message.object_ids.len(),
            message.sender_id
        );
        let mut materialized = 0;
        for object_id in &message.object_ids {
            let descriptor = mirror.object(object_id);
            if descriptor.is_none() {
                log::warn!("No descriptor for received shape {}", object_id);
            }
            if message.sender_id != self.local_id
                && registry.release(renderer, &message.sender_id, object_id)
            {
                log::debug!("Released {} from {}", object_id, message.sender_id);
            }
            if registry.materialize(renderer, &self.local_id, object_id, descriptor) {
                materialized += 1;
            }
        }
        Ok(Received::Accepted {
            message,
            materialized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChannelError;
    use crate::registry::tests::{registry, CountingRenderer};
    use crate::types::VisualHandle;

    #[derive(Default)]
    struct RecordingChannel {
        sent: Vec<(String, String)>,
        fail_with: Option<ChannelError>,
    }

    impl Channel for RecordingChannel {
        fn send(&mut self, kind: &str, payload: String) -> Result<(), ChannelError> {
            if let Some(error) = self.fail_with.clone() {
                return Err(error);
            }
            self.sent.push((kind.into(), payload));
            Ok(())
        }
    }

    fn transfer(receiver: &str, shapes: &[&str]) -> String {
        serde_json::to_string(&ShapeTransfer {
            sender_id: "a".into(),
            receiver_id: receiver.into(),
            shapes: shapes.iter().map(|s| s.to_string()).collect(),
        })
        .unwrap()
    }

    #[test]
    fn it_should_reject_empty_selection_locally() {
        let messenger = TransferMessenger::new("a".into());
        let mut selection = Selection::new("a".into());
        let mut channel = RecordingChannel::default();

        let result = messenger.send(&mut selection, &"b".into(), &mut channel);
        assert!(matches!(result, Err(TransferError::EmptySelection)));
        assert!(channel.sent.is_empty());
    }

    #[test]
    fn it_should_send_selection_in_commit_order_and_clear() {
        let messenger = TransferMessenger::new("a".into());
        let mut selection = Selection::new("a".into());
        selection.commit("s2".into());
        selection.commit("s1".into());
        let mut channel = RecordingChannel::default();

        let message = messenger
            .send(&mut selection, &"b".into(), &mut channel)
            .unwrap();
        assert_eq!(message.object_ids, vec!["s2".to_string(), "s1".to_string()]);
        assert_eq!(
            channel.sent,
            vec![(
                SEND_SHAPES.to_string(),
                r#"{"shapes":["s2","s1"],"playerId":"b"}"#.to_string()
            )]
        );
        assert!(!selection.has_pending());
    }

    #[test]
    fn it_should_keep_selection_when_channel_fails() {
        let messenger = TransferMessenger::new("a".into());
        let mut selection = Selection::new("a".into());
        selection.commit("s1".into());
        let mut channel = RecordingChannel {
            fail_with: Some(ChannelError::Closed),
            ..Default::default()
        };

        let result = messenger.send(&mut selection, &"b".into(), &mut channel);
        assert!(matches!(
            result,
            Err(TransferError::Channel(ChannelError::Closed))
        ));
        assert!(selection.has_pending());
    }

    #[test]
    fn it_should_ignore_transfers_for_others() {
        let messenger = TransferMessenger::new("b".into());
        let mirror = ReplicaMirror::new();
        let mut registry = registry();
        let mut renderer = CountingRenderer::default();

        let received = messenger
            .receive(&transfer("c", &["s1"]), &mirror, &mut registry, &mut renderer)
            .unwrap();
        assert_eq!(received, Received::Ignored);
        assert!(renderer.materialized.is_empty());
    }

    #[test]
    fn it_should_materialize_redelivered_transfer_once() {
        let messenger = TransferMessenger::new("b".into());
        let mut mirror = ReplicaMirror::new();
        mirror.apply(ChannelEvent::ObjectAdded {
            object_id: "s1".into(),
            descriptor: ObjectDescriptor {
                kind: ShapeKind::Square,
            },
        });
        let mut registry = registry();
        let mut renderer = CountingRenderer::default();
        let payload = transfer("b", &["s1", "s9"]);

        let first = messenger
            .receive(&payload, &mirror, &mut registry, &mut renderer)
            .unwrap();
        let second = messenger
            .receive(&payload, &mirror, &mut registry, &mut renderer)
            .unwrap();

        assert!(matches!(first, Received::Accepted { materialized: 2, .. }));
        assert!(matches!(second, Received::Accepted { materialized: 0, .. }));
        assert_eq!(renderer.materialized.len(), 2);
        assert_eq!(renderer.materialized[0].1, ShapeKind::Square);
        assert_eq!(renderer.materialized[1].1, ShapeKind::Other);
    }

    #[test]
    fn it_should_move_received_shape_out_of_sender() {
        let messenger = TransferMessenger::new("b".into());
        let mirror = ReplicaMirror::new();
        let mut registry = registry();
        let mut renderer = CountingRenderer::default();
        let position = crate::euclid::default::Point3D::new(-2.0, 0.5, 2.5);
        registry.place(&mut renderer, &"a".into(), &"a1".into(), ShapeKind::Circle, position);
        registry.place(&mut renderer, &"a".into(), &"a2".into(), ShapeKind::Square, position);

        let payload = transfer("b", &["a1"]);
        messenger
            .receive(&payload, &mirror, &mut registry, &mut renderer)
            .unwrap();
        messenger
            .receive(&payload, &mirror, &mut registry, &mut renderer)
            .unwrap();

        assert_eq!(registry.owned_object_ids(&"a".into()), vec!["a2".to_string()]);
        assert_eq!(registry.owned_object_ids(&"b".into()), vec!["a1".to_string()]);
        assert_eq!(renderer.disposed, vec![VisualHandle(1)]);
        let live_copies = renderer
            .materialized
            .iter()
            .enumerate()
            .filter(|(i, (id, ..))| {
                id == "a1" && !renderer.disposed.contains(&VisualHandle(*i as u32 + 1))
            })
            .count();
        assert_eq!(live_copies, 1);
    }

    #[test]
    fn it_should_surface_malformed_payload() {
        let messenger = TransferMessenger::new("b".into());
        let mirror = ReplicaMirror::new();
        let mut registry = registry();
        let mut renderer = CountingRenderer::default();
        assert!(messenger
            .receive("not json", &mirror, &mut registry, &mut renderer)
            .is_err());
    }
}
