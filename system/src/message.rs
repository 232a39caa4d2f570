use serde::{Deserialize, Serialize};

pub type ParticipantId = String;
pub type ObjectId = String;
pub type SessionId = String;

pub const SEND_SHAPES: &str = "sendShapes";
pub const SHAPE_TRANSFER: &str = "shapeTransfer";

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    Square,
    #[serde(other)]
    Other,
}

impl std::default::Default for ShapeKind {
    fn default() -> Self {
        ShapeKind::Other
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    pub kind: ShapeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDescriptor {
    pub display_name: String,
    pub shape_ids: Vec<ObjectId>,
}

/// Notification delivered by the replicated state channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelEvent {
    ParticipantAdded {
        participant_id: ParticipantId,
        descriptor: ParticipantDescriptor,
    },
    ParticipantRemoved {
        participant_id: ParticipantId,
    },
    ObjectAdded {
        object_id: ObjectId,
        descriptor: ObjectDescriptor,
    },
    ObjectRemoved {
        object_id: ObjectId,
    },
    /// Application level message. `payload` is JSON text.
    Message {
        kind: String,
        payload: String,
    },
}

/// Client -> service request. `player_id` names the receiving participant;
/// the service stamps the sender from the connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendShapes {
    pub shapes: Vec<ObjectId>,
    pub player_id: ParticipantId,
}

/// Service -> everyone broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeTransfer {
    pub sender_id: ParticipantId,
    pub receiver_id: ParticipantId,
    pub shapes: Vec<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferMessage {
    pub sender_id: ParticipantId,
    pub receiver_id: ParticipantId,
    pub object_ids: Vec<ObjectId>,
}

impl TransferMessage {
    pub fn to_request(&self) -> SendShapes {
        SendShapes {
            shapes: self.object_ids.clone(),
            player_id: self.receiver_id.clone(),
        }
    }
}

impl From<ShapeTransfer> for TransferMessage {
    fn from(transfer: ShapeTransfer) -> Self {
        Self {
            sender_id: transfer.sender_id,
            receiver_id: transfer.receiver_id,
            object_ids: transfer.shapes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_parse_unknown_kind_as_other() {
        let descriptor: ObjectDescriptor = serde_json::from_str(r#"{"kind":"triangle"}"#).unwrap();
        assert_eq!(descriptor.kind, ShapeKind::Other);
        let descriptor: ObjectDescriptor = serde_json::from_str(r#"{"kind":"circle"}"#).unwrap();
        assert_eq!(descriptor.kind, ShapeKind::Circle);
    }

    #[test]
    fn it_should_use_wire_field_names() {
        let request = SendShapes {
            shapes: vec!["s1".into(), "s2".into()],
            player_id: "b".into(),
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"shapes":["s1","s2"],"playerId":"b"}"#
        );

        let transfer: ShapeTransfer =
            serde_json::from_str(r#"{"senderId":"a","receiverId":"b","shapes":["s1"]}"#).unwrap();
        let message = TransferMessage::from(transfer);
        assert_eq!(message.sender_id, "a");
        assert_eq!(message.receiver_id, "b");
        assert_eq!(message.object_ids, vec!["s1".to_string()]);
    }
}
