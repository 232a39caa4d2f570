use crate::error::ChannelError;
use crate::message::{ObjectId, ShapeKind};
use crate::types::{Position, VisualHandle};

/// Outgoing half of the replicated state channel.
pub trait Channel {
    fn send(&mut self, kind: &str, payload: String) -> Result<(), ChannelError>;
}

pub trait Renderer {
    fn materialize(&mut self, object_id: &ObjectId, kind: ShapeKind, position: Position)
        -> VisualHandle;
    fn set_position(&mut self, handle: VisualHandle, position: Position);
    fn dispose(&mut self, handle: VisualHandle);
}

/// The send button. Enabled while the selection holds something.
pub trait SendAffordance {
    fn set_enabled(&mut self, enabled: bool);
}
