use std::collections::HashMap;
use system::{ObjectId, Position, Renderer, SendAffordance, ShapeKind, VisualHandle};

/// Renderer that only keeps track of live shapes and logs what it would draw.
pub struct LogRenderer {
    label: String,
    next_handle: u32,
    live: HashMap<VisualHandle, ObjectId>,
}

impl LogRenderer {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.into(),
            next_handle: 0,
            live: HashMap::new(),
        }
    }
}

impl Renderer for LogRenderer {
    fn materialize(
        &mut self,
        object_id: &ObjectId,
        kind: ShapeKind,
        position: Position,
    ) -> VisualHandle {
        self.next_handle += 1;
        let handle = VisualHandle(self.next_handle);
        log::debug!(
            "[{}] create {:?} {} at ({}, {}, {})",
            self.label,
            kind,
            object_id,
            position.x,
            position.y,
            position.z
        );
        self.live.insert(handle, object_id.clone());
        handle
    }

    fn set_position(&mut self, handle: VisualHandle, position: Position) {
        log::trace!(
            "[{}] move {:?} to ({}, {})",
            self.label,
            handle,
            position.x,
            position.z
        );
    }

    fn dispose(&mut self, handle: VisualHandle) {
        match self.live.remove(&handle) {
            Some(object_id) => log::debug!("[{}] dispose {}", self.label, object_id),
            None => log::warn!("[{}] dispose of unknown {:?}", self.label, handle),
        }
    }
}

pub struct LogAffordance {
    label: String,
}

impl LogAffordance {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl SendAffordance for LogAffordance {
    fn set_enabled(&mut self, enabled: bool) {
        log::info!("[{}] send button enabled: {}", self.label, enabled);
    }
}
