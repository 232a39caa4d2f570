use crate::euclid::default::{Box3D, Point3D, Vector3D};
use crate::message::{ObjectId, ShapeKind};
use serde::{Deserialize, Serialize};

pub type Position = Point3D<f32>;
pub type Bounds = Box3D<f32>;

/// Opaque id handed out by the renderer for a materialized shape.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct VisualHandle(pub u32);

/// Point on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroundPoint {
    pub x: f32,
    pub z: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickResult {
    pub hit: bool,
    pub picked_id: Option<ObjectId>,
    pub picked_point: GroundPoint,
}

impl PickResult {
    pub fn on(object_id: &str, x: f32, z: f32) -> Self {
        Self {
            hit: true,
            picked_id: Some(object_id.into()),
            picked_point: GroundPoint { x, z },
        }
    }

    pub fn ground(x: f32, z: f32) -> Self {
        Self {
            hit: true,
            picked_id: None,
            picked_point: GroundPoint { x, z },
        }
    }

    pub fn miss() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down(PickResult),
    Move(PickResult),
    Up,
}

impl ShapeKind {
    fn half_extents(&self) -> Vector3D<f32> {
        match self {
            // sphere, diameter 0.8
            ShapeKind::Circle => Vector3D::new(0.4, 0.4, 0.4),
            // cube, size 0.8
            ShapeKind::Square => Vector3D::new(0.4, 0.4, 0.4),
            // upright capsule, radius 0.5, height 2
            ShapeKind::Other => Vector3D::new(0.5, 1.0, 0.5),
        }
    }

    pub fn bounds_at(&self, position: Position) -> Bounds {
        let half = self.half_extents();
        Box3D::new(position - half, position + half)
    }
}
