use crate::error::ConfigError;
use crate::euclid::default::{Box3D, Point3D};
use crate::types::{Bounds, Position};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

pub const DEFAULT_QUORUM: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Participant count that triggers assignment.
    pub quorum: usize,
    pub layout: GridLayout,
    pub send_zone: Zone,
    /// Received shapes land at a random spot inside this area.
    pub receive_area: Zone,
}

impl std::default::Default for SessionConfig {
    fn default() -> Self {
        Self {
            quorum: DEFAULT_QUORUM,
            layout: GridLayout::default(),
            send_zone: Zone {
                center: [1.0, 0.5, 4.0],
                width: 8.0,
                depth: 1.0,
            },
            receive_area: Zone {
                center: [-1.5, 0.5, 6.0],
                width: 6.0,
                depth: 1.0,
            },
        }
    }
}

impl SessionConfig {
    /// Parses and validates. Out-of-range numbers that serde accepts
    /// (`1e39` becomes `inf` in an f32) are rejected here.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quorum == 0 {
            return Err(ConfigError::Invalid("quorum must be at least 1".into()));
        }
        self.layout.validate()?;
        self.send_zone.validate("send_zone")?;
        self.receive_area.validate("receive_area")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub base_x: f32,
    pub height: f32,
    pub base_z: f32,
    pub columns: usize,
    pub rows: usize,
    pub spacing: f32,
}

impl std::default::Default for GridLayout {
    fn default() -> Self {
        Self {
            base_x: -2.0,
            height: 0.5,
            base_z: 2.5,
            columns: 5,
            rows: 2,
            spacing: 1.5,
        }
    }
}

impl GridLayout {
    fn validate(&self) -> Result<(), ConfigError> {
        if ![self.base_x, self.height, self.base_z, self.spacing]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(ConfigError::Invalid("layout values must be finite".into()));
        }
        if self.columns == 0 || self.rows == 0 {
            return Err(ConfigError::Invalid(
                "layout needs at least one column and row".into(),
            ));
        }
        Ok(())
    }

    pub fn position(&self, index: usize) -> Position {
        let column = index % self.columns.max(1);
        let row = index % self.rows.max(1);
        Point3D::new(
            self.base_x + column as f32,
            self.height,
            self.base_z - row as f32 * self.spacing,
        )
    }
}

/// Flat rectangle lying on the ground plane at `center[1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub center: [f32; 3],
    pub width: f32,
    pub depth: f32,
}

impl Zone {
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if !self.center.iter().all(|v| v.is_finite()) {
            return Err(ConfigError::Invalid(format!("{} center must be finite", name)));
        }
        if !(self.width.is_finite() && self.width >= 0.0)
            || !(self.depth.is_finite() && self.depth >= 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "{} size must be finite and non-negative",
                name
            )));
        }
        Ok(())
    }

    pub fn bounds(&self) -> Bounds {
        let [x, y, z] = self.center;
        Box3D::new(
            Point3D::new(x - self.width / 2.0, y, z - self.depth / 2.0),
            Point3D::new(x + self.width / 2.0, y, z + self.depth / 2.0),
        )
    }

    pub fn random_position(&self, rng: &mut dyn RngCore) -> Position {
        let [x, y, z] = self.center;
        let dx = jitter(&mut *rng, self.width);
        let dz = jitter(&mut *rng, self.depth);
        Point3D::new(x + dx, y, z + dz)
    }
}

fn jitter(rng: &mut dyn RngCore, extent: f32) -> f32 {
    if extent.is_finite() && extent > 0.0 {
        rng.gen_range(-extent / 2.0..extent / 2.0)
    } else {
        0.0
    }
}
