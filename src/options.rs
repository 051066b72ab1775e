//! Live-tunable settings for the world, camera, controls and lighting.
//!
//! Everything the UI shell can fiddle with lives here. Options serialize to
//! and from TOML; every sub-struct uses `#[serde(default)]` so a partial file
//! only overrides what it names.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::error::OrreryError;

/// Beyond this level the icosphere no longer fits comfortably in one draw.
pub const MAX_SUBDIVISIONS: u32 = 7;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Options {
    pub world: WorldOptions,
    pub camera: CameraOptions,
    pub controls: ControlOptions,
    pub lighting: LightingOptions,
}

/// How body meshes are rasterized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    #[serde(alias = "dots")]
    Points,
    Lines,
    Fill,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldOptions {
    /// Simulated time units per real second.
    pub time_scale: f64,
    /// Icosphere subdivision level.
    pub subdivisions: u32,
    pub fill_mode: FillMode,
    /// Longest real-time gap (seconds) a single frame may advance by.
    pub max_frame_delta: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraOptions {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Cone angle of the forward-facing torch light, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torch_fov: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlOptions {
    pub move_step: f32,
    pub angle_step: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingOptions {
    /// Fraction of the base color that is always visible.
    pub ambient: f32,
    /// Clamp the diffuse term at zero instead of letting it darken.
    pub clamp_diffuse: bool,
}

impl Default for WorldOptions {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            subdivisions: 4,
            fill_mode: FillMode::Points,
            max_frame_delta: 0.25,
        }
    }
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            fov: 1.5,
            near: 0.1,
            far: 1000.0,
            torch_fov: None,
        }
    }
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            move_step: 0.1,
            angle_step: 0.1,
        }
    }
}

impl Default for LightingOptions {
    fn default() -> Self {
        Self {
            ambient: 0.4,
            clamp_diffuse: false,
        }
    }
}

impl Options {
    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, OrreryError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate options from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, OrreryError> {
        let options: Options = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), OrreryError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| OrreryError::Parse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), OrreryError> {
        self.world.validate()?;
        // The camera constructor owns the projection rules
        Camera::from_options(&self.camera)?;
        self.controls.validate()?;
        self.lighting.validate()
    }
}

impl WorldOptions {
    pub fn validate(&self) -> Result<(), OrreryError> {
        if !(self.time_scale >= 0.0 && self.time_scale.is_finite()) {
            return Err(OrreryError::Configuration(format!(
                "time scale must be finite and non-negative, got {}",
                self.time_scale
            )));
        }
        if self.subdivisions > MAX_SUBDIVISIONS {
            return Err(OrreryError::Configuration(format!(
                "subdivision level {} exceeds the maximum of {}",
                self.subdivisions, MAX_SUBDIVISIONS
            )));
        }
        if !(self.max_frame_delta > 0.0 && self.max_frame_delta.is_finite()) {
            return Err(OrreryError::Configuration(format!(
                "maximum frame delta must be positive, got {}",
                self.max_frame_delta
            )));
        }
        Ok(())
    }
}

impl ControlOptions {
    pub fn validate(&self) -> Result<(), OrreryError> {
        if !(self.move_step.is_finite() && self.angle_step.is_finite()) {
            return Err(OrreryError::Configuration(
                "control steps must be finite".to_owned(),
            ));
        }
        Ok(())
    }
}

impl LightingOptions {
    pub fn validate(&self) -> Result<(), OrreryError> {
        if !(0.0..=1.0).contains(&self.ambient) {
            return Err(OrreryError::Configuration(format!(
                "ambient strength must lie in [0, 1], got {}",
                self.ambient
            )));
        }
        Ok(())
    }
}
