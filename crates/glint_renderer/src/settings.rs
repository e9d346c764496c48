//! Render settings.
//!
//! Every user-tunable number passes through [`RenderSettings::validate`]
//! before it reaches the camera, tracer or controller, so the render path
//! never sees an out-of-range value.

use crate::{Camera, PathTracer, RenderController};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid setting `{name}`: {reason}")]
    OutOfRange { name: &'static str, reason: String },

    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// User-facing render parameters. Missing JSON fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Vertical field of view in degrees
    pub fov: f64,
    pub aperture: f64,
    pub focus_distance: f64,
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    pub movement_speed: f64,
    pub max_depth: u32,
    /// Minimum time between progress callbacks, in milliseconds
    pub repaint_interval_ms: u64,
    pub batch_size: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            fov: 90.0,
            aperture: 0.1,
            focus_distance: 10.0,
            width: 400,
            height: 400,
            samples_per_pixel: 5,
            movement_speed: 0.1,
            max_depth: 7,
            repaint_interval_ms: 50,
            batch_size: 50,
        }
    }
}

fn out_of_range(name: &'static str, reason: impl Into<String>) -> SettingsError {
    SettingsError::OutOfRange {
        name,
        reason: reason.into(),
    }
}

impl RenderSettings {
    /// Parse from JSON and validate.
    pub fn from_json(json: &str) -> SettingsResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load a JSON settings file and validate it.
    pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref();
        log::debug!("Loading settings from {}", path.display());
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> SettingsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> SettingsResult<()> {
        let result = self.check();
        if let Err(err) = &result {
            log::warn!("Rejected settings: {err}");
        }
        result
    }

    fn check(&self) -> SettingsResult<()> {
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(out_of_range("fov", format!("{} is not in (0, 180)", self.fov)));
        }
        if self.aperture < 0.0 || !self.aperture.is_finite() {
            return Err(out_of_range("aperture", format!("{} is negative", self.aperture)));
        }
        if self.focus_distance <= 0.0 || !self.focus_distance.is_finite() {
            return Err(out_of_range(
                "focus_distance",
                format!("{} is not positive", self.focus_distance),
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(out_of_range(
                "resolution",
                format!("{}x{} is empty", self.width, self.height),
            ));
        }
        if self.samples_per_pixel == 0 {
            return Err(out_of_range("samples_per_pixel", "must be at least 1"));
        }
        if self.movement_speed <= 0.0 || !self.movement_speed.is_finite() {
            return Err(out_of_range(
                "movement_speed",
                format!("{} is not positive", self.movement_speed),
            ));
        }
        if self.max_depth == 0 {
            return Err(out_of_range("max_depth", "must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(out_of_range("batch_size", "must be at least 1"));
        }
        Ok(())
    }

    pub fn repaint_interval(&self) -> Duration {
        Duration::from_millis(self.repaint_interval_ms)
    }

    /// Validate, then push every value to its owner.
    pub fn apply(
        &self,
        camera: &mut Camera,
        tracer: &mut PathTracer,
        controller: &mut RenderController,
    ) -> SettingsResult<()> {
        self.validate()?;

        camera.set_vfov(self.fov);
        camera.set_aperture(self.aperture);
        camera.set_focus_distance(self.focus_distance);
        camera.set_resolution(self.width, self.height);
        camera.set_samples_per_pixel(self.samples_per_pixel);
        camera.set_movement_speed(self.movement_speed);

        tracer.set_max_depth(self.max_depth);

        controller.set_repaint_interval(self.repaint_interval());
        controller.set_batch_size(self.batch_size);
        Ok(())
    }
}
