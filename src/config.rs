use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// How the pinch confidence is modelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinchModel {
    /// Distance gate plus both thumb and index bent toward each other.
    Bent,
    /// Plain distance gate; confidence is the distance term alone.
    DistanceOnly,
}

/// How damping factors are applied per integrator call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DampingMode {
    /// Multiply once per call regardless of `dt`.
    PerStep,
    /// `damping^(dt / REFERENCE_DT)`, identical to `PerStep` at 60 Hz.
    FrameRateIndependent,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub pinch_threshold: f32,
    pub pinch_model: PinchModel,
    pub open_palm_threshold: f32,
    pub closed_fist_threshold: f32,
    pub two_hand_zoom_threshold: f32,
    pub confidence_threshold: f32,
    /// Use `>=` instead of `>` against `confidence_threshold`.
    pub inclusive_threshold: bool,
    pub smoothing_factor: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            pinch_threshold: 0.06,
            pinch_model: PinchModel::Bent,
            open_palm_threshold: 0.7,
            closed_fist_threshold: 0.5,
            two_hand_zoom_threshold: 0.02,
            confidence_threshold: 0.65,
            inclusive_threshold: false,
            smoothing_factor: 0.3,
        }
    }
}

impl GestureConfig {
    /// The simpler distance-only pinch used by older builds.
    pub fn legacy() -> Self {
        Self {
            pinch_model: PinchModel::DistanceOnly,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub position_damping: f32,
    pub rotation_damping: f32,
    pub spring_stiffness: f32,
    pub spring_damping: f32,
    pub enable_snap: bool,
    pub snap_grid_size: f32,
    pub max_velocity: f32,
    pub max_rotation_speed: f32,
    pub damping_mode: DampingMode,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            position_damping: 0.85,
            rotation_damping: 0.9,
            spring_stiffness: 120.0,
            spring_damping: 22.0,
            enable_snap: false,
            snap_grid_size: 0.1,
            max_velocity: 10.0,
            max_rotation_speed: 6.0,
            damping_mode: DampingMode::FrameRateIndependent,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Minimum index-tip travel between draw samples.
    pub move_epsilon: f32,
    pub save_debounce_ms: u64,
    pub pinch_release_confidence: f32,
    pub drag_confidence: f32,
    pub zoom_confidence: f32,
    pub camera_zoom_step: f32,
    pub image_scale_step: f32,
    pub camera_distance: f32,
    pub camera_distance_range: (f32, f32),
    pub image_scale_range: (f32, f32),
    /// Fraction of the rotation angle applied directly on top of the impulse.
    pub direct_rotation_factor: f32,
    pub rotation_impulse_gain: f32,
    pub world_extent: f32,
    pub brush_color: u32,
    pub brush_size: f32,
    pub erase_radius: f32,
    pub reset_duration_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            move_epsilon: 0.008,
            save_debounce_ms: 500,
            pinch_release_confidence: 0.5,
            drag_confidence: 0.4,
            zoom_confidence: 0.6,
            camera_zoom_step: 0.5,
            image_scale_step: 0.1,
            camera_distance: 8.0,
            camera_distance_range: (1.0, 20.0),
            image_scale_range: (0.5, 10.0),
            direct_rotation_factor: 0.1,
            rotation_impulse_gain: 1.0,
            world_extent: 5.0,
            brush_color: 0x00ff88,
            brush_size: 0.2,
            erase_radius: 0.3,
            reset_duration_ms: 600,
        }
    }
}

impl ControllerConfig {
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn reset_duration(&self) -> Duration {
        Duration::from_millis(self.reset_duration_ms)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gesture: GestureConfig,
    pub physics: PhysicsConfig,
    pub controller: ControllerConfig,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let g = &self.gesture;
        unit_interval("gesture.smoothing_factor", g.smoothing_factor)?;
        unit_interval("gesture.confidence_threshold", g.confidence_threshold)?;
        unit_interval("gesture.open_palm_threshold", g.open_palm_threshold)?;
        unit_interval("gesture.closed_fist_threshold", g.closed_fist_threshold)?;
        positive("gesture.pinch_threshold", g.pinch_threshold)?;
        positive("gesture.two_hand_zoom_threshold", g.two_hand_zoom_threshold)?;

        let p = &self.physics;
        unit_interval("physics.position_damping", p.position_damping)?;
        unit_interval("physics.rotation_damping", p.rotation_damping)?;
        positive("physics.spring_stiffness", p.spring_stiffness)?;
        positive("physics.spring_damping", p.spring_damping)?;
        positive("physics.snap_grid_size", p.snap_grid_size)?;
        positive("physics.max_velocity", p.max_velocity)?;
        positive("physics.max_rotation_speed", p.max_rotation_speed)?;

        let c = &self.controller;
        positive("controller.move_epsilon", c.move_epsilon)?;
        positive("controller.world_extent", c.world_extent)?;
        ordered_range("controller.camera_distance_range", c.camera_distance_range)?;
        ordered_range("controller.image_scale_range", c.image_scale_range)?;
        Ok(())
    }
}

/// Accepts (0, 1].
fn unit_interval(name: &str, value: f32) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(CoreError::InvalidConfig(format!(
            "{name} must be in (0, 1], got {value}"
        )))
    }
}

fn positive(name: &str, value: f32) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CoreError::InvalidConfig(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

fn ordered_range(name: &str, (min, max): (f32, f32)) -> Result<()> {
    if min.is_finite() && max.is_finite() && min > 0.0 && min <= max {
        Ok(())
    } else {
        Err(CoreError::InvalidConfig(format!(
            "{name} must satisfy 0 < min <= max, got ({min}, {max})"
        )))
    }
}
