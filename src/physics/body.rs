use std::time::Instant;

use glam::Vec3;

use super::tween::Tween;
use crate::types::Transform;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub(crate) u32);

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a body stands for in the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyTag {
    /// The object gestures act on (e.g. an uploaded image).
    Manipulated,
    /// Root of the whole scene, used for ambient rotation.
    SceneRoot,
    Other,
}

/// Z-only spring toward `target_z`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthSpring {
    pub current_z: f32,
    pub velocity_z: f32,
    pub target_z: f32,
}

impl DepthSpring {
    pub fn at_rest(z: f32) -> Self {
        Self {
            current_z: z,
            velocity_z: 0.0,
            target_z: z,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct DragState {
    pub reference_point: Vec3,
    pub start_position: Vec3,
    pub last_position: Vec3,
    pub last_time: Instant,
}

#[derive(Clone, Debug)]
pub struct PhysicsBody {
    pub transform: Transform,
    pub velocity: Vec3,
    pub rotation_velocity: Vec3,
    pub mass: f32,
    pub is_dragging: bool,
    pub is_locked: bool,
    pub spring: DepthSpring,
    /// Captured once at registration; the reset target.
    pub original: Transform,
    pub tag: BodyTag,
    pub(crate) drag: Option<DragState>,
    pub(crate) tween: Option<Tween>,
}

impl PhysicsBody {
    pub(crate) fn new(transform: Transform, mass: f32, tag: BodyTag) -> Self {
        Self {
            transform,
            velocity: Vec3::ZERO,
            rotation_velocity: Vec3::ZERO,
            mass,
            is_dragging: false,
            is_locked: false,
            spring: DepthSpring::at_rest(transform.position.z),
            original: transform,
            tag,
            drag: None,
            tween: None,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.transform.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.transform.scale
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    pub(crate) fn stop_motion(&mut self) {
        self.velocity = Vec3::ZERO;
        self.rotation_velocity = Vec3::ZERO;
        self.spring.velocity_z = 0.0;
    }
}
