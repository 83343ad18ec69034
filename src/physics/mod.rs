//! Inertia, depth spring, grid snap, drag and tweens for registered bodies.
//!
//! `update(dt)` is the fixed-step integrator driven by the render tick.
//! Tweens run on wall-clock time through `advance_tweens(now)` and own the
//! body's transform while in flight; the integrator skips such bodies.

pub mod body;
pub mod easing;
pub mod tween;

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use glam::Vec3;

pub use body::{BodyId, BodyTag, DepthSpring, PhysicsBody};
pub use easing::Easing;
pub use tween::{Tween, TweenId};

use crate::{
    config::{DampingMode, PhysicsConfig},
    error::{CoreError, Result},
    types::Transform,
};

/// Velocities below this are treated as rest.
pub const REST_EPSILON: f32 = 1e-4;
/// Spring snaps onto its target once displacement and speed fall below this.
pub const SPRING_EPSILON: f32 = 1e-3;
/// Step the damping factors are expressed for.
pub const REFERENCE_DT: f32 = 1.0 / 60.0;
const MIN_MASS: f32 = 1e-3;

/// Rounds to the nearest multiple of `grid`.
pub fn snap(value: f32, grid: f32) -> f32 {
    (value / grid).round() * grid
}

fn damping_factor(base: f32, dt: f32, mode: DampingMode) -> f32 {
    match mode {
        DampingMode::PerStep => base,
        DampingMode::FrameRateIndependent => base.powf(dt / REFERENCE_DT),
    }
}

fn clamp_axes(v: Vec3, limit: f32) -> Vec3 {
    v.clamp(Vec3::splat(-limit), Vec3::splat(limit))
}

pub struct PhysicsWorld {
    config: PhysicsConfig,
    bodies: HashMap<BodyId, PhysicsBody>,
    next_body: u32,
    next_tween: u64,
}

impl PhysicsWorld {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            bodies: HashMap::new(),
            next_body: 1,
            next_tween: 1,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn register(&mut self, transform: Transform, mass: f32, tag: BodyTag) -> BodyId {
        let id = BodyId(self.next_body);
        self.next_body += 1;
        self.bodies
            .insert(id, PhysicsBody::new(transform, mass.max(MIN_MASS), tag));
        log::debug!("registered body {id} ({tag:?})");
        id
    }

    pub fn unregister(&mut self, id: BodyId) -> Result<PhysicsBody> {
        self.bodies
            .remove(&id)
            .ok_or(CoreError::UnregisteredBody(id))
    }

    pub fn body(&self, id: BodyId) -> Result<&PhysicsBody> {
        self.bodies.get(&id).ok_or(CoreError::UnregisteredBody(id))
    }

    fn body_mut(&mut self, id: BodyId) -> Result<&mut PhysicsBody> {
        self.bodies
            .get_mut(&id)
            .ok_or(CoreError::UnregisteredBody(id))
    }

    pub fn transform(&self, id: BodyId) -> Result<Transform> {
        self.body(id).map(|b| b.transform)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Ids carrying `tag`, in registration order.
    pub fn bodies_with_tag(&self, tag: BodyTag) -> Vec<BodyId> {
        let mut ids: Vec<BodyId> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.tag == tag)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn set_locked(&mut self, id: BodyId, locked: bool) -> Result<()> {
        self.body_mut(id)?.is_locked = locked;
        Ok(())
    }

    pub fn set_depth_target(&mut self, id: BodyId, target_z: f32) -> Result<()> {
        self.body_mut(id)?.spring.target_z = target_z;
        Ok(())
    }

    pub fn set_uniform_scale(&mut self, id: BodyId, scale: f32) -> Result<()> {
        self.body_mut(id)?.transform.scale = Vec3::splat(scale);
        Ok(())
    }

    /// Adds `delta` straight onto the Euler angles, bypassing inertia.
    pub fn rotate_by(&mut self, id: BodyId, delta: Vec3) -> Result<()> {
        let body = self.body_mut(id)?;
        if !body.is_locked {
            body.transform.rotation += delta;
        }
        Ok(())
    }

    pub fn apply_impulse(&mut self, id: BodyId, force: Vec3) -> Result<()> {
        let max_velocity = self.config.max_velocity;
        let body = self.body_mut(id)?;
        if body.is_locked {
            return Ok(());
        }
        body.velocity = (body.velocity + force / body.mass).clamp_length_max(max_velocity);
        Ok(())
    }

    pub fn apply_rotation_impulse(&mut self, id: BodyId, torque: Vec3) -> Result<()> {
        let limit = self.config.max_rotation_speed;
        let body = self.body_mut(id)?;
        if body.is_locked {
            return Ok(());
        }
        body.rotation_velocity = clamp_axes(body.rotation_velocity + torque / body.mass, limit);
        Ok(())
    }

    /// Advances every free body by one integrator step.
    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        let config = &self.config;
        let position_damping = damping_factor(config.position_damping, dt, config.damping_mode);
        let rotation_damping = damping_factor(config.rotation_damping, dt, config.damping_mode);

        for body in self.bodies.values_mut() {
            if body.is_locked || body.tween.is_some() {
                continue;
            }

            if !body.is_dragging {
                body.transform.position += body.velocity * dt;
                body.velocity *= position_damping;
                if body.velocity.length() < REST_EPSILON {
                    body.velocity = Vec3::ZERO;
                }
            }

            body.rotation_velocity = clamp_axes(body.rotation_velocity, config.max_rotation_speed);
            body.transform.rotation += body.rotation_velocity * dt;
            body.rotation_velocity *= rotation_damping;
            for axis in 0..3 {
                if body.rotation_velocity[axis].abs() < REST_EPSILON {
                    body.rotation_velocity[axis] = 0.0;
                }
            }

            if !body.is_dragging {
                step_spring(body, config.spring_stiffness, config.spring_damping, dt);
            }

            if config.enable_snap && !body.is_dragging {
                let grid = config.snap_grid_size;
                body.transform.position.x = snap(body.transform.position.x, grid);
                body.transform.position.y = snap(body.transform.position.y, grid);
            }
        }
    }

    pub fn start_drag(&mut self, id: BodyId, point: Vec3, now: Instant) -> Result<()> {
        let body = self.body_mut(id)?;
        if body.is_locked {
            log::debug!("ignoring drag on locked body {id}");
            return Ok(());
        }
        body.stop_motion();
        body.is_dragging = true;
        body.drag = Some(body::DragState {
            reference_point: point,
            start_position: body.transform.position,
            last_position: body.transform.position,
            last_time: now,
        });
        Ok(())
    }

    pub fn update_drag(&mut self, id: BodyId, point: Vec3, now: Instant) -> Result<()> {
        let enable_snap = self.config.enable_snap;
        let grid = self.config.snap_grid_size;
        let max_velocity = self.config.max_velocity;
        let body = self.body_mut(id)?;
        let Some(drag) = body.drag.as_mut() else {
            return Ok(());
        };

        let mut delta = point - drag.reference_point;
        if enable_snap {
            delta.x = snap(delta.x, grid);
            delta.y = snap(delta.y, grid);
        }
        let position = drag.start_position + delta;

        let dt = now
            .checked_duration_since(drag.last_time)
            .map(|d| d.as_secs_f32())
            .unwrap_or(0.0);
        if dt > 0.0 {
            body.velocity = ((position - drag.last_position) / dt).clamp_length_max(max_velocity);
            drag.last_time = now;
        }
        drag.last_position = position;
        body.transform.position = position;
        Ok(())
    }

    /// Releases the drag; the velocity recorded while dragging keeps coasting.
    pub fn end_drag(&mut self, id: BodyId) -> Result<()> {
        let body = self.body_mut(id)?;
        body.is_dragging = false;
        body.drag = None;
        Ok(())
    }

    /// Starts a tween to `target`, superseding any tween already on the body.
    pub fn animate_to(
        &mut self,
        id: BodyId,
        target: Transform,
        duration: Duration,
        easing: Easing,
        now: Instant,
    ) -> Result<TweenId> {
        let tween_id = TweenId(self.next_tween);
        let body = self.body_mut(id)?;
        if let Some(previous) = body.tween.take() {
            log::debug!("tween {:?} on body {id} superseded", previous.id);
        }
        body.tween = Some(Tween {
            id: tween_id,
            from: body.transform,
            to: target,
            start: now,
            duration,
            easing,
        });
        self.next_tween += 1;
        Ok(tween_id)
    }

    pub fn animate_to_named(
        &mut self,
        id: BodyId,
        target: Transform,
        duration: Duration,
        easing: &str,
        now: Instant,
    ) -> Result<TweenId> {
        self.animate_to(id, target, duration, Easing::from_name_or_default(easing), now)
    }

    /// Samples in-flight tweens at `now`; returns the ones that finished.
    pub fn advance_tweens(&mut self, now: Instant) -> Vec<TweenId> {
        let mut finished = Vec::new();
        for body in self.bodies.values_mut() {
            let Some(tween) = body.tween else {
                continue;
            };
            let elapsed = now.saturating_duration_since(tween.start);
            body.transform = tween.sample(elapsed);
            if tween.is_complete(elapsed) {
                body.tween = None;
                finished.push(tween.id);
            }
        }
        finished.sort();
        finished
    }

    /// Restores the registered transform and clears all motion.
    pub fn reset_object(
        &mut self,
        id: BodyId,
        animate: bool,
        duration: Duration,
        now: Instant,
    ) -> Result<Option<TweenId>> {
        let body = self.body_mut(id)?;
        body.stop_motion();
        body.is_dragging = false;
        body.drag = None;
        body.spring = DepthSpring::at_rest(body.original.position.z);
        let original = body.original;

        if animate {
            self.animate_to(id, original, duration, Easing::EaseOutElastic, now)
                .map(Some)
        } else {
            body.tween = None;
            body.transform = original;
            Ok(None)
        }
    }
}

fn step_spring(body: &mut PhysicsBody, stiffness: f32, damping: f32, dt: f32) {
    let spring = &mut body.spring;
    let z = body.transform.position.z;
    let accel = -stiffness * (z - spring.target_z) - damping * spring.velocity_z;
    spring.velocity_z += accel * dt;
    let mut z = z + spring.velocity_z * dt;

    if (z - spring.target_z).abs() < SPRING_EPSILON && spring.velocity_z.abs() < SPRING_EPSILON {
        z = spring.target_z;
        spring.velocity_z = 0.0;
    }
    spring.current_z = z;
    body.transform.position.z = z;
}
