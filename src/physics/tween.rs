use std::time::{Duration, Instant};

use glam::Vec3;

use super::easing::Easing;
use crate::types::Transform;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TweenId(pub(crate) u64);

/// Time-bounded interpolation of a whole transform, outside the integrator.
#[derive(Clone, Copy, Debug)]
pub struct Tween {
    pub id: TweenId,
    pub from: Transform,
    pub to: Transform,
    pub start: Instant,
    pub duration: Duration,
    pub easing: Easing,
}

impl Tween {
    pub fn progress(&self, elapsed: Duration) -> f32 {
        if self.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        }
    }

    pub fn is_complete(&self, elapsed: Duration) -> bool {
        elapsed >= self.duration
    }

    /// Transform at `elapsed`; exactly `to` once the duration has passed.
    pub fn sample(&self, elapsed: Duration) -> Transform {
        if self.is_complete(elapsed) {
            return self.to;
        }
        let e = self.easing.apply(self.progress(elapsed));
        Transform {
            position: mix(self.from.position, self.to.position, e),
            rotation: mix(self.from.rotation, self.to.rotation, e),
            scale: mix(self.from.scale, self.to.scale, e),
        }
    }
}

fn mix(from: Vec3, to: Vec3, e: f32) -> Vec3 {
    from * (1.0 - e) + to * e
}
