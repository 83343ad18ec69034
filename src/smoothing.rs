//! Per-joint temporal smoothing of detector landmarks.
//!
//! Each hand slot keeps an exponentially smoothed position and a low-pass
//! filtered velocity per joint. A slot that is empty for one frame loses its
//! state entirely; the next appearance starts fresh with no lag.

use std::time::Instant;

use glam::Vec3;

use crate::types::{Hand, MAX_HANDS, NUM_LANDMARKS};

const VELOCITY_KEEP: f32 = 0.7;
const VELOCITY_BLEND: f32 = 0.3;

#[derive(Clone, Debug)]
pub struct SmoothedHand {
    pub hand: Hand,
    pub velocity: [Vec3; NUM_LANDMARKS],
    last_update: Instant,
}

impl SmoothedHand {
    fn new(raw: &Hand, now: Instant) -> Self {
        Self {
            hand: *raw,
            velocity: [Vec3::ZERO; NUM_LANDMARKS],
            last_update: now,
        }
    }

    fn step(&mut self, target: &Hand, alpha: f32, now: Instant) {
        let dt = now
            .checked_duration_since(self.last_update)
            .map(|d| d.as_secs_f32())
            .unwrap_or(0.0);

        let positions = self.hand.landmarks_mut();
        for (joint, (pos, goal)) in positions.iter_mut().zip(target.landmarks()).enumerate() {
            let previous = *pos;
            *pos += alpha * (*goal - *pos);

            if dt > 0.0 {
                let instant = (*pos - previous) / dt;
                self.velocity[joint] =
                    VELOCITY_KEEP * self.velocity[joint] + VELOCITY_BLEND * instant;
            }
        }

        if dt > 0.0 {
            self.last_update = now;
        }
    }

    /// Mean joint velocity.
    pub fn mean_velocity(&self) -> Vec3 {
        self.velocity.iter().copied().sum::<Vec3>() / NUM_LANDMARKS as f32
    }
}

pub struct LandmarkSmoother {
    alpha: f32,
    slots: [Option<SmoothedHand>; MAX_HANDS],
}

impl LandmarkSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            slots: [None, None],
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Advances every slot with this frame's hands; absent slots are dropped.
    pub fn update(&mut self, hands: &[Hand], now: Instant) {
        for (slot, state) in self.slots.iter_mut().enumerate() {
            match (hands.get(slot), state.as_mut()) {
                (Some(raw), Some(smoothed)) => smoothed.step(raw, self.alpha, now),
                (Some(raw), None) => *state = Some(SmoothedHand::new(raw, now)),
                (None, Some(_)) => {
                    log::debug!("hand slot {slot} lost, dropping smoothing state");
                    *state = None;
                }
                (None, None) => {}
            }
        }
    }

    pub fn smoothed_hand(&self, index: usize) -> Option<&SmoothedHand> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Smoothed hands in slot order, stopping at the first empty slot.
    pub fn hands(&self) -> Vec<Hand> {
        self.slots
            .iter()
            .map_while(|slot| slot.as_ref().map(|s| s.hand))
            .collect()
    }

    pub fn velocity(&self, index: usize) -> Vec3 {
        self.smoothed_hand(index)
            .map(SmoothedHand::mean_velocity)
            .unwrap_or(Vec3::ZERO)
    }

    pub fn reset(&mut self) {
        self.slots = [None, None];
    }
}
